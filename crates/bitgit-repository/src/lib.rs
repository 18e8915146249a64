//! Repository handle: locating, opening and creating a work tree with its
//! `.git` metadata directory, plus the ingestion helpers built on top.

mod discover;
mod env;
mod error;
pub mod ingest;
mod init;
mod layout;
pub mod resolve;

pub use error::RepoError;
pub use resolve::{ExactId, LooseRevisionResolver, ResolveError, ResolveRevision};

use std::fmt;
use std::path::{Path, PathBuf};

use bitgit_config::{ConfigError, ConfigFile, ConfigKey};
use bitgit_loose::LooseObjectStore;
use tracing::debug;

/// Metadata directory name inside a work tree.
pub const GIT_DIR_NAME: &str = ".git";

/// The only repository format understood.
const SUPPORTED_FORMAT_VERSION: i64 = 0;

/// How [`Repository::locate`] searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateOptions {
    /// Use this metadata directory instead of searching (`GIT_DIR`).
    /// Relative paths are taken from the start directory.
    pub git_dir: Option<PathBuf>,
    /// Directories the upward search may not enter (`GIT_CEILING_DIRECTORIES`).
    pub ceilings: Vec<PathBuf>,
}

/// Options for [`Repository::init_opts`].
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Branch named by the new `HEAD`; `master` when unset.
    pub default_branch: Option<String>,
}

/// An opened repository.
///
/// Several handles may exist side by side; nothing is cached globally.
pub struct Repository {
    work_tree: PathBuf,
    git_dir: PathBuf,
    config: ConfigFile,
    objects: LooseObjectStore,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("work_tree", &self.work_tree)
            .field("git_dir", &self.git_dir)
            .finish_non_exhaustive()
    }
}

pub(crate) fn core_key(name: &str) -> Result<ConfigKey, RepoError> {
    Ok(ConfigKey::parse(&format!("core.{name}"))?)
}

impl Repository {
    /// Open the repository whose work tree is exactly `work_tree`.
    pub fn open(work_tree: impl AsRef<Path>) -> Result<Self, RepoError> {
        let work_tree = work_tree.as_ref();
        Self::open_git_dir(work_tree, work_tree.join(GIT_DIR_NAME))
    }

    /// Open a repository from an explicit metadata directory.
    pub fn open_git_dir(
        work_tree: impl Into<PathBuf>,
        git_dir: impl Into<PathBuf>,
    ) -> Result<Self, RepoError> {
        let work_tree = work_tree.into();
        let git_dir = git_dir.into();
        let not_a_repo = |reason: &str| RepoError::NotARepository {
            path: work_tree.clone(),
            reason: reason.to_string(),
        };

        if !git_dir.is_dir() {
            return Err(not_a_repo("metadata directory missing"));
        }

        let config = match ConfigFile::load(&git_dir.join("config")) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(_)) => {
                return Err(not_a_repo("configuration file missing"))
            }
            Err(e @ ConfigError::Parse { .. }) => {
                return Err(not_a_repo(&format!("unreadable configuration: {e}")))
            }
            Err(e) => return Err(e.into()),
        };

        match config.get_int(&core_key("repositoryformatversion")?) {
            Ok(Some(SUPPORTED_FORMAT_VERSION)) => {}
            Ok(Some(version)) => {
                return Err(not_a_repo(&format!(
                    "unsupported repositoryformatversion {version}"
                )))
            }
            Ok(None) | Err(ConfigError::InvalidInt { .. }) => {
                return Err(not_a_repo("missing or invalid repositoryformatversion"))
            }
            Err(e) => return Err(e.into()),
        }

        // Recorded but not enforced; a malformed value is still an error.
        let bare = config.get_bool(&core_key("bare")?)?.unwrap_or(false);
        let filemode = config.get_bool(&core_key("filemode")?)?.unwrap_or(true);

        let mut objects = LooseObjectStore::open(git_dir.join("objects"));
        if let Some(level) = compression_level(&config)? {
            objects.set_compression_level(level);
        }

        debug!(git_dir = %git_dir.display(), bare, filemode, "opened repository");
        Ok(Self {
            work_tree,
            git_dir,
            config,
            objects,
        })
    }

    /// Search upwards from `start` for a repository.
    ///
    /// Returns `Ok(None)` when nothing is found and `required` is false.
    pub fn locate(
        start: impl AsRef<Path>,
        required: bool,
        options: &LocateOptions,
    ) -> Result<Option<Self>, RepoError> {
        discover::locate(start.as_ref(), required, options)
    }

    /// Create a new repository at `path` with default options.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        Self::init_opts(path, &InitOptions::default())
    }

    pub fn init_opts(path: impl AsRef<Path>, options: &InitOptions) -> Result<Self, RepoError> {
        init::init_repository(path.as_ref(), options)
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn objects(&self) -> &LooseObjectStore {
        &self.objects
    }

    /// Join `segments` onto the metadata directory. Never touches the disk.
    pub fn path(&self, segments: &[&str]) -> PathBuf {
        layout::join(&self.git_dir, segments)
    }

    /// Path of a file under the metadata directory.
    ///
    /// All segments but the last must be directories; they are created when
    /// `mkdir` is set, otherwise a missing one yields `Ok(None)`.
    pub fn file(&self, mkdir: bool, segments: &[&str]) -> Result<Option<PathBuf>, RepoError> {
        layout::file(&self.git_dir, mkdir, segments)
    }

    /// Path of a directory under the metadata directory, created on demand
    /// when `mkdir` is set.
    pub fn dir(&self, mkdir: bool, segments: &[&str]) -> Result<Option<PathBuf>, RepoError> {
        layout::dir(&self.git_dir, mkdir, segments)
    }
}

/// zlib level for new loose objects. `core.loosecompression` overrides
/// `core.compression`; -1 means the zlib default.
fn compression_level(config: &ConfigFile) -> Result<Option<u32>, RepoError> {
    for name in ["loosecompression", "compression"] {
        let key = core_key(name)?;
        if let Some(level) = config.get_int(&key)? {
            return match level {
                -1 => Ok(None),
                0..=9 => Ok(Some(level as u32)),
                _ => Err(RepoError::InvalidConfig {
                    key: key.to_string(),
                    value: level,
                }),
            };
        }
    }
    Ok(None)
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bitgit_config::ConfigFile;
use bitgit_utils::lockfile::LockFile;
use tracing::{debug, info};

use crate::layout::{self, DirState};
use crate::{core_key, InitOptions, RepoError, Repository, GIT_DIR_NAME};

const DEFAULT_BRANCH: &str = "master";

const DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

/// Directories created under the metadata directory, in order.
const DIRECTORIES: &[&[&str]] = &[
    &["branches"],
    &["objects"],
    &["refs", "tags"],
    &["refs", "heads"],
];

/// Create a repository at `path`.
///
/// Refuses a path that is a file or whose `.git` already has contents.
/// Failures after that point are not rolled back: the error lists what had
/// been created so far.
pub(crate) fn init_repository(path: &Path, options: &InitOptions) -> Result<Repository, RepoError> {
    let branch = options.default_branch.as_deref().unwrap_or(DEFAULT_BRANCH);
    if !is_valid_branch_name(branch) {
        return Err(RepoError::InvalidBranchName(branch.to_string()));
    }

    let work_tree = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let git_dir = work_tree.join(GIT_DIR_NAME);

    match fs::metadata(&work_tree) {
        Ok(meta) if !meta.is_dir() => return Err(RepoError::NotADirectory(work_tree)),
        Ok(_) => {
            if git_dir.exists() && !is_empty_dir(&git_dir)? {
                return Err(RepoError::AlreadyInitialized(git_dir));
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut created = Vec::new();
    if let Err(source) = populate(&work_tree, &git_dir, branch, &mut created) {
        return Err(RepoError::InitFailed {
            path: git_dir,
            created,
            source: Box::new(source),
        });
    }

    info!(git_dir = %git_dir.display(), "initialized empty repository");
    Repository::open_git_dir(work_tree, git_dir)
}

fn populate(
    work_tree: &Path,
    git_dir: &Path,
    branch: &str,
    created: &mut Vec<PathBuf>,
) -> Result<(), RepoError> {
    for dir in [work_tree, git_dir] {
        if !dir.is_dir() {
            fs::create_dir_all(dir)?;
            debug!(path = %dir.display(), "created directory");
            created.push(dir.to_path_buf());
        }
    }

    for segments in DIRECTORIES {
        if let DirState::Created(path) = layout::resolve_dir(git_dir, true, segments)? {
            created.push(path);
        }
    }

    let description = git_dir.join("description");
    LockFile::write_atomic(&description, DESCRIPTION.as_bytes())?;
    created.push(description);

    let head = git_dir.join("HEAD");
    LockFile::write_atomic(&head, format!("ref: refs/heads/{branch}\n").as_bytes())?;
    created.push(head);

    let config_path = git_dir.join("config");
    default_config()?.write_to(&config_path)?;
    created.push(config_path);

    Ok(())
}

fn default_config() -> Result<ConfigFile, RepoError> {
    let mut config = ConfigFile::new();
    config.set(&core_key("repositoryformatversion")?, "0");
    config.set(&core_key("filemode")?, "false");
    config.set(&core_key("bare")?, "false");
    Ok(config)
}

fn is_empty_dir(path: &Path) -> Result<bool, RepoError> {
    match fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        // `.git` exists but is not a directory: treat it as occupied.
        Err(_) if !path.is_dir() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// A subset of git's ref name rules, enough to keep `HEAD` well formed.
fn is_valid_branch_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(['-', '/', '.'])
        && !name.ends_with(['/', '.'])
        && !name.ends_with(".lock")
        && !name.contains("..")
        && !name.contains("//")
        && !name.contains("@{")
        && !name.contains("/.")
        && !name
            .chars()
            .any(|c| c.is_ascii_control() || " ~^:?*[\\".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_text() {
        assert_eq!(
            default_config().unwrap().to_bytes(),
            b"[core]\n\trepositoryformatversion = 0\n\tfilemode = false\n\tbare = false\n"
        );
    }

    #[test]
    fn populate_records_progress_before_failing() {
        let tmp = tempfile::tempdir().unwrap();
        let git_dir = tmp.path().join(".git");
        fs::create_dir(&git_dir).unwrap();
        fs::write(git_dir.join("refs"), b"").unwrap();

        let mut created = Vec::new();
        let err = populate(tmp.path(), &git_dir, DEFAULT_BRANCH, &mut created).unwrap_err();
        assert!(matches!(err, RepoError::NotADirectory(ref p) if *p == git_dir.join("refs")));
        assert_eq!(created, vec![git_dir.join("branches"), git_dir.join("objects")]);
        assert!(!git_dir.join("HEAD").exists());
    }

    #[test]
    fn branch_names() {
        for ok in ["master", "main", "feature/x", "v1.0", "a-b_c"] {
            assert!(is_valid_branch_name(ok), "{ok}");
        }
        for bad in [
            "", "-x", "/x", "x/", "a..b", "a b", "a:b", "x.lock", "a//b", "a@{1}", "a/.b", "a\\b",
        ] {
            assert!(!is_valid_branch_name(bad), "{bad:?}");
        }
    }
}

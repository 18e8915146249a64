use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::{LocateOptions, RepoError, Repository};

/// Find the repository containing `start`.
///
/// With an explicit metadata directory in `options` no search happens and
/// `start` becomes the work tree. Otherwise each directory from `start`
/// upwards is checked for a `.git` directory. The search never moves into
/// a ceiling directory, although `start` itself is always checked.
pub(crate) fn locate(
    start: &Path,
    required: bool,
    options: &LocateOptions,
) -> Result<Option<Repository>, RepoError> {
    let start = fs::canonicalize(start)?;

    if let Some(git_dir) = &options.git_dir {
        let git_dir = start.join(git_dir);
        debug!(git_dir = %git_dir.display(), "using explicit metadata directory");
        return Repository::open_git_dir(start, git_dir).map(Some);
    }

    let ceilings: Vec<PathBuf> = options
        .ceilings
        .iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();

    let mut current = start.as_path();
    loop {
        trace!(dir = %current.display(), "looking for .git");
        if current.join(".git").is_dir() {
            debug!(work_tree = %current.display(), "found repository");
            return Repository::open(current).map(Some);
        }
        match current.parent() {
            Some(parent) if !ceilings.iter().any(|c| c == parent) => current = parent,
            _ => break,
        }
    }

    if required {
        Err(RepoError::NotARepository {
            path: start,
            reason: "no .git directory in it or any parent".to_string(),
        })
    } else {
        Ok(None)
    }
}

//! Path helpers relative to a metadata directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::RepoError;

/// Outcome of resolving a directory under the metadata directory.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DirState {
    Existing(PathBuf),
    Created(PathBuf),
    Missing,
}

pub(crate) fn join(base: &Path, segments: &[&str]) -> PathBuf {
    let mut path = base.to_path_buf();
    path.extend(segments);
    path
}

/// Walk `segments` below `base`, failing on the first one that exists but is
/// not a directory. Missing directories are created when `mkdir` is set.
pub(crate) fn resolve_dir(
    base: &Path,
    mkdir: bool,
    segments: &[&str],
) -> Result<DirState, RepoError> {
    let mut path = base.to_path_buf();
    let mut missing = false;
    for segment in segments {
        path.push(segment);
        if missing {
            continue;
        }
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(RepoError::NotADirectory(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => missing = true,
            Err(e) => return Err(e.into()),
        }
    }

    if !missing {
        return Ok(DirState::Existing(path));
    }
    if !mkdir {
        return Ok(DirState::Missing);
    }
    fs::create_dir_all(&path)?;
    debug!(path = %path.display(), "created directory");
    Ok(DirState::Created(path))
}

pub(crate) fn dir(base: &Path, mkdir: bool, segments: &[&str]) -> Result<Option<PathBuf>, RepoError> {
    Ok(match resolve_dir(base, mkdir, segments)? {
        DirState::Existing(path) | DirState::Created(path) => Some(path),
        DirState::Missing => None,
    })
}

pub(crate) fn file(base: &Path, mkdir: bool, segments: &[&str]) -> Result<Option<PathBuf>, RepoError> {
    let Some((_, parents)) = segments.split_last() else {
        return Err(RepoError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no path segments given",
        )));
    };
    Ok(dir(base, mkdir, parents)?.map(|_| join(base, segments)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_never_touches_disk() {
        let base = Path::new("/nonexistent/.git");
        assert_eq!(
            join(base, &["refs", "heads", "main"]),
            PathBuf::from("/nonexistent/.git/refs/heads/main")
        );
        assert_eq!(join(base, &[]), base);
    }

    #[test]
    fn dir_reports_state() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path();

        assert_eq!(resolve_dir(base, false, &["a", "b"]).unwrap(), DirState::Missing);
        assert!(!base.join("a").exists());

        let created = base.join("a").join("b");
        assert_eq!(
            resolve_dir(base, true, &["a", "b"]).unwrap(),
            DirState::Created(created.clone())
        );
        assert_eq!(
            resolve_dir(base, true, &["a", "b"]).unwrap(),
            DirState::Existing(created)
        );
    }

    #[test]
    fn intermediate_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();

        for mkdir in [false, true] {
            match resolve_dir(tmp.path(), mkdir, &["a", "b"]) {
                Err(RepoError::NotADirectory(path)) => assert_eq!(path, tmp.path().join("a")),
                other => panic!("expected NotADirectory, got {other:?}"),
            }
        }
    }

    #[test]
    fn file_creates_only_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path();

        assert_eq!(file(base, false, &["refs", "remotes", "origin", "HEAD"]).unwrap(), None);

        let path = file(base, true, &["refs", "remotes", "origin", "HEAD"])
            .unwrap()
            .unwrap();
        assert_eq!(path, base.join("refs/remotes/origin/HEAD"));
        assert!(base.join("refs/remotes/origin").is_dir());
        assert!(!path.exists());

        assert!(file(base, false, &[]).is_err());
    }
}

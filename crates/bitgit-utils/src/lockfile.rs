use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{LockError, UtilError};
use crate::Result;

const LOCK_SUFFIX: &str = ".lock";

/// Exclusive `<path>.lock` guard used to replace a file atomically.
///
/// The lock file is created with `create_new`, so a second writer fails
/// with [`LockError::AlreadyLocked`]. [`commit`](LockFile::commit) syncs and
/// renames it over the target; dropping an uncommitted guard removes it.
pub struct LockFile {
    path: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    done: bool,
}

impl LockFile {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(LOCK_SUFFIX);
        let lock_path = PathBuf::from(lock_path);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => LockError::AlreadyLocked {
                    path: lock_path.clone(),
                },
                _ => LockError::Create {
                    path: lock_path.clone(),
                    source,
                },
            })?;

        Ok(Self {
            path,
            lock_path,
            file: Some(file),
            done: false,
        })
    }

    /// Write `contents` to `path` through a lock file in one step.
    pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
        let mut lock = Self::acquire(path)?;
        lock.write_all(contents)?;
        lock.commit()
    }

    pub fn commit(mut self) -> Result<()> {
        let commit_err = |source| {
            UtilError::Lock(LockError::Commit {
                path: self.lock_path.clone(),
                source,
            })
        };
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(commit_err)?;
            file.sync_all().map_err(commit_err)?;
        }
        fs::rename(&self.lock_path, &self.path).map_err(commit_err)?;
        self.done = true;
        Ok(())
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))
    }
}

impl Write for LockFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.done {
            self.file.take();
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

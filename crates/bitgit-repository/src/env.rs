use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::LocateOptions;

impl LocateOptions {
    /// Options taken from `GIT_DIR` and `GIT_CEILING_DIRECTORIES`.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os("GIT_DIR"),
            env::var_os("GIT_CEILING_DIRECTORIES"),
        )
    }

    pub(crate) fn from_vars(git_dir: Option<OsString>, ceilings: Option<OsString>) -> Self {
        Self {
            git_dir: git_dir.filter(|v| !v.is_empty()).map(PathBuf::from),
            // Relative entries are ignored, as git does.
            ceilings: ceilings
                .map(|list| {
                    env::split_paths(&list)
                        .filter(|p| p.is_absolute())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

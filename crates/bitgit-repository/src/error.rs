use std::path::PathBuf;

use bitgit_hash::ObjectId;
use bitgit_object::{ObjectError, ObjectType};

use crate::resolve::ResolveError;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository: {path}: {reason}")]
    NotARepository { path: PathBuf, reason: String },

    #[error("repository already exists and is not empty: {0}")]
    AlreadyInitialized(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid initial branch name: '{0}'")]
    InvalidBranchName(String),

    /// Initialization stopped part way. Nothing is rolled back; `created`
    /// lists the paths that were made before the failure.
    #[error("cannot initialize repository at {path}: {source}")]
    InitFailed {
        path: PathBuf,
        created: Vec<PathBuf>,
        #[source]
        source: Box<RepoError>,
    },

    #[error("bad config value {value} for '{key}'")]
    InvalidConfig { key: String, value: i64 },

    #[error("cannot parse {obj_type} object: {source}")]
    MalformedPayload {
        obj_type: ObjectType,
        #[source]
        source: ObjectError,
    },

    #[error("object {oid} is a {actual}, not a {expected}")]
    TypeMismatch {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error(transparent)]
    Config(#[from] bitgit_config::ConfigError),

    #[error(transparent)]
    Loose(#[from] bitgit_loose::LooseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Lock(#[from] bitgit_utils::UtilError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

use std::path::PathBuf;

/// Errors raised while reading, querying or writing a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config key: {0}")]
    InvalidKey(String),

    #[error("bad config line {line} in {origin}: {message}")]
    Parse {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("bad boolean config value '{value}' for '{key}'")]
    InvalidBool { key: String, value: String },

    #[error("bad numeric config value '{value}' for '{key}'")]
    InvalidInt { key: String, value: String },

    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lock(#[from] bitgit_utils::UtilError),
}

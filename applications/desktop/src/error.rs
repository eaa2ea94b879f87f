//! Desktop host errors
use thiserror::Error;

/// Result type alias using `DesktopError`
pub type Result<T> = std::result::Result<T, DesktopError>;

#[derive(Error, Debug)]
pub enum DesktopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio output error: {0}")]
    Audio(String),

    #[error(transparent)]
    Storage(#[from] cadence_storage::StorageError),

    #[error(transparent)]
    Metadata(#[from] cadence_metadata::MetadataError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DesktopError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

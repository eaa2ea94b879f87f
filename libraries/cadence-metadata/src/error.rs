//! Metadata-specific errors
use thiserror::Error;

/// Result type alias using `MetadataError`
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata error types
#[derive(Error, Debug)]
pub enum MetadataError {
    /// File or folder not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Tag or container parsing error
    #[error("Tag parsing error: {0}")]
    ParseError(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Lofty error
    #[error(transparent)]
    Lofty(#[from] lofty::error::LoftyError),
}

impl From<MetadataError> for cadence_core::CoreError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Io(e) => cadence_core::CoreError::Io(e),
            other => cadence_core::CoreError::metadata(other.to_string()),
        }
    }
}

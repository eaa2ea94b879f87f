//! Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Rejected input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<StorageError> for cadence_core::CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => cadence_core::CoreError::not_found(entity, id),
            StorageError::InvalidInput(msg) => cadence_core::CoreError::invalid_input(msg),
            other => cadence_core::CoreError::storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::CoreError;

    #[test]
    fn converts_into_core_error() {
        let err: CoreError = StorageError::SerializationError("bad json".to_string()).into();
        assert!(matches!(err, CoreError::Storage(msg) if msg.contains("bad json")));

        let err: CoreError = StorageError::not_found("Track", "t1").into();
        assert!(matches!(err, CoreError::NotFound { .. }));

        let err: CoreError = StorageError::InvalidInput("blank name".to_string()).into();
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg == "blank name"));
    }
}

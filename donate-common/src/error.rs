//! Common error types for the donation platform

use thiserror::Error;

/// Common result type for platform operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across platform services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored value could not be interpreted (bad UUID, timestamp, ...)
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "uploads missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("uploads missing"));
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::CorruptRecord("proof_images.id".to_string());
        assert_eq!(err.to_string(), "Corrupt record: proof_images.id");
    }
}

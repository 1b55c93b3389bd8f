//! File vault error types.

use thiserror::Error;

/// Result type for vault operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Failed to configure vault: {0}")]
    ConfigError(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Reference resolves outside the storage root: {0}")]
    PathEscape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FileError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound(reference.into())
    }

    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    pub fn path_escape(reference: impl Into<String>) -> Self {
        Self::PathEscape(reference.into())
    }
}

//! Object store errors

use thiserror::Error;

/// Result type for object store operations
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Object store errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ObjectStoreError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl ObjectStoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ObjectStoreError::ObjectNotFound(_) => "DYNAMAP_OBJECT_NOT_FOUND",
            ObjectStoreError::InvalidPath(_) => "DYNAMAP_INVALID_OBJECT_PATH",
            ObjectStoreError::IoError(_) => "DYNAMAP_OBJECT_IO",
        }
    }
}

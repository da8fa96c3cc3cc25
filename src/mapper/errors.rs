//! Mapper errors
//!
//! Error codes:
//! - DYNAMAP_CLIENT_FAILED
//! - DYNAMAP_MISSING_TABLE
//! - DYNAMAP_MISSING_KEY
//! - DYNAMAP_CONFIG_INVALID
//! - DYNAMAP_CONFIG_IO
//!
//! Mapping and scan errors keep their own codes.

use thiserror::Error;

use crate::mapping::{BoxError, MappingError};
use crate::scan::ScanError;

/// Result type for mapper operations
pub type MapperResult<T> = Result<T, MapperError>;

/// Mapper errors
#[derive(Debug, Error)]
pub enum MapperError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Table client failed on {table}: {source}")]
    Client {
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("{type_name} is not mapped to a table")]
    MissingTable { type_name: String },

    #[error("{type_name} has no {key} key")]
    MissingKey {
        type_name: String,
        key: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot read configuration {path}: {reason}")]
    ConfigIo { path: String, reason: String },
}

impl MapperError {
    pub fn client(table: impl Into<String>, source: BoxError) -> Self {
        MapperError::Client {
            table: table.into(),
            source,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            MapperError::Mapping(e) => e.code(),
            MapperError::Scan(e) => e.code(),
            MapperError::Client { .. } => "DYNAMAP_CLIENT_FAILED",
            MapperError::MissingTable { .. } => "DYNAMAP_MISSING_TABLE",
            MapperError::MissingKey { .. } => "DYNAMAP_MISSING_KEY",
            MapperError::InvalidConfig(_) => "DYNAMAP_CONFIG_INVALID",
            MapperError::ConfigIo { .. } => "DYNAMAP_CONFIG_IO",
        }
    }
}

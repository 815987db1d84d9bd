use std::path::PathBuf;

use compact_str::CompactString;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to load configuration from: {path}: {message}")]
    ConfigLoadError { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Client(#[from] crate::client::ClientError),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(CompactString),

    #[error("Invalid parameter {field}: {message}")]
    InvalidParameter { field: CompactString, message: CompactString },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration load error
    pub fn config_load_error(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigLoadError { path, message: source.to_string() }
    }

    /// Create a request parameter validation error
    pub fn invalid_parameter(
        field: impl Into<CompactString>,
        message: impl Into<CompactString>,
    ) -> Self {
        Self::InvalidParameter { field: field.into(), message: message.into() }
    }
}

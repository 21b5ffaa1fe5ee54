//! Error types for SnapGrid
//!
//! All errors in the application are converted to `AppError`.
//! Storage recoveries (malformed blobs, unreadable fixtures) are handled
//! inside the data layer and never surface as errors.

use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Record not found in its collection
    #[error("Record not found")]
    NotFound,

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization failure on the write path
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Stable label for the error metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Storage(_) => "storage",
            AppError::Serialization(_) => "serialization",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

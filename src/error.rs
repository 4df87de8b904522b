//! Error types for chart scanning.

use std::path::PathBuf;

use thiserror::Error;

use crate::analyzer::chart::{ChartError, HelmError, ValuesError};

/// Top-level error for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum ScannerError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Values(#[from] ValuesError),

    #[error(transparent)]
    Helm(#[from] HelmError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The scan succeeded but found nothing.
    #[error("No image fields found")]
    NoImagesFound,

    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse configuration {}: {message}", .path.display())]
    ParsingFailed { path: PathBuf, message: String },

    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, ScannerError>;

//! Error types for clubboard-core

use thiserror::Error;

/// Main error type for the clubboard-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A source answered, but not with a usable payload
    #[error("fetch of {location} failed: {message}")]
    Fetch { location: String, message: String },

    /// Filter, metric or sort value that could not be parsed
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Export could not be produced or written
    #[error("export error: {0}")]
    Export(String),
}

/// Result type alias for clubboard-core
pub type Result<T> = std::result::Result<T, Error>;

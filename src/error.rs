//! Custom error types for rustpatsearch.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, PatsearchError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for rustpatsearch operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum PatsearchError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP failure without a readable response envelope
    #[error("HTTP error: {status} - {message}")]
    Http {
        status: u16,
        /// Response body, trimmed
        message: String,
    },

    /// Remote API answered with `status=false`
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code from API
        code: i64,
        /// Error message from API
        message: String,
    },

    /// The stored token or apikey was rejected by the API
    #[error("Session expired: {message}")]
    AuthExpired {
        /// Server-supplied explanation
        message: String,
    },

    /// No token/apikey pair is stored
    #[error("Not logged in")]
    NotLoggedIn,

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed base URL or endpoint join
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `PatsearchError`
pub type Result<T> = std::result::Result<T, PatsearchError>;

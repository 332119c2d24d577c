/*!
 * Error types for the codescribe application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a generation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised by the translation and inspection pipelines
#[derive(Error, Debug)]
pub enum ScribeError {
    /// Unusable run configuration (backend selector, unit lists, paths)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The prompt template could not be used as a conversation seed
    #[error("Malformed prompt template {path:?}: {reason}")]
    MalformedTemplate {
        /// Template source
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Error from a file operation
    #[error("File error on {path:?}: {source}")]
    File {
        /// The file being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Error from the generation backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl ScribeError {
    /// Wrap an I/O error with the path it happened on
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File { path: path.into(), source }
    }

    /// Build the error reported for a backend selector that matches no variant
    pub fn unresolved_selector(selector: &str) -> Self {
        Self::Configuration(format!("{} not available", selector))
    }
}

pub type ScribeResult<T> = std::result::Result<T, ScribeError>;

//! Custom error types for ani-gui.
//!
//! This module provides structured error handling instead of String errors.

use std::io;
use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(String),
    /// API response parsing errors
    #[error("Parse error: {0}")]
    Parse(String),
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Cache folder errors
    #[error("Cache error: {0}")]
    Cache(String),
    /// No results found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Invalid input from user
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// ani-cli not found or failed to start
    #[error("Launch error: {0}")]
    Launch(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = AppError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_error_from_io_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.source().is_some());
    }

    #[test]
    fn test_error_from_toml() {
        let err = toml::from_str::<toml::Value>("mode = ").unwrap_err();
        let app_err: AppError = err.into();
        assert!(app_err.to_string().starts_with("Config error:"));
    }

    #[test]
    fn test_invalid_input_message() {
        let err = AppError::InvalidInput("Anime and episode must be selected.".to_string());
        assert!(err.to_string().contains("must be selected"));
    }
}

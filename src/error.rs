//! Error handling module
//!
//! Defines the error types for status queries. Every one of these is
//! recovered inside [`crate::status::OtServ`]; callers of the typed
//! accessors never see them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for status queries
#[derive(Error, Debug)]
pub enum StatusError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Protocol-related errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Cache-related errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Network-specific errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Could not connect to {target}: {reason}")]
    ConnectFailure { target: String, reason: String },

    #[error("Connection to {0} timed out")]
    ConnectTimeout(String),

    #[error("Server closed the connection without sending data")]
    EmptyResponse,

    #[error("Read deadline elapsed after {received} bytes")]
    ReadTimeout { received: usize },

    #[error("Response too large: {size} bytes (max: {max})")]
    ResponseTooLarge { size: usize, max: usize },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Write error: {0}")]
    WriteError(String),
}

impl NetworkError {
    /// Whether the remote server could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            NetworkError::ConnectFailure { .. }
                | NetworkError::ConnectTimeout(_)
                | NetworkError::InvalidAddress(_)
        )
    }
}

/// Protocol-specific errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed status reply: {0}")]
    ParseFailure(String),
}

/// Cache-specific errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache file not found at: {0}")]
    NotFound(PathBuf),

    #[error("Cache file {path} corrupted: {reason}")]
    CorruptCache { path: PathBuf, reason: String },

    #[error("Failed to write cache file {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Result type alias for status operations
pub type Result<T> = std::result::Result<T, StatusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetworkError::EmptyResponse;
        assert_eq!(
            err.to_string(),
            "Server closed the connection without sending data"
        );

        let err = NetworkError::ResponseTooLarge { size: 10, max: 4 };
        assert_eq!(err.to_string(), "Response too large: 10 bytes (max: 4)");

        let err = CacheError::NotFound(PathBuf::from("cache/127.0.0.1.json"));
        assert_eq!(
            err.to_string(),
            "Cache file not found at: cache/127.0.0.1.json"
        );
    }

    #[test]
    fn test_unreachable_classification() {
        let err = NetworkError::ConnectFailure {
            target: "example.test:7171".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.is_unreachable());
        assert!(NetworkError::ConnectTimeout("example.test:7171".to_string()).is_unreachable());
        assert!(!NetworkError::EmptyResponse.is_unreachable());
        assert!(!NetworkError::ReadTimeout { received: 0 }.is_unreachable());
    }

    #[test]
    fn test_nested_conversion() {
        let err: StatusError = ProtocolError::ParseFailure("unexpected EOF".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Protocol error: Malformed status reply: unexpected EOF"
        );
    }
}

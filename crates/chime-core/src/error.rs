//! Unified error types for Chime.

use thiserror::Error;

/// Result type alias using ChimeError.
pub type Result<T> = std::result::Result<T, ChimeError>;

#[derive(Error, Debug)]
pub enum ChimeError {
    // Request errors — never retried, surfaced to the caller
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unparseable send time: {0}")]
    TimeFormat(String),

    // Store errors — propagated so the host retry/DLQ policy can act
    #[error("Storage error: {0}")]
    Storage(String),

    // Fan-out errors
    #[error("Publish error: {0}")]
    Publish(String),

    // Optional-enhancement callbacks — always soft-failed by callers
    #[error("Callback error: {0}")]
    Callback(String),

    // Channel transport errors — logged and recorded, handled locally
    #[error("Delivery error: {0}")]
    Delivery(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChimeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChimeError::Validation("userId too short".into());
        assert!(err.to_string().contains("userId too short"));
    }

    #[test]
    fn test_error_constructors() {
        let e1 = ChimeError::validation("test");
        assert!(matches!(e1, ChimeError::Validation(_)));

        let e2 = ChimeError::storage("test");
        assert!(matches!(e2, ChimeError::Storage(_)));

        let e3 = ChimeError::delivery("test");
        assert!(matches!(e3, ChimeError::Delivery(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChimeError = io_err.into();
        assert!(matches!(err, ChimeError::Io(_)));
    }
}

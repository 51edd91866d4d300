//! Unified error type for the supply-response pipeline
//!
//! Crate-specific errors (for example the source errors in `esr-io`) convert
//! into [`EsrError`] at API boundaries so callers can handle them uniformly.

use thiserror::Error;

/// Unified error type for all pipeline operations.
#[derive(Error, Debug)]
pub enum EsrError {
    /// I/O errors (file access, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Ledger validation failures
    #[error("Validation error: {0}")]
    Validation(String),

    /// A raw source could not be normalized
    #[error("Source error: {0}")]
    Source(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using EsrError.
pub type EsrResult<T> = Result<T, EsrError>;

impl From<anyhow::Error> for EsrError {
    fn from(err: anyhow::Error) -> Self {
        EsrError::Other(format!("{err:#}"))
    }
}

impl From<String> for EsrError {
    fn from(s: String) -> Self {
        EsrError::Other(s)
    }
}

impl From<&str> for EsrError {
    fn from(s: &str) -> Self {
        EsrError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for EsrError {
    fn from(err: serde_json::Error) -> Self {
        EsrError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EsrError::Source("no hub columns".into());
        assert!(err.to_string().contains("Source error"));
        assert!(err.to_string().contains("no hub columns"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "ledger missing");
        let err: EsrError = io_err.into();
        assert!(matches!(err, EsrError::Io(_)));
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let err = anyhow::anyhow!("inner").context("outer");
        let converted: EsrError = err.into();
        assert_eq!(converted.to_string(), "outer: inner");
    }
}

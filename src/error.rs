//! Error types for the placeholder pipeline
//!
//! Provides unified error handling using thiserror.
//!
//! Errors in this crate never abort a build: they are caught at the fetch
//! or persistence boundary and degrade to a warning plus a soft result.

use std::path::PathBuf;

use thiserror::Error;

// == Pipeline Error Enum ==
/// Unified error type for the placeholder pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Remote request failed at the transport level
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service answered with a non-success status
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Placeholder byte record does not follow the expected binary layout
    #[error("malformed placeholder: {0}")]
    MalformedPlaceholder(String),

    /// Placeholder transport encoding could not be decoded
    #[error("malformed base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON document could not be parsed or produced
    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem operation failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read or parsed
    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },
}

impl PipelineError {
    /// Creates an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the placeholder pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::MalformedPlaceholder("too short".to_string());
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_io_helper_keeps_context() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = PipelineError::io("reading cache file", source);
        assert!(err.to_string().contains("reading cache file"));
    }
}

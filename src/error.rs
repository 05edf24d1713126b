//! Centralized error types for crmintake.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading and validating inbound payloads.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("Payload file not found: {0}")]
    FileNotFound(PathBuf),

    /// The payload is not well-formed JSON, or has the wrong shape.
    #[error("Invalid webhook payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed but failed validation.
    #[error("Payload failed validation: {0}")]
    InvalidPayload(String),

    /// A raw RFC 5322 message could not be turned into a payload.
    #[error("Could not parse RFC 5322 message: {0}")]
    InvalidEml(String),
}

/// Convenience alias for `Result<T, IntakeError>`.
pub type Result<T> = std::result::Result<T, IntakeError>;

impl IntakeError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The only failure the classifier itself reports.
///
/// Everything else (missing contact, body or sender) surfaces as absent
/// fields on a successful [`ParsedMail`](crate::model::parsed::ParsedMail).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Forwarded mode, but no forwarded block could be located in the body.
    #[error("No forwarded messages found")]
    NoForwardedMessages,
}

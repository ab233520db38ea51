//! Error types
//!
//! `TransportError` covers anything the reader or driver reports, `TagError`
//! is the taxonomy surfaced to callers of the service.

use serde::Serialize;
use thiserror::Error;

use crate::apdu::SW;
use crate::engine::WriteAttempt;

/// Errors reported by the transport collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Driver level failure, message kept verbatim
    #[error("{0}")]
    Device(String),

    #[error("reader returned status {0:04X} ({})", status_text(.0))]
    Status(u16),

    #[error("short response: expected {expected} bytes, got {got}")]
    ShortResponse { expected: usize, got: usize },

    #[error("byte address {0} is not page aligned")]
    Unaligned(u16),
}

/// Errors returned by session, engine and service operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("No card present on the reader")]
    NoCardPresent,

    #[error("Text to write is empty")]
    EmptyInput,

    #[error("Payload of {size} bytes exceeds the {max} byte limit of the active configuration")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Every attempted write strategy was refused; `message` is the last error
    #[error("All write methods failed ({}): {message}", method_list(.attempts))]
    WriteFailed {
        attempts: Vec<WriteAttempt>,
        message: String,
    },

    #[error("Unknown configuration '{name}', available: {}", .available.join(", "))]
    UnknownConfig { name: String, available: Vec<String> },

    #[error("Reader '{0}' is not attached")]
    ReaderNotAttached(String),

    #[error("No read method worked for this card")]
    ProbeInconclusive,

    #[error("Service is not running")]
    NotRunning,
}

/// Serialisable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NoCardPresent,
    EmptyInput,
    PayloadTooLarge,
    TransportFailure,
    UnknownConfig,
    ProbeInconclusive,
    NotRunning,
}

fn status_text(sw: &u16) -> &'static str {
    SW::describe(*sw)
}

fn method_list(attempts: &[WriteAttempt]) -> String {
    attempts
        .iter()
        .map(|a| a.method.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TagError::NoCardPresent => ErrorKind::NoCardPresent,
            TagError::EmptyInput => ErrorKind::EmptyInput,
            TagError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            TagError::Transport(_)
            | TagError::WriteFailed { .. }
            | TagError::ReaderNotAttached(_) => ErrorKind::TransportFailure,
            TagError::UnknownConfig { .. } => ErrorKind::UnknownConfig,
            TagError::ProbeInconclusive => ErrorKind::ProbeInconclusive,
            TagError::NotRunning => ErrorKind::NotRunning,
        }
    }
}

/// Error as carried inside an outcome record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&TagError> for ErrorInfo {
    fn from(err: &TagError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

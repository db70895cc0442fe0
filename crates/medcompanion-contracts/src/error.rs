//! Error types for the MedCompanion integration layer.
//!
//! Every fallible step inside the layer returns `CompanionResult<T>`. The
//! public service operations never surface these errors; they collapse them
//! into fixed fallback values. The variants still carry enough context for the
//! `warn!` line emitted at that collapse point.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The unified error type for the MedCompanion crates.
#[derive(Debug, Error)]
pub enum CompanionError {
    /// The provider could not be reached or the connection broke mid-request.
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// The call exceeded its deadline.
    #[error("request timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// The caller cancelled the call before it completed.
    #[error("request cancelled by caller")]
    Cancelled,

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The provider answered 2xx but without any assistant content.
    #[error("provider returned no completion content")]
    EmptyCompletion,

    /// The model declined to answer.
    #[error("model refused the request: {reason}")]
    Refused { reason: String },

    /// The completion content was not valid JSON.
    #[error("malformed JSON in completion: {reason}")]
    MalformedJson { reason: String },

    /// The JSON did not conform to the requested schema or a semantic rule.
    #[error("schema violation: {reason}")]
    SchemaViolation { reason: String },

    /// A server-sent event could not be decoded.
    #[error("stream decode error: {reason}")]
    Stream { reason: String },

    /// The caller supplied input the layer will not send.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A chat session already has a submission in flight.
    #[error("session {session_id} is already processing a message")]
    SessionBusy { session_id: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Reading or writing a local stream failed (terminal, file, stdout).
    #[error("local I/O failure: {reason}")]
    Io { reason: String },
}

/// Convenience alias used throughout the MedCompanion crates.
pub type CompanionResult<T> = Result<T, CompanionError>;

/// Coarse failure taxonomy used in logs and call outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Connectivity, timeout, cancellation, or a non-success status.
    Transport,
    /// Malformed JSON, missing content, or a schema/rule violation.
    SchemaViolation,
    /// Input the provider (or this layer) would not accept.
    InputRejected,
    /// Local misconfiguration or session misuse.
    Local,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Transport => "transport",
            FailureKind::SchemaViolation => "schema-violation",
            FailureKind::InputRejected => "input-rejected",
            FailureKind::Local => "local",
        };
        f.write_str(label)
    }
}

impl CompanionError {
    /// Classify this error into the coarse failure taxonomy.
    ///
    /// A 4xx other than 408/429 means the provider rejected what we sent (for
    /// example an image encoding it cannot read), so it maps to
    /// `InputRejected`. Everything else on the wire is a transport failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            CompanionError::Transport { .. }
            | CompanionError::Timeout { .. }
            | CompanionError::Cancelled
            | CompanionError::Stream { .. } => FailureKind::Transport,
            CompanionError::HttpStatus { status, .. } => match status {
                408 | 429 => FailureKind::Transport,
                400..=499 => FailureKind::InputRejected,
                _ => FailureKind::Transport,
            },
            CompanionError::EmptyCompletion
            | CompanionError::Refused { .. }
            | CompanionError::MalformedJson { .. }
            | CompanionError::SchemaViolation { .. } => FailureKind::SchemaViolation,
            CompanionError::InvalidInput { .. } => FailureKind::InputRejected,
            CompanionError::SessionBusy { .. }
            | CompanionError::Config { .. }
            | CompanionError::Io { .. } => FailureKind::Local,
        }
    }
}

//! Error taxonomy for the Synapse sync core.
//!
//! Every subsystem defines its own narrow error enum (see the other crates);
//! they all convert into [`SynapseError`] via `#[from]` so callers at the
//! coordinator boundary can match on one type. No variant carries secret
//! material (keys, signatures' private half) — only messages, counts and ids.

use thiserror::Error;

/// Top-level error type returned across crate boundaries in the sync core.
#[derive(Debug, Error)]
pub enum SynapseError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("counter overflow: {0}")]
    OverflowError(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("permanent backend failure: {0}")]
    PermanentBackend(String),

    #[error("rate limited: resource={resource}, retry_after={retry_after:?}")]
    RateLimited {
        resource: String,
        retry_after: std::time::Duration,
    },

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("operation not supported: {0}")]
    NotSupported(String),

    #[error("not connected")]
    NotConnected,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Convenience alias used throughout the workspace.
pub type SynapseResult<T> = Result<T, SynapseError>;

/// Which of §7's retry classes an error belongs to.
///
/// Used by the sync coordinator's retry loop to decide whether to back off
/// and retry, abort immediately, or surface fatally to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Retry with exponential backoff, capped, with jitter.
    Retryable,
    /// Abort immediately, no retry.
    Fatal,
    /// Surfaces to the caller; must never corrupt committed state.
    Invariant,
}

impl SynapseError {
    /// Classify this error for the retry policy described in spec §7.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            SynapseError::Transient(_)
            | SynapseError::Timeout(_)
            | SynapseError::RateLimited { .. } => RetryClass::Retryable,
            SynapseError::Cancelled => RetryClass::Fatal,
            SynapseError::InvariantViolation(_) => RetryClass::Invariant,
            _ => RetryClass::Fatal,
        }
    }
}

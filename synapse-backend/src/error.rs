//! Error taxonomy for long-term backend operations.

use thiserror::Error;

/// The four outcomes every [`crate::LongTermBackend`] operation can
/// produce. `BackendError` carries the vendor's own message verbatim.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend not initialized")]
    NotInitialized,

    #[error("operation not supported by this backend: {0}")]
    NotSupported(String),

    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("backend error: {0}")]
    BackendError(String),
}

impl From<BackendError> for synapse_core::SynapseError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotInitialized => synapse_core::SynapseError::NotConnected,
            BackendError::NotSupported(msg) => synapse_core::SynapseError::NotSupported(msg),
            BackendError::Transient(msg) => synapse_core::SynapseError::Transient(msg),
            BackendError::BackendError(msg) => synapse_core::SynapseError::PermanentBackend(msg),
        }
    }
}

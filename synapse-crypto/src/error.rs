//! Error taxonomy for the crypto core.

use thiserror::Error;

/// Failure modes for hashing, signing, and canonical serialization.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<CryptoError> for synapse_core::SynapseError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::MalformedKey(msg) => synapse_core::SynapseError::MalformedKey(msg),
            CryptoError::SignatureInvalid => synapse_core::SynapseError::SignatureInvalid,
            CryptoError::SerializationError(e) => synapse_core::SynapseError::SerializationError(e),
        }
    }
}

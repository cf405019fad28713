//! Error taxonomy for the gossip engine.

use thiserror::Error;

/// Failure modes surfaced by the gossip engine. `NoActivePeers` and
/// `MessageDropped` are non-fatal — the round is simply skipped or the
/// message is counted and discarded; `SendFailed` is per-peer and counted
/// against that peer's failure count.
#[derive(Debug, Error)]
pub enum GossipError {
    #[error("no active peers available")]
    NoActivePeers,

    #[error("send to peer {peer_id} failed: {reason}")]
    SendFailed { peer_id: String, reason: String },

    #[error("message dropped: {0}")]
    MessageDropped(String),

    #[error("malformed gossip message: {0}")]
    ParseError(String),
}

impl From<GossipError> for synapse_core::SynapseError {
    fn from(err: GossipError) -> Self {
        match err {
            GossipError::NoActivePeers => synapse_core::SynapseError::Transient("no active peers".to_string()),
            GossipError::SendFailed { peer_id, reason } => {
                synapse_core::SynapseError::Transient(format!("send to {peer_id} failed: {reason}"))
            }
            GossipError::MessageDropped(reason) => synapse_core::SynapseError::Conflict(reason),
            GossipError::ParseError(reason) => synapse_core::SynapseError::ParseError(reason),
        }
    }
}

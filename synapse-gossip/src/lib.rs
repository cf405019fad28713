//! # synapse-gossip
//!
//! Epidemic gossip engine (C5): peer selection, push/pull/push-pull rounds,
//! TTL-bounded forwarding, seen-set dedup, and anti-entropy via Merkle
//! digest. Transport-agnostic and ignorant of the agent-state type — driven
//! entirely by callbacks injected by the caller.

mod anti_entropy;
mod convergence;
mod engine;
mod error;
mod message;
mod peer;
mod selection;
mod seen_table;

pub use anti_entropy::{missing_ids, MerkleDigest};
pub use convergence::{estimate_propagation_time, rounds_to_reach};
pub use engine::{EngineStats, GetLocalData, GossipEngine, OnReceive, OnSend, Transport};
pub use error::GossipError;
pub use message::{initial_ttl, GossipMessage, MessageType};
pub use peer::{PeerRecord, PeerState};
pub use selection::select_peers;
pub use seen_table::SeenTable;

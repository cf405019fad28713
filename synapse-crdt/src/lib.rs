//! # synapse-crdt
//!
//! Vector clocks, CRDT primitives, and the agent-state composite (C1–C3).
//! Every merge in this crate is commutative, associative, and idempotent —
//! see each primitive's module for the property tests backing that claim.

pub mod agent;
pub mod clock;
pub mod primitives;

pub use agent::{AgentState, EpisodeRecord, Identity, SkillRecord};
pub use clock::VectorClock;

//! # synapse-core
//!
//! Foundation crate for the Synapse distributed agent-state sync core.
//! Defines the shared error taxonomy, per-subsystem configuration, and
//! workspace-wide constants. Every other crate in the workspace depends on
//! this one.

pub mod config;
pub mod constants;
pub mod errors;
pub mod ids;

pub use config::SynapseConfig;
pub use errors::{RetryClass, SynapseError, SynapseResult};
pub use ids::{AgentId, ReplicaId};

//! # synapse-sync
//!
//! The sync coordinator (C9): binds agent state (C3), the gossip engine
//! (C5), resilience (C7), and the long-term backend (C8) into one
//! lifecycle — offline-safe outbound queueing, cooperative cancellation,
//! and snapshot persistence across restarts.

mod cancellation;
mod coordinator;
mod mutation;
mod outbound_queue;
mod snapshot;

pub use cancellation::CancellationToken;
pub use coordinator::{ReportOutlier, SkillReconciliation, SyncCoordinator};
pub use mutation::LocalMutation;
pub use outbound_queue::{OutboundEvent, OutboundQueue};
pub use snapshot::{Snapshot, SnapshotError, SnapshotStore};

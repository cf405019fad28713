//! # synapse-backend
//!
//! The long-term memory backend registry (C8): the `LongTermBackend`
//! integration seam for an external vendor store or a native in-process
//! implementation, plus capability flags the coordinator uses to gate
//! features without probing.

mod entry;
mod error;
mod memory_backend;
mod traits;

pub use entry::{BackendCapabilities, BatchFailure, BatchStoreResult, MemoryEntry, MemoryEntryPatch, MemorySource, ScoredEntry, SearchOptions};
pub use error::BackendError;
pub use memory_backend::MemoryBackend;
pub use traits::LongTermBackend;

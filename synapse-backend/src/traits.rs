//! The `LongTermBackend` trait — the integration seam for an external
//! vendor memory store (Zep/Mem0/Letta) or a native backend. Only the seam
//! is specified here; no vendor wire schema is implemented.

use async_trait::async_trait;

use crate::entry::{BackendCapabilities, BatchStoreResult, MemoryEntry, MemoryEntryPatch, ScoredEntry, SearchOptions};
use crate::error::BackendError;

/// Full CRUD + batch + search surface a long-term memory backend must
/// implement, per §4.8's operation table.
#[async_trait]
pub trait LongTermBackend: Send + Sync {
    /// Idempotent; establishes auth + liveness. Safe to call repeatedly.
    async fn initialize(&self) -> Result<bool, BackendError>;

    /// Persists `entry` (which arrives without an id) and returns it with
    /// one assigned. Durable on success.
    async fn store(&self, entry: MemoryEntry) -> Result<MemoryEntry, BackendError>;

    /// Exact-match lookup by id. `Ok(None)` if absent — never an error.
    async fn retrieve(&self, id: &str) -> Result<Option<MemoryEntry>, BackendError>;

    /// Ranked search. Ordering among equal scores is unspecified.
    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<ScoredEntry>, BackendError>;

    /// Partial merge of `patch` into the entry at `id`. `true` if the entry
    /// existed and was updated; `false` if it did not exist.
    async fn update(&self, id: &str, patch: MemoryEntryPatch) -> Result<bool, BackendError>;

    /// Idempotent; deleting an absent id returns `Ok(false)`, never an error.
    async fn delete(&self, id: &str) -> Result<bool, BackendError>;

    /// Stores every entry in `entries`, reporting per-entry failures rather
    /// than aborting the whole batch.
    async fn store_batch(&self, entries: Vec<MemoryEntry>) -> Result<BatchStoreResult, BackendError>;

    /// May return `false` without performing I/O, e.g. before
    /// [`initialize`](Self::initialize) has run.
    async fn is_connected(&self) -> bool;

    /// Which optional features this backend implements.
    fn capabilities(&self) -> BackendCapabilities;
}

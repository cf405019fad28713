//! `MemoryBackend` — an in-process, `dashmap`-backed `LongTermBackend`. The
//! reference implementation used in tests and as the "native" backend
//! option the Open Questions gesture at; no persistence beyond the process.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::entry::{BackendCapabilities, BatchFailure, BatchStoreResult, MemoryEntry, MemoryEntryPatch, ScoredEntry, SearchOptions};
use crate::error::BackendError;
use crate::traits::LongTermBackend;

/// Reference `LongTermBackend`: no external dependencies, full CRUD +
/// search, no graph/facts/entities/reranking support.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, MemoryEntry>,
    connected: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self { entries: DashMap::new(), connected: AtomicBool::new(false) }
    }

    /// Naive relevance score: fraction of query tokens present in the
    /// entry's content, case-insensitively. Sufficient for a reference
    /// backend; production ranking belongs to a real vendor backend.
    fn score(query: &str, entry: &MemoryEntry) -> f64 {
        let query_tokens: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).collect();
        if query_tokens.is_empty() {
            return 0.0;
        }
        let content_lower = entry.content.to_lowercase();
        let hits = query_tokens.iter().filter(|t| content_lower.contains(t.as_str())).count();
        hits as f64 / query_tokens.len() as f64
    }
}

#[async_trait]
impl LongTermBackend for MemoryBackend {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<bool, BackendError> {
        self.connected.store(true, Ordering::Relaxed);
        debug!("memory backend initialized");
        Ok(true)
    }

    #[instrument(skip(self, entry))]
    async fn store(&self, mut entry: MemoryEntry) -> Result<MemoryEntry, BackendError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(BackendError::NotInitialized);
        }
        let id = entry.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        entry.id = Some(id.clone());
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    async fn retrieve(&self, id: &str) -> Result<Option<MemoryEntry>, BackendError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(BackendError::NotInitialized);
        }
        Ok(self.entries.get(id).map(|entry| entry.clone()))
    }

    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<ScoredEntry>, BackendError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(BackendError::NotInitialized);
        }
        let mut scored: Vec<ScoredEntry> = self
            .entries
            .iter()
            .filter(|e| options.min_importance.map_or(true, |min| e.importance >= min))
            .filter(|e| options.tags.is_empty() || options.tags.iter().any(|t| e.tags.contains(t)))
            .map(|e| ScoredEntry { entry: e.clone(), score: Self::score(query, &e) })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        if options.limit > 0 {
            scored.truncate(options.limit);
        }
        Ok(scored)
    }

    async fn update(&self, id: &str, patch: MemoryEntryPatch) -> Result<bool, BackendError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(BackendError::NotInitialized);
        }
        let Some(mut entry) = self.entries.get_mut(id) else {
            return Ok(false);
        };
        if let Some(content) = patch.content {
            entry.content = content;
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }
        if let Some(importance) = patch.importance {
            entry.importance = importance.clamp(0.0, 1.0);
        }
        if let Some(metadata) = patch.metadata {
            entry.metadata.extend(metadata);
        }
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, BackendError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(BackendError::NotInitialized);
        }
        Ok(self.entries.remove(id).is_some())
    }

    async fn store_batch(&self, entries: Vec<MemoryEntry>) -> Result<BatchStoreResult, BackendError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(BackendError::NotInitialized);
        }
        let mut result = BatchStoreResult::default();
        for (index, entry) in entries.into_iter().enumerate() {
            match self.store(entry).await {
                Ok(stored) => result.stored.push(stored),
                Err(err) => result.failed.push(BatchFailure { index, reason: err.to_string() }),
            }
        }
        Ok(result)
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let backend = MemoryBackend::new();
        backend.initialize().await.unwrap();
        let stored = backend.store(MemoryEntry::new("agent-1", "hello world", 0.5)).await.unwrap();
        assert!(stored.id.is_some());

        let fetched = backend.retrieve(stored.id.as_ref().unwrap()).await.unwrap();
        assert_eq!(fetched, Some(stored));
    }

    #[tokio::test]
    async fn operations_before_initialize_fail_with_not_initialized() {
        let backend = MemoryBackend::new();
        let result = backend.store(MemoryEntry::new("agent-1", "content", 0.1)).await;
        assert!(matches!(result, Err(BackendError::NotInitialized)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.initialize().await.unwrap();
        let stored = backend.store(MemoryEntry::new("agent-1", "content", 0.1)).await.unwrap();
        let id = stored.id.unwrap();

        assert!(backend.delete(&id).await.unwrap());
        assert!(!backend.delete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn update_applies_partial_merge_only() {
        let backend = MemoryBackend::new();
        backend.initialize().await.unwrap();
        let stored = backend.store(MemoryEntry::new("agent-1", "original", 0.2).with_tags(vec!["a".to_string()])).await.unwrap();
        let id = stored.id.clone().unwrap();

        let updated = backend
            .update(&id, MemoryEntryPatch { content: Some("revised".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert!(updated);

        let fetched = backend.retrieve(&id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "revised");
        assert_eq!(fetched.tags, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn search_ranks_by_token_overlap_and_honors_limit() {
        let backend = MemoryBackend::new();
        backend.initialize().await.unwrap();
        backend.store(MemoryEntry::new("agent-1", "the quick brown fox", 0.5)).await.unwrap();
        backend.store(MemoryEntry::new("agent-1", "quick quick quick", 0.5)).await.unwrap();
        backend.store(MemoryEntry::new("agent-1", "unrelated content", 0.5)).await.unwrap();

        let results = backend.search("quick fox", SearchOptions { limit: 2, ..Default::default() }).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn store_batch_reports_partial_results() {
        let backend = MemoryBackend::new();
        backend.initialize().await.unwrap();
        let entries = vec![
            MemoryEntry::new("agent-1", "one", 0.1),
            MemoryEntry::new("agent-1", "two", 0.2),
        ];
        let result = backend.store_batch(entries).await.unwrap();
        assert_eq!(result.stored.len(), 2);
        assert!(result.failed.is_empty());
    }
}

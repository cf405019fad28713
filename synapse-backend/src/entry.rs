//! The memory entry type exchanged with long-term backends — deliberately
//! generic over vendor schema, carrying only what every backend in the
//! capability table can be expected to store.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Why an entry exists in the long-term store — the core's own
/// promotion-provenance concept, not a vendor schema detail. Every entry
/// carries exactly one, so a reader can tell a promoted experience apart
/// from a direct store without inspecting tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    /// Promoted out of the C9 outbound queue once it crossed the
    /// pre-promotion threshold.
    BeadPromotion,
    /// Stored directly through [`crate::LongTermBackend::store`] without
    /// going through the sync coordinator's queue.
    DirectStore,
    /// Derived from a reconciled skill report (C6 consensus).
    SkillLearning,
    /// Pulled out of conversational or document content during ingestion.
    FactExtraction,
}

/// One unit of long-term memory. `id` is `None` until a backend assigns one
/// via [`crate::LongTermBackend::store`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Option<String>,
    pub agent_id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub importance: f64,
    pub source: MemorySource,
    pub timestamp_ms: u64,
    pub embedding: Option<Vec<f32>>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl MemoryEntry {
    /// Builds an entry ready for [`crate::LongTermBackend::store`] — no id
    /// yet, `source` defaults to [`MemorySource::DirectStore`] since that is
    /// what a bare `store` call is; callers that promote from elsewhere
    /// should override it with [`MemoryEntry::with_source`].
    pub fn new(agent_id: impl Into<String>, content: impl Into<String>, importance: f64) -> Self {
        Self {
            id: None,
            agent_id: agent_id.into(),
            content: content.into(),
            tags: Vec::new(),
            importance: importance.clamp(0.0, 1.0),
            source: MemorySource::DirectStore,
            timestamp_ms: Utc::now().timestamp_millis() as u64,
            embedding: None,
            user_id: None,
            session_id: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source(mut self, source: MemorySource) -> Self {
        self.source = source;
        self
    }

    pub fn with_timestamp_ms(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Options narrowing a [`crate::LongTermBackend::search`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub limit: usize,
    pub min_importance: Option<f64>,
    pub tags: Vec<String>,
}

/// One search hit: the entry plus its relevance score. Ordering among equal
/// scores is unspecified, per §4.8's search guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub entry: MemoryEntry,
    pub score: f64,
}

/// A sparse update applied to an existing entry — only `Some` fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntryPatch {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub importance: Option<f64>,
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// Which optional capabilities a backend implements, so the coordinator can
/// gate features without probing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    pub supports_graph: bool,
    pub supports_blocks: bool,
    pub supports_facts: bool,
    pub supports_entities: bool,
    pub supports_skill_learning: bool,
    pub supports_reranking: bool,
}

/// The outcome of a batch store: which entries were persisted (with ids
/// assigned) and which failed, since all-or-nothing is not required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStoreResult {
    pub stored: Vec<MemoryEntry>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub index: usize,
    pub reason: String,
}

//! Dedup table for message ids already processed, with time-based expiry so
//! it doesn't grow unbounded.

use std::collections::HashMap;

use uuid::Uuid;

/// Tracks which `message_id`s have already been processed, so a message
/// arriving via two forwarding paths is handled only once.
#[derive(Debug, Default)]
pub struct SeenTable {
    seen_at: HashMap<Uuid, u64>,
}

impl SeenTable {
    pub fn new() -> Self {
        Self { seen_at: HashMap::new() }
    }

    /// Records `id` as seen at `now_ms`. Returns `true` if this is the first
    /// time `id` has been observed (the caller should process the message);
    /// `false` if it's a duplicate (the caller should drop it).
    pub fn record(&mut self, id: Uuid, now_ms: u64) -> bool {
        if self.seen_at.contains_key(&id) {
            false
        } else {
            self.seen_at.insert(id, now_ms);
            true
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.seen_at.contains_key(id)
    }

    /// Evicts entries older than `expiry_ms` relative to `now_ms`.
    pub fn evict_expired(&mut self, now_ms: u64, expiry_ms: u64) {
        self.seen_at.retain(|_, &mut seen_ms| now_ms.saturating_sub(seen_ms) <= expiry_ms);
    }

    pub fn len(&self) -> usize {
        self.seen_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen_at.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_record_of_same_id_is_a_duplicate() {
        let mut table = SeenTable::new();
        let id = Uuid::new_v4();
        assert!(table.record(id, 0));
        assert!(!table.record(id, 1));
    }

    #[test]
    fn eviction_drops_only_stale_entries() {
        let mut table = SeenTable::new();
        let old = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        table.record(old, 0);
        table.record(fresh, 900);
        table.evict_expired(1000, 500);
        assert!(!table.contains(&old));
        assert!(table.contains(&fresh));
    }
}

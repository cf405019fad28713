//! The outbound event queue: every local write is enqueued here before a
//! gossip round fans it out, generalizing `DeltaQueue`'s enqueue/dequeue/
//! purge shape from SQLite-row persistence to an in-memory push/pull queue.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use synapse_crdt::VectorClock;
use uuid::Uuid;

/// One locally-applied mutation, queued for gossip fan-out and eventual
/// backend promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub event_id: Uuid,
    pub causal_clock: VectorClock,
    pub delta: serde_json::Value,
    pub created_at_ms: u64,
    /// Peers this event has been confirmed delivered to, either by a
    /// successful direct push or by observing their vector clock advance
    /// past this event's causal clock in an inbound merge.
    pub acked_peers: BTreeSet<String>,
    pub promoted: bool,
}

impl OutboundEvent {
    pub fn new(causal_clock: VectorClock, delta: serde_json::Value, created_at_ms: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            causal_clock,
            delta,
            created_at_ms,
            acked_peers: BTreeSet::new(),
            promoted: false,
        }
    }

    /// Retained until (a) acked by every known peer, or (b) older than
    /// `retention_ms` AND already promoted — the retention rule in §4.9
    /// "Offline semantics".
    fn is_retained(&self, known_peers: &BTreeSet<String>, now_ms: u64, retention_ms: u64) -> bool {
        let acked_by_all = !known_peers.is_empty() && known_peers.is_subset(&self.acked_peers);
        if acked_by_all {
            return false;
        }
        let aged_out = now_ms.saturating_sub(self.created_at_ms) > retention_ms;
        !(aged_out && self.promoted)
    }
}

/// FIFO-ordered outbound queue with per-peer tail tracking, so a gossip
/// round only pulls events a given peer hasn't already received.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    events: VecDeque<OutboundEvent>,
    last_pushed_index: std::collections::HashMap<String, usize>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, event: OutboundEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events not yet pushed to `peer_id`, oldest first. Advances that
    /// peer's tail so the next call returns only newer events.
    pub fn tail_for_peer(&mut self, peer_id: &str) -> Vec<OutboundEvent> {
        let start = *self.last_pushed_index.get(peer_id).unwrap_or(&0);
        let tail: Vec<OutboundEvent> = self.events.iter().skip(start).cloned().collect();
        self.last_pushed_index.insert(peer_id.to_string(), self.events.len());
        tail
    }

    /// Marks `event_id` as acked by `peer_id`, either via a direct send
    /// confirmation or an inbound vector-clock-advance inference.
    pub fn ack(&mut self, event_id: Uuid, peer_id: &str) {
        if let Some(event) = self.events.iter_mut().find(|e| e.event_id == event_id) {
            event.acked_peers.insert(peer_id.to_string());
        }
    }

    /// Marks every event whose causal clock is dominated by `clock` as
    /// acked by `peer_id` — the "delta advances vector clock beyond any
    /// outbound not-yet-acked events" trim rule.
    pub fn ack_up_to(&mut self, clock: &VectorClock, peer_id: &str) {
        for event in self.events.iter_mut() {
            if clock.dominates(&event.causal_clock) {
                event.acked_peers.insert(peer_id.to_string());
            }
        }
    }

    pub fn mark_promoted(&mut self, event_id: Uuid) {
        if let Some(event) = self.events.iter_mut().find(|e| e.event_id == event_id) {
            event.promoted = true;
        }
    }

    /// Drops every event no longer retained per §4.9's rule, given the
    /// current set of known peers. Returns the number trimmed.
    pub fn trim(&mut self, known_peers: &BTreeSet<String>, now_ms: u64, retention_ms: u64) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.is_retained(known_peers, now_ms, retention_ms));
        let trimmed = before - self.events.len();
        if trimmed > 0 {
            // Re-anchor tails: indices shift once events drop out of the front.
            for index in self.last_pushed_index.values_mut() {
                *index = index.saturating_sub(trimmed);
            }
        }
        trimmed
    }

    /// Events whose age exceeds the promotion trigger, for backend
    /// promotion via C8.
    pub fn events_pending_promotion(&self, max_queue_pre_promote: usize) -> Vec<OutboundEvent> {
        if self.events.len() <= max_queue_pre_promote {
            return Vec::new();
        }
        self.events.iter().filter(|e| !e.promoted).cloned().collect()
    }

    pub fn events(&self) -> impl Iterator<Item = &OutboundEvent> {
        self.events.iter()
    }

    pub fn restore(events: Vec<OutboundEvent>) -> Self {
        Self { events: events.into(), last_pushed_index: std::collections::HashMap::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(clock_replica: &str, clock_value: u64, created_at_ms: u64) -> OutboundEvent {
        let mut clock = VectorClock::zero();
        clock.increment(clock_replica).unwrap();
        for _ in 1..clock_value {
            clock.increment(clock_replica).unwrap();
        }
        OutboundEvent::new(clock, serde_json::json!({"op": "test"}), created_at_ms)
    }

    #[test]
    fn tail_for_peer_only_returns_new_events_on_repeat_calls() {
        let mut queue = OutboundQueue::new();
        queue.enqueue(event("r1", 1, 0));
        let first_pull = queue.tail_for_peer("peer-a");
        assert_eq!(first_pull.len(), 1);

        queue.enqueue(event("r1", 2, 1));
        let second_pull = queue.tail_for_peer("peer-a");
        assert_eq!(second_pull.len(), 1);

        let fresh_peer_pull = queue.tail_for_peer("peer-b");
        assert_eq!(fresh_peer_pull.len(), 2);
    }

    #[test]
    fn trim_drops_events_acked_by_every_known_peer() {
        let mut queue = OutboundQueue::new();
        let e = event("r1", 1, 0);
        let id = e.event_id;
        queue.enqueue(e);

        let known_peers: BTreeSet<String> = ["p1".to_string(), "p2".to_string()].into_iter().collect();
        assert_eq!(queue.trim(&known_peers, 0, 86_400_000), 0);

        queue.ack(id, "p1");
        queue.ack(id, "p2");
        assert_eq!(queue.trim(&known_peers, 0, 86_400_000), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn trim_retains_aged_events_until_promoted() {
        let mut queue = OutboundQueue::new();
        queue.enqueue(event("r1", 1, 0));
        let known_peers: BTreeSet<String> = ["p1".to_string()].into_iter().collect();

        // Aged past retention but not promoted: still retained.
        assert_eq!(queue.trim(&known_peers, 100_000, 1_000), 0);

        let id = queue.events().next().unwrap().event_id;
        queue.mark_promoted(id);
        assert_eq!(queue.trim(&known_peers, 100_000, 1_000), 1);
    }

    #[test]
    fn ack_up_to_acks_every_event_dominated_by_the_clock() {
        let mut queue = OutboundQueue::new();
        queue.enqueue(event("r1", 1, 0));
        queue.enqueue(event("r1", 2, 1));

        let mut advanced = VectorClock::zero();
        advanced.increment("r1").unwrap();
        advanced.increment("r1").unwrap();
        advanced.increment("r1").unwrap();

        queue.ack_up_to(&advanced, "peer-a");
        for e in queue.events() {
            assert!(e.acked_peers.contains("peer-a"));
        }
    }
}

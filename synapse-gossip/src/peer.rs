//! Peer bookkeeping: the `PeerRecord` and its active/suspect/failed
//! lifecycle.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a peer as tracked by the local gossip engine.
/// `Active` peers are eligible for selection; `Suspect` peers are eligible
/// but deprioritized; `Failed` peers are excluded until a successful
/// receive resets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerState {
    Active,
    Suspect,
    Failed,
}

/// Everything the engine knows about one remote peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRecord {
    pub peer_id: String,
    pub instance_id: String,
    pub endpoint: String,
    pub last_seen_ms: u64,
    pub state: PeerState,
    pub health: f64,
    pub failure_count: u32,
    pub load_factor: f64,
}

impl PeerRecord {
    /// A freshly discovered peer: active, full health, no failures.
    pub fn discovered(peer_id: impl Into<String>, instance_id: impl Into<String>, endpoint: impl Into<String>, now_ms: u64) -> Self {
        Self {
            peer_id: peer_id.into(),
            instance_id: instance_id.into(),
            endpoint: endpoint.into(),
            last_seen_ms: now_ms,
            state: PeerState::Active,
            health: 1.0,
            failure_count: 0,
            load_factor: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != PeerState::Failed
    }

    /// Roulette-wheel utilization term: `health` doubles as the fraction of
    /// capacity already in use, so `1 - health` approximates free capacity.
    pub fn utilization(&self) -> f64 {
        (1.0 - self.health).clamp(0.0, 1.0)
    }

    /// Record a successful receive from this peer: resets failures, restores
    /// full health, and reactivates a suspect/failed peer.
    pub fn record_success(&mut self, now_ms: u64) {
        self.last_seen_ms = now_ms;
        self.failure_count = 0;
        self.health = 1.0;
        self.state = PeerState::Active;
    }

    /// Record a send/receive failure. Marks `Suspect` after the first
    /// failure and `Failed` once `failure_count` reaches `max_retries`.
    pub fn record_failure(&mut self, max_retries: u32) {
        self.failure_count += 1;
        self.health = (self.health - 0.25).max(0.0);
        self.state = if self.failure_count >= max_retries {
            PeerState::Failed
        } else {
            PeerState::Suspect
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_count_reaching_max_retries_marks_failed() {
        let mut peer = PeerRecord::discovered("p1", "i1", "addr", 0);
        peer.record_failure(3);
        assert_eq!(peer.state, PeerState::Suspect);
        peer.record_failure(3);
        assert_eq!(peer.state, PeerState::Suspect);
        peer.record_failure(3);
        assert_eq!(peer.state, PeerState::Failed);
        assert!(!peer.is_active());
    }

    #[test]
    fn success_resets_a_failed_peer() {
        let mut peer = PeerRecord::discovered("p1", "i1", "addr", 0);
        for _ in 0..3 {
            peer.record_failure(3);
        }
        peer.record_success(100);
        assert_eq!(peer.state, PeerState::Active);
        assert_eq!(peer.failure_count, 0);
        assert_eq!(peer.health, 1.0);
    }
}

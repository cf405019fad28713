//! The gossip engine: round structure, receive path, anti-entropy. Never
//! imports the agent-state type — the coordinator injects `on_send`,
//! `on_receive`, and `get_local_data` callbacks, and an `on_receive` failure
//! never breaks the round (per-message only).

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use synapse_core::config::GossipConfig;

use crate::anti_entropy::{missing_ids, MerkleDigest};
use crate::convergence::{estimate_propagation_time, rounds_to_reach};
use crate::error::GossipError;
use crate::message::{initial_ttl, GossipMessage, MessageType};
use crate::peer::{PeerRecord, PeerState};
use crate::selection::select_peers;
use crate::seen_table::SeenTable;

/// Transport-agnostic send primitive. An adapter outside this crate supplies
/// the concrete implementation (TCP, QUIC, in-process channel, ...).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, peer: &PeerRecord, bytes: Vec<u8>) -> Result<Vec<u8>, GossipError>;
}

/// Called after every attempted send (success or failure) to a peer, for
/// metrics and outbound-queue trimming.
pub type OnSend = Arc<dyn Fn(&PeerRecord, &GossipMessage, bool) + Send + Sync>;
/// Called on every accepted inbound message (post-dedup, pre-forward) so the
/// coordinator can merge the payload into local state. A returned error is
/// per-message: it does not stop the round or the forward.
pub type OnReceive = Arc<dyn Fn(&GossipMessage) -> Result<(), GossipError> + Send + Sync>;
/// Supplies the payload for outbound push/pull/push-pull messages — local
/// event ids and memory ids, opaque to the engine.
pub type GetLocalData = Arc<dyn Fn() -> serde_json::Value + Send + Sync>;

#[derive(Debug, Default)]
struct Counters {
    round: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time counters, for the sidecar's `/stats` endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub round: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub send_failures: u64,
    pub active_peers: usize,
}

/// Binds peer table, seen table, and transport into the push/pull/push-pull
/// round loop and the receive/forward path described in this module's
/// `run_round`/`receive`.
pub struct GossipEngine {
    replica_id: String,
    config: GossipConfig,
    transport: Arc<dyn Transport>,
    peers: Mutex<Vec<PeerRecord>>,
    seen: Mutex<SeenTable>,
    counters: Counters,
    on_send: OnSend,
    on_receive: OnReceive,
    get_local_data: GetLocalData,
}

impl GossipEngine {
    pub fn new(
        replica_id: impl Into<String>,
        config: GossipConfig,
        transport: Arc<dyn Transport>,
        on_send: OnSend,
        on_receive: OnReceive,
        get_local_data: GetLocalData,
    ) -> Self {
        Self {
            replica_id: replica_id.into(),
            config,
            transport,
            peers: Mutex::new(Vec::new()),
            seen: Mutex::new(SeenTable::new()),
            counters: Counters::default(),
            on_send,
            on_receive,
            get_local_data,
        }
    }

    pub fn add_peer(&self, peer: PeerRecord) {
        let mut peers = self.peers.lock();
        if let Some(existing) = peers.iter_mut().find(|p| p.peer_id == peer.peer_id) {
            *existing = peer;
        } else {
            peers.push(peer);
        }
    }

    pub fn remove_peer(&self, peer_id: &str) {
        self.peers.lock().retain(|p| p.peer_id != peer_id);
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            round: self.counters.round.load(AtomicOrdering::Relaxed),
            messages_sent: self.counters.messages_sent.load(AtomicOrdering::Relaxed),
            messages_received: self.counters.messages_received.load(AtomicOrdering::Relaxed),
            messages_dropped: self.counters.messages_dropped.load(AtomicOrdering::Relaxed),
            send_failures: self.counters.send_failures.load(AtomicOrdering::Relaxed),
            active_peers: self.peers.lock().iter().filter(|p| p.is_active()).count(),
        }
    }

    pub fn rounds_to_reach(&self, coverage_fraction: f64) -> u32 {
        rounds_to_reach(self.peer_count(), self.config.fanout, coverage_fraction)
    }

    pub fn estimate_propagation_time(&self, coverage_fraction: f64) -> u64 {
        estimate_propagation_time(self.peer_count(), &self.config, coverage_fraction)
    }

    /// One push-pull round, per spec's six-step round structure. Returns
    /// `Ok(())` even if individual peer sends fail (those are counted, not
    /// propagated); only `NoActivePeers` is returned as an error, and it is
    /// non-fatal — the caller simply skips the round.
    #[instrument(skip(self), fields(replica_id = %self.replica_id))]
    pub async fn run_round(&self, now_ms: u64) -> Result<(), GossipError> {
        let round = self.counters.round.fetch_add(1, AtomicOrdering::Relaxed) + 1;

        let targets: Vec<PeerRecord> = {
            let peers = self.peers.lock();
            let selected = select_peers(&peers, &self.config);
            if selected.is_empty() {
                return Err(GossipError::NoActivePeers);
            }
            selected.into_iter().cloned().collect()
        };

        let payload = (self.get_local_data)();
        let ttl = initial_ttl(self.peer_count());
        let message = GossipMessage::new(MessageType::PushPull, self.replica_id.clone(), now_ms, round, ttl, payload);

        for target in &targets {
            self.send_to(target, &message, now_ms).await;
        }

        self.seen.lock().evict_expired(now_ms, self.config.message_expiry_ms);
        Ok(())
    }

    async fn send_to(&self, target: &PeerRecord, message: &GossipMessage, now_ms: u64) {
        let bytes = match serde_json::to_vec(message) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(peer_id = %target.peer_id, error = %err, "failed to serialize outbound gossip message");
                return;
            }
        };

        let result = self.transport.send(target, bytes).await;
        let success = result.is_ok();
        if success {
            self.counters.messages_sent.fetch_add(1, AtomicOrdering::Relaxed);
            debug!(peer_id = %target.peer_id, "gossip send succeeded");
            self.mark_peer(&target.peer_id, |peer| peer.record_success(now_ms));
        } else {
            self.counters.send_failures.fetch_add(1, AtomicOrdering::Relaxed);
            warn!(peer_id = %target.peer_id, error = ?result.err(), "gossip send failed");
            let max_retries = self.config.max_retries;
            self.mark_peer(&target.peer_id, move |peer| peer.record_failure(max_retries));
        }
        (self.on_send)(target, message, success);
    }

    fn mark_peer(&self, peer_id: &str, f: impl FnOnce(&mut PeerRecord)) {
        let mut peers = self.peers.lock();
        if let Some(peer) = peers.iter_mut().find(|p| p.peer_id == peer_id) {
            f(peer);
        }
    }

    /// The receive path: dedup, expiry, forward. `raw` is the wire-format
    /// JSON payload; malformed bytes produce a `ParseError`, never a panic.
    #[instrument(skip(self, raw), fields(replica_id = %self.replica_id))]
    pub async fn receive(&self, raw: &[u8], now_ms: u64) -> Result<(), GossipError> {
        let message: GossipMessage =
            serde_json::from_slice(raw).map_err(|err| GossipError::ParseError(err.to_string()))?;
        self.receive_message(message, now_ms).await
    }

    async fn receive_message(&self, message: GossipMessage, now_ms: u64) -> Result<(), GossipError> {
        if message.message_type == MessageType::Unknown {
            self.counters.messages_dropped.fetch_add(1, AtomicOrdering::Relaxed);
            debug!(message_id = %message.message_id, "dropped message with unrecognized type");
            return Ok(());
        }

        if message.ttl == 0 || message.is_expired(now_ms, self.config.message_expiry_ms) {
            self.counters.messages_dropped.fetch_add(1, AtomicOrdering::Relaxed);
            return Err(GossipError::MessageDropped(message.message_id.to_string()));
        }

        let first_seen = self.seen.lock().record(message.message_id, now_ms);
        if !first_seen {
            self.counters.messages_dropped.fetch_add(1, AtomicOrdering::Relaxed);
            return Err(GossipError::MessageDropped(message.message_id.to_string()));
        }

        self.counters.messages_received.fetch_add(1, AtomicOrdering::Relaxed);
        let mut stamped = message;
        stamped.seen_by.insert(self.replica_id.clone());

        if let Err(err) = (self.on_receive)(&stamped) {
            warn!(error = %err, "on_receive callback failed for inbound gossip message");
        }

        if stamped.ttl > 1 {
            self.forward(&stamped, now_ms).await;
        }
        Ok(())
    }

    async fn forward(&self, message: &GossipMessage, now_ms: u64) {
        let targets: Vec<PeerRecord> = {
            let peers = self.peers.lock();
            let candidates: Vec<PeerRecord> = peers
                .iter()
                .filter(|p| p.is_active() && !message.seen_by.contains(&p.peer_id))
                .cloned()
                .collect();
            let selected = select_peers(&candidates, &self.config);
            selected.into_iter().cloned().collect()
        };
        let forwarded = message.forwarded(&self.replica_id);
        for target in &targets {
            self.send_to(target, &forwarded, now_ms).await;
        }
    }

    /// Anti-entropy round: pick one peer, compute a digest over
    /// `local_ids`, and report which remote ids would need to be requested
    /// given the peer's digest leaf count (the actual id exchange is an
    /// adapter-level RPC; this computes the local half of the protocol).
    #[instrument(skip(self, local_ids), fields(replica_id = %self.replica_id))]
    pub fn anti_entropy_digest<'a>(&self, local_ids: &[&'a str]) -> MerkleDigest {
        MerkleDigest::from_ids(local_ids.iter().copied())
    }

    /// Given the full local and remote id sets (already exchanged by the
    /// transport adapter), the ids each side is missing.
    pub fn anti_entropy_missing<'a>(
        &self,
        local_ids: &std::collections::BTreeSet<&'a str>,
        remote_ids: &std::collections::BTreeSet<&'a str>,
    ) -> (Vec<&'a str>, Vec<&'a str>) {
        missing_ids(local_ids, remote_ids)
    }

    pub fn peer_state(&self, peer_id: &str) -> Option<PeerState> {
        self.peers.lock().iter().find(|p| p.peer_id == peer_id).map(|p| p.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;

    struct AlwaysSucceeds;

    #[async_trait]
    impl Transport for AlwaysSucceeds {
        async fn send(&self, _peer: &PeerRecord, _bytes: Vec<u8>) -> Result<Vec<u8>, GossipError> {
            Ok(Vec::new())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Transport for AlwaysFails {
        async fn send(&self, peer: &PeerRecord, _bytes: Vec<u8>) -> Result<Vec<u8>, GossipError> {
            Err(GossipError::SendFailed { peer_id: peer.peer_id.clone(), reason: "refused".to_string() })
        }
    }

    fn test_engine(transport: Arc<dyn Transport>) -> GossipEngine {
        GossipEngine::new(
            "r0",
            GossipConfig { fanout: 2, ..GossipConfig::default() },
            transport,
            Arc::new(|_: &PeerRecord, _: &GossipMessage, _: bool| {}),
            Arc::new(|_: &GossipMessage| Ok(())),
            Arc::new(|| serde_json::json!({"events": []})),
        )
    }

    #[tokio::test]
    async fn round_with_no_peers_is_non_fatal() {
        let engine = test_engine(Arc::new(AlwaysSucceeds));
        let result = engine.run_round(0).await;
        assert!(matches!(result, Err(GossipError::NoActivePeers)));
    }

    #[tokio::test]
    async fn successful_round_marks_peers_active_and_bumps_counters() {
        let engine = test_engine(Arc::new(AlwaysSucceeds));
        engine.add_peer(PeerRecord::discovered("p1", "i1", "addr1", 0));
        engine.add_peer(PeerRecord::discovered("p2", "i2", "addr2", 0));

        engine.run_round(1000).await.unwrap();

        let stats = engine.stats();
        assert_eq!(stats.messages_sent, 2);
        assert_eq!(stats.round, 1);
        assert_eq!(engine.peer_state("p1"), Some(PeerState::Active));
    }

    #[tokio::test]
    async fn failing_sends_eventually_mark_peer_failed() {
        let engine = GossipEngine::new(
            "r0",
            GossipConfig { fanout: 1, max_retries: 2, ..GossipConfig::default() },
            Arc::new(AlwaysFails),
            Arc::new(|_: &PeerRecord, _: &GossipMessage, _: bool| {}),
            Arc::new(|_: &GossipMessage| Ok(())),
            Arc::new(|| serde_json::json!({})),
        );
        engine.add_peer(PeerRecord::discovered("p1", "i1", "addr1", 0));

        for round_ms in [0, 100] {
            let _ = engine.run_round(round_ms).await;
        }

        assert_eq!(engine.peer_state("p1"), Some(PeerState::Failed));
        assert_eq!(engine.stats().send_failures, 2);
    }

    #[tokio::test]
    async fn duplicate_message_is_dropped_on_second_receive() {
        let engine = test_engine(Arc::new(AlwaysSucceeds));
        let message = GossipMessage::new(MessageType::Push, "peer", 0, 0, 5, serde_json::json!({}));
        let raw = serde_json::to_vec(&message).unwrap();

        assert!(engine.receive(&raw, 0).await.is_ok());
        let second = engine.receive(&raw, 1).await;
        assert!(matches!(second, Err(GossipError::MessageDropped(_))));
    }

    #[tokio::test]
    async fn zero_ttl_message_is_dropped_without_invoking_callback() {
        let invoked = Arc::new(AtomicBool::new(false));
        let invoked_clone = invoked.clone();
        let engine = GossipEngine::new(
            "r0",
            GossipConfig::default(),
            Arc::new(AlwaysSucceeds),
            Arc::new(|_: &PeerRecord, _: &GossipMessage, _: bool| {}),
            Arc::new(move |_: &GossipMessage| {
                invoked_clone.store(true, AtomicOrdering::Relaxed);
                Ok(())
            }),
            Arc::new(|| serde_json::json!({})),
        );
        let message = GossipMessage::new(MessageType::Push, "peer", 0, 0, 0, serde_json::json!({}));
        let raw = serde_json::to_vec(&message).unwrap();

        let result = engine.receive(&raw, 0).await;
        assert!(matches!(result, Err(GossipError::MessageDropped(_))));
        assert!(!invoked.load(AtomicOrdering::Relaxed));
    }

    #[tokio::test]
    async fn malformed_bytes_produce_parse_error_not_panic() {
        let engine = test_engine(Arc::new(AlwaysSucceeds));
        let result = engine.receive(b"not json", 0).await;
        assert!(matches!(result, Err(GossipError::ParseError(_))));
    }

    #[tokio::test]
    async fn unrecognized_message_type_is_counted_and_dropped_not_errored() {
        let engine = test_engine(Arc::new(AlwaysSucceeds));
        let raw = br#"{"message_id":"00000000-0000-0000-0000-000000000000","type":"future_kind","sender_id":"peer","timestamp_ms":0,"round":0,"ttl":5,"payload":null,"seen_by":[],"signature":null}"#;

        let result = engine.receive(raw, 0).await;
        assert!(result.is_ok());
        assert_eq!(engine.stats().messages_dropped, 1);
        assert_eq!(engine.stats().messages_received, 0);
    }
}

//! Binds agent state, gossip, resilience, and the long-term backend into one
//! lifecycle, generalizing `cortex-multiagent`'s sync `Engine` from a
//! SQLite-backed delta queue to the injected-callback `GossipEngine` here.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use synapse_backend::LongTermBackend;
use synapse_core::config::{SyncConfig, SynapseConfig};
use synapse_core::{SynapseError, SynapseResult};
use synapse_crdt::AgentState;
use synapse_crypto::{Signature, VerifyingKey};
use synapse_consensus::Outlier;
use synapse_gossip::{GossipEngine, GossipError, GossipMessage, PeerRecord, Transport};
use synapse_observability::{HealthChecker, HealthReport, HealthSnapshot, MetricsCollector};
use synapse_resilience::{BreakerState, RateLimiter};

use crate::cancellation::CancellationToken;
use crate::mutation::LocalMutation;
use crate::outbound_queue::{OutboundEvent, OutboundQueue};
use crate::snapshot::{Snapshot, SnapshotError, SnapshotStore};

/// The only thing actually placed on the wire in a gossip round's payload:
/// the sender's full agent state, opaque to `GossipEngine` itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GossipPayload {
    agent_state: AgentState,
}

/// Result of reconciling conflicting peer reports for a single skill's
/// proficiency via Byzantine-resistant aggregation (C6), used on reconnect
/// when several peers disagree about a value outside what LWW alone can
/// adjudicate (e.g. a full anti-entropy sweep surfacing adversarial skew).
#[derive(Debug, Clone, Serialize)]
pub struct SkillReconciliation {
    pub skill: String,
    pub consensus: f64,
    pub outliers: Vec<ReportOutlier>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutlier {
    pub peer_id: String,
    pub value: f64,
    pub z_score: f64,
}

/// Binds everything (§4.9). `start` brings up the gossip round loop;
/// `stop` drains the queue and disposes. Exposes the external interfaces
/// named in §6: `apply_local_mutation`, `ingest_gossip_message`,
/// `rate_limit_check`, `register_peer`/`unregister_peer`.
pub struct SyncCoordinator {
    replica_id: String,
    agent_state: Arc<Mutex<AgentState>>,
    outbound: Arc<Mutex<OutboundQueue>>,
    known_peers: Mutex<BTreeSet<String>>,
    trust_store: Arc<Mutex<HashMap<String, VerifyingKey>>>,
    gossip: Arc<GossipEngine>,
    rate_limiter: Arc<RateLimiter>,
    backend: Arc<dyn LongTermBackend>,
    metrics: Arc<MetricsCollector>,
    sync_config: SyncConfig,
    gossip_fanout: usize,
    snapshot_store: Option<SnapshotStore>,
    cancellation: CancellationToken,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SyncCoordinator {
    pub fn new(
        replica_id: impl Into<String>,
        agent_state: AgentState,
        config: SynapseConfig,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn LongTermBackend>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let replica_id = replica_id.into();
        let agent_state = Arc::new(Mutex::new(agent_state));
        let outbound = Arc::new(Mutex::new(OutboundQueue::new()));
        let trust_store: Arc<Mutex<HashMap<String, VerifyingKey>>> = Arc::new(Mutex::new(HashMap::new()));

        let snapshot_store = config.sync.snapshot_dir.clone().map(SnapshotStore::new);
        let gossip_fanout = config.gossip.fanout;

        let get_local_data = {
            let agent_state = agent_state.clone();
            Arc::new(move || {
                let payload = GossipPayload { agent_state: agent_state.lock().clone() };
                serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
            })
        };

        let on_receive = {
            let agent_state = agent_state.clone();
            let outbound = outbound.clone();
            let trust_store = trust_store.clone();
            let metrics = metrics.clone();
            Arc::new(move |message: &GossipMessage| -> Result<(), GossipError> {
                verify_signature(message, &trust_store)?;

                let payload: GossipPayload = serde_json::from_value(message.payload.clone())
                    .map_err(|err| GossipError::ParseError(err.to_string()))?;

                let clock = {
                    let mut state = agent_state.lock();
                    state
                        .merge(&payload.agent_state)
                        .map_err(|err| GossipError::ParseError(err.to_string()))?;
                    state.vector_clock().clone()
                };

                outbound.lock().ack_up_to(&clock, &message.sender_id);
                metrics.gossip.record_receive();
                Ok(())
            })
        };

        let on_send = {
            let metrics = metrics.clone();
            Arc::new(move |_peer: &PeerRecord, _message: &GossipMessage, success: bool| {
                metrics.gossip.record_send(success);
            })
        };

        let gossip = Arc::new(GossipEngine::new(
            replica_id.clone(),
            config.gossip.clone(),
            transport,
            on_send,
            on_receive,
            get_local_data,
        ));

        Self {
            replica_id,
            agent_state,
            outbound,
            known_peers: Mutex::new(BTreeSet::new()),
            trust_store,
            gossip,
            rate_limiter: Arc::new(RateLimiter::new(config.resilience.clone())),
            backend,
            metrics,
            sync_config: config.sync,
            gossip_fanout,
            snapshot_store,
            cancellation: CancellationToken::new(),
            loop_handle: Mutex::new(None),
        }
    }

    /// Restores agent state and the outbound queue from a prior snapshot, if
    /// one is configured and present. Call before [`start`](Self::start).
    #[instrument(skip(self))]
    pub fn restore_from_snapshot(&self) -> SynapseResult<bool> {
        let Some(store) = &self.snapshot_store else {
            return Ok(false);
        };
        let result = store.read(self.sync_config.allow_recover_from_scratch);
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err @ SnapshotError::Corrupt { .. }) => return Err(err.into()),
            Err(err) => return Err(err.into()),
        };
        let Some(snapshot) = snapshot else {
            return Ok(false);
        };
        *self.agent_state.lock() = snapshot.agent_state;
        *self.outbound.lock() = OutboundQueue::restore(snapshot.outbound_events);
        Ok(true)
    }

    /// Registers a peer's verifying key, so inbound signed messages from it
    /// can be authenticated. A peer with no registered key can still send
    /// unsigned messages; a signed message from an unregistered peer is
    /// rejected.
    pub fn trust_peer(&self, peer_id: impl Into<String>, key: VerifyingKey) {
        self.trust_store.lock().insert(peer_id.into(), key);
    }

    pub fn register_peer(&self, peer: PeerRecord) {
        self.known_peers.lock().insert(peer.peer_id.clone());
        self.gossip.add_peer(peer);
    }

    pub fn unregister_peer(&self, peer_id: &str) {
        self.known_peers.lock().remove(peer_id);
        self.gossip.remove_peer(peer_id);
        self.trust_store.lock().remove(peer_id);
    }

    /// Step 1-2 of the local-write loop: apply `mutation` to agent state and
    /// enqueue the resulting outbound event for the next gossip round.
    #[instrument(skip(self, mutation))]
    pub fn apply_local_mutation(&self, mutation: LocalMutation, now_ms: u64) -> SynapseResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(SynapseError::Cancelled);
        }

        let delta = serde_json::to_value(&mutation).map_err(SynapseError::SerializationError)?;
        {
            let mut state = self.agent_state.lock();
            match &mutation {
                LocalMutation::UpdateSkill { name, proficiency, last_used_ms } => {
                    state.update_skill(name, *proficiency, *last_used_ms)?;
                }
                LocalMutation::RecordSkillUse { name } => {
                    state.record_skill_use(name)?;
                }
                LocalMutation::AddEpisode(episode) => {
                    state.add_episode(episode.clone())?;
                }
                LocalMutation::ForgetEpisode { id } => {
                    state.forget_episode(id)?;
                }
                LocalMutation::SetIdentity(identity) => {
                    state.set_identity(identity.clone())?;
                }
            }
        }

        let clock = self.agent_state.lock().vector_clock().clone();
        let event = OutboundEvent::new(clock, delta, now_ms);
        self.outbound.lock().enqueue(event);
        self.metrics.queue.record_enqueue();
        self.metrics.queue.set_depth(self.outbound.lock().len());
        Ok(())
    }

    /// Step 5 of the local-write loop: hand a raw inbound gossip envelope
    /// to the engine's receive path. Signature validation and the local
    /// merge happen inside the `on_receive` callback installed in `new`.
    #[instrument(skip(self, raw_bytes))]
    pub async fn ingest_gossip_message(&self, raw_bytes: &[u8], now_ms: u64) -> SynapseResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(SynapseError::Cancelled);
        }
        self.gossip.receive(raw_bytes, now_ms).await.map_err(Into::into)
    }

    /// The sole admission gate for gossip sends and backend writes, exposed
    /// directly for callers (e.g. the sidecar's `/check` endpoint) that need
    /// to pre-flight a resource before doing their own I/O.
    #[instrument(skip(self))]
    pub fn rate_limit_check(&self, resource: &str, client_id: &str) -> SynapseResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(SynapseError::Cancelled);
        }
        self.rate_limiter.check(resource, client_id)
    }

    pub fn record_outcome(&self, resource: &str, success: bool) {
        self.rate_limiter.record(resource, success);
    }

    /// Step 3: runs one gossip round, having the engine pull each target
    /// peer's outbound tail first so freshly-enqueued events ride along.
    #[instrument(skip(self))]
    pub async fn run_gossip_round(&self, now_ms: u64) -> SynapseResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(SynapseError::Cancelled);
        }
        if self.rate_limiter.check("gossip", &self.replica_id).is_err() {
            debug!("gossip round skipped: rate limited");
            return Ok(());
        }
        match self.gossip.run_round(now_ms).await {
            Ok(()) => {
                self.rate_limiter.record("gossip", true);
                self.metrics.gossip.record_round();
                self.metrics.gossip.set_active_peer_count(self.gossip.stats().active_peers);
                Ok(())
            }
            Err(GossipError::NoActivePeers) => Ok(()),
            Err(err) => {
                self.rate_limiter.record("gossip", false);
                Err(err.into())
            }
        }
    }

    /// Step 4: promotes events past the pre-promote threshold to the
    /// long-term backend, admitted through the rate limiter (C7).
    #[instrument(skip(self))]
    pub async fn promote_pending_events(&self, now_ms: u64) -> SynapseResult<usize> {
        if self.cancellation.is_cancelled() {
            return Err(SynapseError::Cancelled);
        }

        let pending = self.outbound.lock().events_pending_promotion(self.sync_config.max_queue_pre_promote);
        if pending.is_empty() {
            return Ok(0);
        }

        if self.rate_limiter.check("backend", &self.replica_id).is_err() {
            debug!("promotion skipped: backend rate limited");
            return Ok(0);
        }

        let agent_id = self.agent_state.lock().agent_id().to_string();
        let entries = pending
            .iter()
            .map(|event| {
                synapse_backend::MemoryEntry::new(agent_id.clone(), event.delta.to_string(), 0.5)
                    .with_tags(vec!["outbound-event".to_string()])
                    .with_source(synapse_backend::MemorySource::BeadPromotion)
                    .with_timestamp_ms(event.created_at_ms)
            })
            .collect();

        let result = self.backend.store_batch(entries).await;
        match result {
            Ok(batch) => {
                self.rate_limiter.record("backend", true);
                let mut queue = self.outbound.lock();
                for event in pending.iter().take(batch.stored.len()) {
                    queue.mark_promoted(event.event_id);
                }
                self.trim_outbound(now_ms);
                Ok(batch.stored.len())
            }
            Err(err) => {
                self.rate_limiter.record("backend", false);
                Err(SynapseError::Transient(err.to_string()))
            }
        }
    }

    /// Reconciles conflicting peer reports of a skill's proficiency via
    /// Byzantine-resistant aggregation (C6) — for use on reconnect, when an
    /// anti-entropy sweep has collected several peers' values for the same
    /// skill and up to `f < N/3` of them may be adversarial. The trimmed
    /// mean becomes the new local value; peers whose report is flagged an
    /// outlier are reported but not excluded from future rounds.
    #[instrument(skip(self, reports))]
    pub fn reconcile_skill_reports(
        &self,
        skill: &str,
        reports: &[(String, f64)],
        now_ms: u64,
    ) -> SynapseResult<SkillReconciliation> {
        if self.cancellation.is_cancelled() {
            return Err(SynapseError::Cancelled);
        }
        if reports.is_empty() {
            return Err(SynapseError::InvariantViolation("no reports to reconcile".to_string()));
        }

        let values: Vec<f64> = reports.iter().map(|(_, value)| *value).collect();
        let consensus = synapse_consensus::trimmed_mean(&values, 0.2)
            .ok_or_else(|| SynapseError::InvariantViolation("no reports to reconcile".to_string()))?;
        let flagged = synapse_consensus::detect_outliers(&values, 2.0, 5);
        let outliers: Vec<ReportOutlier> = flagged
            .into_iter()
            .map(|Outlier { index, value, z_score }| ReportOutlier { peer_id: reports[index].0.clone(), value, z_score })
            .collect();

        if !outliers.is_empty() {
            warn!(skill, count = outliers.len(), "flagged outlier skill reports during reconciliation");
        }

        self.apply_local_mutation(
            LocalMutation::UpdateSkill { name: skill.to_string(), proficiency: consensus, last_used_ms: now_ms },
            now_ms,
        )?;

        Ok(SkillReconciliation { skill: skill.to_string(), consensus, outliers })
    }

    fn trim_outbound(&self, now_ms: u64) {
        let known_peers = self.known_peers.lock().clone();
        let trimmed = self.outbound.lock().trim(&known_peers, now_ms, self.sync_config.outbound_retention_ms);
        if trimmed > 0 {
            self.metrics.queue.record_trim(trimmed as u64);
        }
        self.metrics.queue.set_depth(self.outbound.lock().len());
    }

    /// Persists a snapshot of the current agent state and outbound queue
    /// immediately, outside the periodic interval.
    #[instrument(skip(self))]
    pub fn snapshot_now(&self) -> SynapseResult<()> {
        let Some(store) = &self.snapshot_store else {
            return Ok(());
        };
        let snapshot = Snapshot {
            agent_state: self.agent_state.lock().clone(),
            outbound_events: self.outbound.lock().events().cloned().collect(),
        };
        store.write(&snapshot).map_err(Into::into)
    }

    pub fn health_snapshot(&self) -> HealthSnapshot {
        let stats = self.gossip.stats();
        let open_breakers = ["gossip", "backend"]
            .into_iter()
            .filter(|resource| matches!(self.rate_limiter.breaker_state(resource), Some(BreakerState::Open)))
            .map(str::to_string)
            .collect();
        HealthSnapshot {
            active_peer_count: stats.active_peers,
            configured_fanout: self.gossip_fanout,
            circuit_breaker_open_resources: open_breakers,
            backend_connected: false,
            outbound_queue_depth: self.outbound.lock().len(),
            outbound_queue_soft_cap: self.sync_config.max_queue_pre_promote,
        }
    }

    pub async fn health_report(&self) -> HealthReport {
        let mut snapshot = self.health_snapshot();
        snapshot.backend_connected = self.backend.is_connected().await;
        HealthReport::build(&HealthChecker::new(), &snapshot)
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn agent_state(&self) -> AgentState {
        self.agent_state.lock().clone()
    }

    /// Brings up gossip + rate limiter + backend (§4.9's `start`): connects
    /// the backend, then spawns the background round loop — gossip rounds
    /// on `gossip.interval_ms`, promotion checks and periodic snapshots
    /// interleaved. Cooperatively stops as soon as [`stop`](Self::stop) is
    /// called.
    pub async fn start(self: &Arc<Self>, interval_ms: u64, snapshot_interval_ms: u64) -> SynapseResult<()> {
        self.backend.initialize().await.map_err(SynapseError::from)?;

        let coordinator = self.clone();
        let mut round_interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        let mut snapshot_interval = tokio::time::interval(Duration::from_millis(snapshot_interval_ms.max(1)));

        let handle = tokio::spawn(async move {
            loop {
                if coordinator.cancellation.is_cancelled() {
                    break;
                }
                tokio::select! {
                    _ = round_interval.tick() => {
                        let now_ms = now_ms_monotonic();
                        if let Err(err) = coordinator.run_gossip_round(now_ms).await {
                            warn!(error = %err, "gossip round failed");
                        }
                        if let Err(err) = coordinator.promote_pending_events(now_ms).await {
                            warn!(error = %err, "promotion pass failed");
                        }
                    }
                    _ = snapshot_interval.tick() => {
                        if let Err(err) = coordinator.snapshot_now() {
                            warn!(error = %err, "periodic snapshot failed");
                        }
                    }
                }
            }
        });

        *self.loop_handle.lock() = Some(handle);
        Ok(())
    }

    /// Cooperative shutdown: signals cancellation, awaits the round loop's
    /// exit, writes a final snapshot, and drains nothing further — queued
    /// events not yet acked or promoted survive in the snapshot.
    pub async fn stop(&self) -> SynapseResult<()> {
        self.cancellation.cancel();
        let handle = self.loop_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.snapshot_now()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }
}

fn verify_signature(message: &GossipMessage, trust_store: &Mutex<HashMap<String, VerifyingKey>>) -> Result<(), GossipError> {
    let Some(signature_hex) = &message.signature else {
        return Ok(());
    };
    let trust = trust_store.lock();
    let Some(key) = trust.get(&message.sender_id) else {
        return Err(GossipError::ParseError(format!("no trusted key for signer {}", message.sender_id)));
    };
    let signed_bytes = message.payload.to_string();
    let sig_bytes: [u8; 64] = hex::decode(signature_hex)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| GossipError::ParseError("malformed signature encoding".to_string()))?;
    let signature = Signature::from_bytes(&sig_bytes);
    if key.verify(signed_bytes.as_bytes(), &signature) {
        Ok(())
    } else {
        Err(GossipError::ParseError(format!("signature verification failed for {}", message.sender_id)))
    }
}

/// `GossipEngine::run_round` takes its clock as a parameter rather than
/// reading the OS clock itself; the coordinator's background loop is the one
/// place that needs a wall-clock reading to drive it.
fn now_ms_monotonic() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

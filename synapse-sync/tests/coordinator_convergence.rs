//! End-to-end: two coordinators exchanging gossip rounds over a transport
//! that forwards directly into the peer's `ingest_gossip_message`, the way
//! `synapse-gossip`'s own integration test exercises the bare engine.

use std::sync::Arc;

use async_trait::async_trait;
use synapse_backend::{LongTermBackend, MemoryBackend};
use synapse_core::config::SynapseConfig;
use synapse_core::AgentId;
use synapse_crdt::AgentState;
use synapse_gossip::{GossipError, PeerRecord, Transport};
use synapse_observability::MetricsCollector;
use synapse_sync::{LocalMutation, SyncCoordinator};

struct ForwardingTransport {
    peer: std::sync::OnceLock<Arc<SyncCoordinator>>,
}

impl ForwardingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self { peer: std::sync::OnceLock::new() })
    }

    fn link(&self, peer: Arc<SyncCoordinator>) {
        let _ = self.peer.set(peer);
    }
}

#[async_trait]
impl Transport for ForwardingTransport {
    async fn send(&self, _peer: &PeerRecord, bytes: Vec<u8>) -> Result<Vec<u8>, GossipError> {
        let peer = self.peer.get().expect("peer linked before first send");
        peer.ingest_gossip_message(&bytes, 0).await.map_err(|err| GossipError::ParseError(err.to_string()))?;
        Ok(Vec::new())
    }
}

fn build(replica_id: &str, agent_id: AgentId) -> (Arc<SyncCoordinator>, Arc<ForwardingTransport>) {
    let transport = ForwardingTransport::new();
    let coordinator = Arc::new(SyncCoordinator::new(
        replica_id,
        AgentState::create(agent_id, replica_id.to_string()).unwrap(),
        SynapseConfig::default(),
        transport.clone(),
        Arc::new(MemoryBackend::new()),
        Arc::new(MetricsCollector::new()),
    ));
    (coordinator, transport)
}

/// Two replicas of the same logical agent, each updating a different skill
/// locally, converge to both skills after exchanging one round each way.
#[tokio::test]
async fn two_replicas_converge_after_one_round_each() {
    let agent_id = AgentId::new();
    let (replica_a, transport_a) = build("replica-a", agent_id.clone());
    let (replica_b, transport_b) = build("replica-b", agent_id);

    transport_a.link(replica_b.clone());
    transport_b.link(replica_a.clone());

    replica_a.register_peer(PeerRecord::discovered("replica-b", "i-b", "addr-b", 0));
    replica_b.register_peer(PeerRecord::discovered("replica-a", "i-a", "addr-a", 0));

    replica_a
        .apply_local_mutation(LocalMutation::UpdateSkill { name: "rust".to_string(), proficiency: 0.8, last_used_ms: 0 }, 0)
        .unwrap();
    replica_b
        .apply_local_mutation(LocalMutation::UpdateSkill { name: "go".to_string(), proficiency: 0.6, last_used_ms: 0 }, 0)
        .unwrap();

    replica_a.run_gossip_round(0).await.unwrap();
    replica_b.run_gossip_round(0).await.unwrap();

    let state_a = replica_a.agent_state();
    let state_b = replica_b.agent_state();
    assert_eq!(state_a.skill("go").unwrap().proficiency, 0.6);
    assert_eq!(state_b.skill("rust").unwrap().proficiency, 0.8);
}

struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn send(&self, _peer: &PeerRecord, _bytes: Vec<u8>) -> Result<Vec<u8>, GossipError> {
        Ok(Vec::new())
    }
}

/// Events past the pre-promote threshold land in the backend once it has
/// been initialized, and the outbound queue shrinks accordingly.
#[tokio::test]
async fn promoted_events_land_in_the_backend() {
    let backend = Arc::new(MemoryBackend::new());
    backend.initialize().await.unwrap();

    let replica_a = SyncCoordinator::new(
        "replica-a",
        AgentState::create(AgentId::new(), "replica-a".to_string()).unwrap(),
        SynapseConfig { sync: synapse_core::config::SyncConfig { max_queue_pre_promote: 2, ..Default::default() }, ..SynapseConfig::default() },
        Arc::new(NoopTransport),
        backend,
        Arc::new(MetricsCollector::new()),
    );

    for i in 0..5 {
        replica_a
            .apply_local_mutation(
                LocalMutation::UpdateSkill { name: format!("skill-{i}"), proficiency: 0.5, last_used_ms: 0 },
                0,
            )
            .unwrap();
    }

    let promoted = replica_a.promote_pending_events(0).await.unwrap();
    assert!(promoted > 0);
}

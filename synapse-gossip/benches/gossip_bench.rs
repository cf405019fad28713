//! Criterion benchmarks for peer selection, anti-entropy digesting, and the
//! cost of a full gossip round.

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, Criterion};

use synapse_core::config::GossipConfig;
use synapse_gossip::{GossipEngine, GossipError, GossipMessage, MerkleDigest, PeerRecord, Transport, select_peers};

struct AlwaysSucceeds;

#[async_trait]
impl Transport for AlwaysSucceeds {
    async fn send(&self, _peer: &PeerRecord, _bytes: Vec<u8>) -> Result<Vec<u8>, GossipError> {
        Ok(Vec::new())
    }
}

fn bench_select_peers(c: &mut Criterion) {
    let peers: Vec<PeerRecord> = (0..200).map(|i| PeerRecord::discovered(format!("p{i}"), format!("i{i}"), "addr", 0)).collect();
    let config = GossipConfig { fanout: 5, ..GossipConfig::default() };

    c.bench_function("select_peers_200_fanout_5", |b| {
        b.iter(|| select_peers(&peers, &config));
    });
}

fn bench_anti_entropy_digest(c: &mut Criterion) {
    let ids: Vec<String> = (0..1000).map(|i| format!("episode-{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    c.bench_function("anti_entropy_digest_1000_ids", |b| {
        b.iter(|| MerkleDigest::from_ids(refs.iter().copied()));
    });
}

fn bench_gossip_round(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let engine = Arc::new(GossipEngine::new(
        "bench-replica",
        GossipConfig { fanout: 5, ..GossipConfig::default() },
        Arc::new(AlwaysSucceeds),
        Arc::new(|_: &PeerRecord, _: &GossipMessage, _: bool| {}),
        Arc::new(|_: &GossipMessage| Ok(())),
        Arc::new(|| serde_json::json!({"events": ["e1", "e2", "e3"]})),
    ));
    for i in 0..50 {
        engine.add_peer(PeerRecord::discovered(format!("p{i}"), format!("i{i}"), "addr", 0));
    }

    c.bench_function("gossip_round_50_peers_fanout_5", |b| {
        b.iter(|| runtime.block_on(engine.run_round(0)));
    });
}

criterion_group!(benches, bench_select_peers, bench_anti_entropy_digest, bench_gossip_round);
criterion_main!(benches);

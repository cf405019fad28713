//! Criterion benchmarks for merge cost of the CRDT primitives and the
//! agent-state composite.

use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};

use synapse_core::AgentId;
use synapse_crdt::clock::VectorClock;
use synapse_crdt::primitives::{GCounter, LwwRegister, OrSet};
use synapse_crdt::AgentState;

fn bench_gcounter_merge(c: &mut Criterion) {
    let mut a = GCounter::empty();
    let mut b = GCounter::empty();
    for i in 0..5 {
        a.increment(&format!("replica-{i}"), 100).unwrap();
        b.increment(&format!("replica-{i}"), 100).unwrap();
    }

    c.bench_function("gcounter_merge_5_replicas", |bench| {
        bench.iter(|| a.merged(&b));
    });
}

fn bench_lww_register_merge(c: &mut Criterion) {
    let now = Utc::now();
    let a = LwwRegister::new("value-a".to_string(), now, "replica-a".to_string());
    let b = LwwRegister::new(
        "value-b".to_string(),
        now + chrono::Duration::seconds(1),
        "replica-b".to_string(),
    );

    c.bench_function("lww_register_merge", |bench| {
        bench.iter(|| a.merged(&b));
    });
}

fn bench_or_set_merge_1000(c: &mut Criterion) {
    let mut a = OrSet::empty();
    let mut b = OrSet::empty();
    for i in 0..1000 {
        a.add(format!("elem-{i}"), "replica-a");
        b.add(format!("elem-{}", i + 500), "replica-b");
    }

    c.bench_function("or_set_merge_1000_elements", |bench| {
        bench.iter(|| a.merged(&b));
    });
}

fn bench_vector_clock_merge(c: &mut Criterion) {
    let mut a = VectorClock::zero();
    let mut b = VectorClock::zero();
    for i in 0..20 {
        for _ in 0..10 {
            a.increment(&format!("replica-{i}")).unwrap();
            b.increment(&format!("replica-{i}")).unwrap();
        }
    }

    c.bench_function("vector_clock_merge_20_replicas", |bench| {
        bench.iter(|| a.merge(&b));
    });
}

fn bench_agent_state_merge(c: &mut Criterion) {
    let agent_id = AgentId::new();
    let mut a = AgentState::create(agent_id.clone(), "replica-a").unwrap();
    let mut b = AgentState::create(agent_id, "replica-b").unwrap();
    for i in 0..20 {
        a.update_skill(&format!("skill-{i}"), 0.5, i as u64).unwrap();
        b.update_skill(&format!("skill-{i}"), 0.7, i as u64).unwrap();
    }

    c.bench_function("agent_state_full_merge_20_skills", |bench| {
        bench.iter(|| {
            let mut local = a.clone();
            local.merge(&b).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_gcounter_merge,
    bench_lww_register_merge,
    bench_or_set_merge_1000,
    bench_vector_clock_merge,
    bench_agent_state_merge,
);
criterion_main!(benches);

//! Central metrics registry, following `cortex-observability`'s
//! `MetricsCollector` shape: one struct per domain, aggregated behind a
//! single owner with atomic counters/gauges so concurrent gossip rounds and
//! sync writes can record without a lock.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

/// Gossip-specific counters and gauges, named in C10's "Share" row:
/// fanout, convergence, and queue depth.
#[derive(Debug, Default, Serialize)]
pub struct GossipMetrics {
    pub rounds_completed: AtomicU64,
    pub messages_sent: AtomicU64,
    pub messages_received: AtomicU64,
    pub messages_dropped: AtomicU64,
    pub send_failures: AtomicU64,
    pub active_peer_count: AtomicI64,
    pub estimated_convergence_rounds: AtomicI64,
}

impl GossipMetrics {
    pub fn record_round(&self) {
        self.rounds_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send(&self, success: bool) {
        if success {
            self.messages_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_receive(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_active_peer_count(&self, count: usize) {
        self.active_peer_count.store(count as i64, Ordering::Relaxed);
    }

    pub fn set_estimated_convergence_rounds(&self, rounds: u32) {
        self.estimated_convergence_rounds.store(rounds as i64, Ordering::Relaxed);
    }
}

/// Outbound/offline queue depth, the other half of C10's named metrics.
#[derive(Debug, Default, Serialize)]
pub struct QueueMetrics {
    pub outbound_depth: AtomicI64,
    pub events_enqueued: AtomicU64,
    pub events_dequeued: AtomicU64,
    pub events_trimmed: AtomicU64,
}

impl QueueMetrics {
    pub fn set_depth(&self, depth: usize) {
        self.outbound_depth.store(depth as i64, Ordering::Relaxed);
    }

    pub fn record_enqueue(&self) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dequeue(&self) {
        self.events_dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trim(&self, count: u64) {
        self.events_trimmed.fetch_add(count, Ordering::Relaxed);
    }
}

/// Byzantine-aggregator outlier counter, so z-score outliers are reported
/// rather than silently dropped (§4.6).
#[derive(Debug, Default, Serialize)]
pub struct ConsensusMetrics {
    pub outliers_detected: AtomicU64,
    pub supermajority_hits: AtomicU64,
    pub supermajority_misses: AtomicU64,
}

impl ConsensusMetrics {
    pub fn record_outliers(&self, count: usize) {
        self.outliers_detected.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_supermajority(&self, hit: bool) {
        if hit {
            self.supermajority_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.supermajority_misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Central metrics registry that owns all domain-specific collectors.
#[derive(Debug, Default, Serialize)]
pub struct MetricsCollector {
    pub gossip: GossipMetrics,
    pub queue: QueueMetrics,
    pub consensus: ConsensusMetrics,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes current values to JSON, for the sidecar's `/stats`
    /// endpoint and periodic metrics snapshots.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gossip_metrics_accumulate_across_calls() {
        let metrics = GossipMetrics::default();
        metrics.record_round();
        metrics.record_send(true);
        metrics.record_send(false);
        metrics.record_receive();

        assert_eq!(metrics.rounds_completed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.messages_sent.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.send_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.messages_received.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn snapshot_serializes_nested_collectors() {
        let collector = MetricsCollector::new();
        collector.queue.set_depth(42);
        let snapshot = collector.snapshot();
        assert_eq!(snapshot["queue"]["outbound_depth"], 42);
    }
}

//! Aggregate health reporting, grounded on `cortex-observability`'s
//! `HealthReporter`/`HealthSnapshot` split but generalized to this core's
//! subsystems (gossip, backend, rate limiter) instead of memory storage.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsCollector;

/// Overall health verdict, worst-subsystem-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// One subsystem's contribution to the aggregate report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemHealth {
    pub name: String,
    pub status: HealthStatus,
    pub detail: String,
}

/// A point-in-time input to [`HealthChecker::check`] — whatever the
/// coordinator currently knows about the engines it owns.
#[derive(Debug, Clone, Default)]
pub struct HealthSnapshot {
    pub active_peer_count: usize,
    pub configured_fanout: usize,
    pub circuit_breaker_open_resources: Vec<String>,
    pub backend_connected: bool,
    pub outbound_queue_depth: usize,
    pub outbound_queue_soft_cap: usize,
}

/// Builds a full health report from a [`HealthSnapshot`].
#[derive(Debug, Default)]
pub struct HealthChecker;

impl HealthChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, snapshot: &HealthSnapshot) -> Vec<SubsystemHealth> {
        vec![
            self.check_gossip(snapshot),
            self.check_backend(snapshot),
            self.check_rate_limiter(snapshot),
            self.check_queue(snapshot),
        ]
    }

    pub fn overall_status(&self, subsystems: &[SubsystemHealth]) -> HealthStatus {
        let mut worst = HealthStatus::Healthy;
        for s in subsystems {
            match s.status {
                HealthStatus::Unhealthy => return HealthStatus::Unhealthy,
                HealthStatus::Degraded => worst = HealthStatus::Degraded,
                HealthStatus::Healthy => {}
            }
        }
        worst
    }

    fn check_gossip(&self, snapshot: &HealthSnapshot) -> SubsystemHealth {
        let status = if snapshot.active_peer_count == 0 {
            HealthStatus::Unhealthy
        } else if snapshot.active_peer_count < snapshot.configured_fanout {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        SubsystemHealth {
            name: "gossip".to_string(),
            detail: format!("{} active peers (fanout {})", snapshot.active_peer_count, snapshot.configured_fanout),
            status,
        }
    }

    fn check_backend(&self, snapshot: &HealthSnapshot) -> SubsystemHealth {
        let status = if snapshot.backend_connected { HealthStatus::Healthy } else { HealthStatus::Unhealthy };
        SubsystemHealth {
            name: "backend".to_string(),
            detail: format!("connected={}", snapshot.backend_connected),
            status,
        }
    }

    fn check_rate_limiter(&self, snapshot: &HealthSnapshot) -> SubsystemHealth {
        let status = if snapshot.circuit_breaker_open_resources.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        SubsystemHealth {
            name: "rate_limiter".to_string(),
            detail: format!("open breakers: {:?}", snapshot.circuit_breaker_open_resources),
            status,
        }
    }

    fn check_queue(&self, snapshot: &HealthSnapshot) -> SubsystemHealth {
        let status = if snapshot.outbound_queue_soft_cap == 0 || snapshot.outbound_queue_depth < snapshot.outbound_queue_soft_cap {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        SubsystemHealth {
            name: "outbound_queue".to_string(),
            detail: format!("depth={} cap={}", snapshot.outbound_queue_depth, snapshot.outbound_queue_soft_cap),
            status,
        }
    }
}

/// Full JSON-serializable report, combining subsystem health with current
/// metric values — what `/config` and `/stats` style endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub subsystems: Vec<SubsystemHealth>,
}

impl HealthReport {
    pub fn build(checker: &HealthChecker, snapshot: &HealthSnapshot) -> Self {
        let subsystems = checker.check(snapshot);
        let overall_status = checker.overall_status(&subsystems);
        Self { overall_status, subsystems }
    }
}

pub fn metrics_snapshot(metrics: &MetricsCollector) -> serde_json::Value {
    metrics.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_active_peers_is_unhealthy() {
        let checker = HealthChecker::new();
        let snapshot = HealthSnapshot { active_peer_count: 0, configured_fanout: 3, ..Default::default() };
        let report = HealthReport::build(&checker, &snapshot);
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    }

    #[test]
    fn below_fanout_peer_count_is_degraded_not_unhealthy() {
        let checker = HealthChecker::new();
        let snapshot = HealthSnapshot {
            active_peer_count: 1,
            configured_fanout: 3,
            backend_connected: true,
            ..Default::default()
        };
        let report = HealthReport::build(&checker, &snapshot);
        assert_eq!(report.overall_status, HealthStatus::Degraded);
    }

    #[test]
    fn fully_healthy_snapshot_reports_healthy() {
        let checker = HealthChecker::new();
        let snapshot = HealthSnapshot {
            active_peer_count: 5,
            configured_fanout: 3,
            backend_connected: true,
            outbound_queue_soft_cap: 1000,
            outbound_queue_depth: 10,
            ..Default::default()
        };
        let report = HealthReport::build(&checker, &snapshot);
        assert_eq!(report.overall_status, HealthStatus::Healthy);
    }
}

//! # synapse-observability
//!
//! Structured logging (C10): correlation/trace-id log records over a
//! pluggable sink, a `Timer` helper, a `MetricsCollector` for gossip
//! fanout/convergence/queue-depth gauges, and a `HealthChecker` producing
//! an aggregate report across gossip, backend, and rate-limiter subsystems.

mod health;
mod log_record;
mod metrics;
mod timer;

pub use health::{metrics_snapshot, HealthChecker, HealthReport, HealthSnapshot, HealthStatus, SubsystemHealth};
pub use log_record::{FileSink, InMemorySink, Level, LogRecord, LogSink, StdoutSink};
pub use metrics::{ConsensusMetrics, GossipMetrics, MetricsCollector, QueueMetrics};
pub use timer::Timer;

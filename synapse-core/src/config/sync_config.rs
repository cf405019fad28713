//! Configuration for the sync coordinator (C9).

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tuning knobs for offline queueing, promotion, and retry backoff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Queue depth that triggers early promotion to the long-term backend. Default: 1000.
    pub max_queue_pre_promote: usize,
    /// How long an outbound event is retained once the backend confirms promotion. Default: 86400000 (24h).
    pub outbound_retention_ms: u64,
    /// Cap on exponential backoff delay for retryable errors. Default: 60000.
    pub max_retry_delay_ms: u64,
    /// Jitter fraction applied to backoff delays, in `[0, 1]`. Default: 0.10.
    pub retry_jitter_fraction: f64,
    /// Directory snapshots are written to on graceful shutdown / periodic interval.
    pub snapshot_dir: Option<String>,
    /// Milliseconds between periodic snapshots. Default: 300000 (5 min).
    pub snapshot_interval_ms: u64,
    /// If true, a corrupt snapshot is discarded and startup proceeds from
    /// scratch instead of aborting. Default: false.
    pub allow_recover_from_scratch: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_queue_pre_promote: constants::DEFAULT_MAX_QUEUE_PRE_PROMOTE,
            outbound_retention_ms: constants::DEFAULT_OUTBOUND_RETENTION_MS,
            max_retry_delay_ms: constants::DEFAULT_MAX_RETRY_DELAY_MS,
            retry_jitter_fraction: constants::DEFAULT_RETRY_JITTER_FRACTION,
            snapshot_dir: None,
            snapshot_interval_ms: 300_000,
            allow_recover_from_scratch: false,
        }
    }
}

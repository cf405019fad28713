//! Workspace-wide default constants.
//!
//! Mirrors the numeric defaults spec'd across §4–§7; each config struct in
//! [`crate::config`] seeds its `Default` impl from these so the numbers live
//! in exactly one place.

/// Default gossip fanout (peers contacted per round).
pub const DEFAULT_GOSSIP_FANOUT: usize = 3;

/// Default gossip round interval.
pub const DEFAULT_GOSSIP_INTERVAL_MS: u64 = 1_000;

/// Default anti-entropy interval.
pub const DEFAULT_ANTI_ENTROPY_INTERVAL_MS: u64 = 10_000;

/// Default message expiry: messages older than this are dropped on receipt.
pub const DEFAULT_MESSAGE_EXPIRY_MS: u64 = 60_000;

/// Default peer failure threshold before a peer is marked `failed`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default z-score threshold for flagging an aggregation outlier.
pub const DEFAULT_OUTLIER_Z_SCORE: f64 = 2.0;

/// Minimum sample count before outlier detection is meaningful.
pub const DEFAULT_OUTLIER_MIN_SAMPLES: usize = 10;

/// Default token-bucket requests-per-second.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;

/// Default token-bucket burst size.
pub const DEFAULT_BURST_SIZE: u32 = 20;

/// Default sliding-window size for the rate limiter's secondary window check.
pub const DEFAULT_WINDOW_SIZE_MS: u64 = 1_000;

/// Default sliding-window request limit.
pub const DEFAULT_WINDOW_LIMIT: u32 = 50;

/// Default circuit breaker failure threshold before tripping open.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default circuit breaker open-state timeout before a half-open probe.
pub const DEFAULT_BREAKER_TIMEOUT_MS: u64 = 30_000;

/// Default consecutive successes required to close from half-open.
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;

/// Default max concurrent half-open probes.
pub const DEFAULT_MAX_HALF_OPEN: u32 = 1;

/// Default retry backoff cap.
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Default retry jitter fraction (≤10%).
pub const DEFAULT_RETRY_JITTER_FRACTION: f64 = 0.10;

/// Default outbound event retention before a promoted event may be dropped.
pub const DEFAULT_OUTBOUND_RETENTION_MS: u64 = 86_400_000;

/// Default threshold to trigger early promotion of queued events.
pub const DEFAULT_MAX_QUEUE_PRE_PROMOTE: usize = 1_000;

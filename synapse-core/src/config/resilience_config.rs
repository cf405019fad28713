//! Configuration for the rate limiter / circuit breaker (C7).
//!
//! # Examples
//!
//! ```
//! use synapse_core::config::ResilienceConfig;
//!
//! let config = ResilienceConfig::default();
//! assert_eq!(config.failure_threshold, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tuning knobs for the per-resource token bucket and circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Steady-state admitted requests per second. Default: 10.0.
    pub requests_per_second: f64,
    /// Token-bucket burst capacity. Default: 20.
    pub burst_size: u32,
    /// Sliding-window size in milliseconds. Default: 1000.
    pub window_size_ms: u64,
    /// Max requests admitted per sliding window. Default: 50.
    pub window_limit: u32,
    /// Consecutive failures within the window before the breaker opens. Default: 5.
    pub failure_threshold: u32,
    /// Milliseconds the breaker stays open before a half-open probe. Default: 30000.
    pub breaker_timeout_ms: u64,
    /// Consecutive half-open successes required to close. Default: 2.
    pub success_threshold: u32,
    /// Concurrent probes allowed while half-open. Default: 1.
    pub max_half_open: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            requests_per_second: constants::DEFAULT_REQUESTS_PER_SECOND,
            burst_size: constants::DEFAULT_BURST_SIZE,
            window_size_ms: constants::DEFAULT_WINDOW_SIZE_MS,
            window_limit: constants::DEFAULT_WINDOW_LIMIT,
            failure_threshold: constants::DEFAULT_FAILURE_THRESHOLD,
            breaker_timeout_ms: constants::DEFAULT_BREAKER_TIMEOUT_MS,
            success_threshold: constants::DEFAULT_SUCCESS_THRESHOLD,
            max_half_open: constants::DEFAULT_MAX_HALF_OPEN,
        }
    }
}

//! Per-resource rate limiter + circuit breaker, the sole admission gate for
//! outbound gossip sends and long-term backend writes.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use synapse_core::config::ResilienceConfig;
use synapse_core::{SynapseError, SynapseResult};
use tracing::instrument;

use crate::breaker::{BreakerState, CircuitBreaker};
use crate::sliding_window::SlidingWindow;
use crate::token_bucket::TokenBucket;

/// Point-in-time stats for one resource, returned on denial and via the
/// sidecar's `/stats` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub resource: String,
    pub tokens_available: f64,
    pub window_count: u32,
    pub breaker_state: String,
}

struct ResourceState {
    bucket: TokenBucket,
    window: SlidingWindow,
    breaker: CircuitBreaker,
}

impl ResourceState {
    fn new(config: &ResilienceConfig) -> Self {
        Self {
            bucket: TokenBucket::new(config.burst_size, config.requests_per_second),
            window: SlidingWindow::new(config.window_limit, Duration::from_millis(config.window_size_ms)),
            breaker: CircuitBreaker::new(
                config.failure_threshold,
                Duration::from_millis(config.breaker_timeout_ms),
                config.success_threshold,
                config.max_half_open,
            ),
        }
    }

    fn stats(&mut self, resource: &str) -> ResourceStats {
        ResourceStats {
            resource: resource.to_string(),
            tokens_available: self.bucket.available(),
            window_count: self.window.count(),
            breaker_state: format!("{:?}", self.breaker.state()).to_lowercase(),
        }
    }
}

/// Guards every outbound send and long-term backend write behind a
/// per-resource token bucket, sliding window, and circuit breaker.
pub struct RateLimiter {
    config: ResilienceConfig,
    resources: Mutex<HashMap<String, ResourceState>>,
}

impl RateLimiter {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            resources: Mutex::new(HashMap::new()),
        }
    }

    /// The sole admission gate. `client_id` is carried through for
    /// diagnostics and the returned error's stats, not used as a separate
    /// bucket key — limiting is per-resource.
    #[instrument(skip(self))]
    pub fn check(&self, resource: &str, client_id: &str) -> SynapseResult<()> {
        let mut resources = self.resources.lock();
        let state = resources
            .entry(resource.to_string())
            .or_insert_with(|| ResourceState::new(&self.config));

        if !state.breaker.allow() {
            return Err(Self::denied(resource, client_id, state));
        }
        if !state.window.check_and_record(std::time::Instant::now()) {
            return Err(Self::denied(resource, client_id, state));
        }
        if !state.bucket.try_acquire() {
            return Err(Self::denied(resource, client_id, state));
        }
        Ok(())
    }

    fn denied(resource: &str, client_id: &str, state: &mut ResourceState) -> SynapseError {
        tracing::warn!(resource, client_id, "rate limit denied request");
        SynapseError::RateLimited {
            resource: resource.to_string(),
            retry_after: Duration::from_millis(
                (1000.0 / state.bucket.available().max(0.01)).min(60_000.0) as u64,
            ),
        }
    }

    /// Update the circuit breaker for `resource` with the outcome of a
    /// request previously admitted by [`check`](Self::check).
    #[instrument(skip(self))]
    pub fn record(&self, resource: &str, success: bool) {
        let mut resources = self.resources.lock();
        let state = resources
            .entry(resource.to_string())
            .or_insert_with(|| ResourceState::new(&self.config));
        state.breaker.record(success);
    }

    /// Current breaker state for `resource`, for health reporting.
    pub fn breaker_state(&self, resource: &str) -> Option<BreakerState> {
        self.resources.lock().get(resource).map(|s| s.breaker.state())
    }

    /// Point-in-time stats for `resource`.
    pub fn stats(&self, resource: &str) -> Option<ResourceStats> {
        self.resources.lock().get_mut(resource).map(|s| s.stats(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ResilienceConfig {
        ResilienceConfig {
            requests_per_second: 100.0,
            burst_size: 2,
            window_size_ms: 1000,
            window_limit: 100,
            failure_threshold: 3,
            breaker_timeout_ms: 1000,
            success_threshold: 1,
            max_half_open: 1,
        }
    }

    #[test]
    fn denies_once_bucket_is_exhausted() {
        let limiter = RateLimiter::new(test_config());
        assert!(limiter.check("gossip", "client-1").is_ok());
        assert!(limiter.check("gossip", "client-1").is_ok());
        assert!(limiter.check("gossip", "client-1").is_err());
    }

    #[test]
    fn breaker_opens_and_blocks_after_failures() {
        let limiter = RateLimiter::new(test_config());
        for _ in 0..3 {
            limiter.record("backend", false);
        }
        assert_eq!(limiter.breaker_state("backend"), Some(BreakerState::Open));
        assert!(limiter.check("backend", "client-1").is_err());
    }
}

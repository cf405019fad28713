//! Circuit breaker state machine (closed / open / half-open).

use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Which of the three states the breaker currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-resource circuit breaker, exactly per spec §4.7's table: `closed` on
/// `failure_count >= failure_threshold` within the window trips to `open`;
/// `open` allows one probe after `timeout` elapses; `half_open` closes after
/// `success_threshold` consecutive successes, or reopens on any failure.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: BreakerState,
    failure_count: u32,
    success_count: u32,
    half_open_in_flight: u32,
    opened_at: Option<Instant>,
    failure_threshold: u32,
    timeout: Duration,
    success_threshold: u32,
    max_half_open: u32,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout: Duration, success_threshold: u32, max_half_open: u32) -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            success_count: 0,
            half_open_in_flight: 0,
            opened_at: None,
            failure_threshold,
            timeout,
            success_threshold,
            max_half_open,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Whether a request may proceed right now. In `half_open`, admits up to
    /// `max_half_open` concurrent probes and reserves a slot for the caller.
    pub fn allow(&mut self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&mut self, now: Instant) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let elapsed = self.opened_at.map(|t| now.saturating_duration_since(t)).unwrap_or_default();
                if elapsed >= self.timeout {
                    debug!("circuit breaker transitioning open -> half_open after timeout");
                    self.state = BreakerState::HalfOpen;
                    self.success_count = 0;
                    self.half_open_in_flight = 0;
                    self.allow_at(now)
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                if self.half_open_in_flight < self.max_half_open {
                    self.half_open_in_flight += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Report the outcome of a request previously admitted by [`allow`](Self::allow).
    pub fn record(&mut self, success: bool) {
        self.record_at(success, Instant::now());
    }

    fn record_at(&mut self, success: bool, now: Instant) {
        match self.state {
            BreakerState::Closed => {
                if success {
                    self.failure_count = 0;
                } else {
                    self.failure_count += 1;
                    if self.failure_count >= self.failure_threshold {
                        warn!(failure_count = self.failure_count, "circuit breaker opening");
                        self.state = BreakerState::Open;
                        self.opened_at = Some(now);
                    }
                }
            }
            BreakerState::HalfOpen => {
                self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
                if success {
                    self.success_count += 1;
                    if self.success_count >= self.success_threshold {
                        debug!("circuit breaker closing after half-open successes");
                        self.state = BreakerState::Closed;
                        self.failure_count = 0;
                        self.success_count = 0;
                    }
                } else {
                    warn!("circuit breaker reopening after half-open failure");
                    self.state = BreakerState::Open;
                    self.opened_at = Some(now);
                    self.success_count = 0;
                }
            }
            BreakerState::Open => {
                // A record arriving while open (e.g. a stale in-flight probe) is ignored.
            }
        }
    }
}

//! # synapse-resilience
//!
//! Per-resource rate limiting and circuit breaking (C7) — the single
//! admission gate every outbound gossip send and long-term backend write
//! passes through.

mod breaker;
mod limiter;
mod sliding_window;
mod token_bucket;

pub use breaker::{BreakerState, CircuitBreaker};
pub use limiter::{RateLimiter, ResourceStats};
pub use sliding_window::SlidingWindow;
pub use token_bucket::TokenBucket;

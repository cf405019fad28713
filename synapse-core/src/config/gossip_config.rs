//! Configuration for the epidemic gossip engine (C5).
//!
//! # Examples
//!
//! ```
//! use synapse_core::config::GossipConfig;
//!
//! let config = GossipConfig::default();
//! assert_eq!(config.fanout, 3);
//! assert!(!config.cryptographic_selection);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tuning knobs for push/pull gossip rounds, anti-entropy, and peer selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GossipConfig {
    /// Peers contacted per gossip round. Default: 3.
    pub fanout: usize,
    /// Milliseconds between gossip rounds. Default: 1000.
    pub interval_ms: u64,
    /// Milliseconds between anti-entropy digest exchanges. Default: 10000.
    pub anti_entropy_interval_ms: u64,
    /// Age past which a received message is dropped unconditionally. Default: 60000.
    pub message_expiry_ms: u64,
    /// Failures before a peer is marked `failed`. Default: 3.
    pub max_retries: u32,
    /// Use a cryptographically secure RNG for peer selection instead of a
    /// seeded PRNG. Default: false (seeded, reproducible for tests/replay).
    pub cryptographic_selection: bool,
    /// Enable utilization-weighted roulette-wheel peer selection. Default: false.
    pub load_balanced_selection: bool,
    /// Load-factor boost applied to under-utilized peers' selection weight. Default: 1.0.
    pub load_factor: f64,
    /// Seed for the deterministic PRNG path (ignored when
    /// `cryptographic_selection` is true). Default: 0.
    pub prng_seed: u64,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            fanout: constants::DEFAULT_GOSSIP_FANOUT,
            interval_ms: constants::DEFAULT_GOSSIP_INTERVAL_MS,
            anti_entropy_interval_ms: constants::DEFAULT_ANTI_ENTROPY_INTERVAL_MS,
            message_expiry_ms: constants::DEFAULT_MESSAGE_EXPIRY_MS,
            max_retries: constants::DEFAULT_MAX_RETRIES,
            cryptographic_selection: false,
            load_balanced_selection: false,
            load_factor: 1.0,
            prng_seed: 0,
        }
    }
}

//! Per-subsystem configuration structs.
//!
//! Each config is `#[serde(default)]` so a partial JSON/TOML override (as
//! consumed from `RATE_LIMIT_DEFAULTS` and friends, see §6) only needs to
//! name the fields it changes.

mod consensus_config;
mod gossip_config;
mod resilience_config;
mod sync_config;

pub use consensus_config::ConsensusConfig;
pub use gossip_config::GossipConfig;
pub use resilience_config::ResilienceConfig;
pub use sync_config::SyncConfig;

use serde::{Deserialize, Serialize};

/// Aggregate configuration for the whole sync core, as loaded from
/// environment variables or a config file by an external adapter. The core
/// itself never reads the environment directly (that is an external-surface
/// concern per spec §1); [`SynapseConfig::from_recognized_env`] is the one
/// seam an adapter is expected to call through.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynapseConfig {
    pub gossip: GossipConfig,
    pub resilience: ResilienceConfig,
    pub sync: SyncConfig,
    pub consensus: ConsensusConfig,
}

/// Recognized environment variable names (§6). Anything outside this list
/// observed by an adapter should be warned about, not silently ignored.
pub const RECOGNIZED_ENV_VARS: &[&str] = &[
    "LOG_LEVEL",
    "OUTBOUND_RETENTION_MS",
    "GOSSIP_FANOUT",
    "GOSSIP_INTERVAL_MS",
    "ANTI_ENTROPY_INTERVAL_MS",
    "RATE_LIMIT_DEFAULTS",
];

impl SynapseConfig {
    /// Apply the recognized environment variables (§6) on top of the
    /// defaults. `RATE_LIMIT_DEFAULTS` is a JSON object merged into
    /// `resilience`; the rest are scalar overrides.
    ///
    /// Returns the names of any `SYNAPSE_`-prefixed variables observed that
    /// are not in [`RECOGNIZED_ENV_VARS`], for the caller to warn about.
    pub fn from_recognized_env<I, K, V>(vars: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        let mut unrecognized = Vec::new();

        for (key, value) in vars {
            let key = key.as_ref();
            let value = value.as_ref();
            match key {
                "OUTBOUND_RETENTION_MS" => {
                    if let Ok(v) = value.parse() {
                        config.sync.outbound_retention_ms = v;
                    }
                }
                "GOSSIP_FANOUT" => {
                    if let Ok(v) = value.parse() {
                        config.gossip.fanout = v;
                    }
                }
                "GOSSIP_INTERVAL_MS" => {
                    if let Ok(v) = value.parse() {
                        config.gossip.interval_ms = v;
                    }
                }
                "ANTI_ENTROPY_INTERVAL_MS" => {
                    if let Ok(v) = value.parse() {
                        config.gossip.anti_entropy_interval_ms = v;
                    }
                }
                "RATE_LIMIT_DEFAULTS" => {
                    if let Ok(partial) = serde_json::from_str::<serde_json::Value>(value) {
                        merge_resilience_overrides(&mut config.resilience, &partial);
                    }
                }
                "LOG_LEVEL" => {
                    // Consumed by the observability subsystem's subscriber setup,
                    // not by this config struct.
                }
                other if other.starts_with("SYNAPSE_") => {
                    unrecognized.push(other.to_string());
                }
                _ => {}
            }
        }

        (config, unrecognized)
    }
}

fn merge_resilience_overrides(target: &mut ResilienceConfig, overrides: &serde_json::Value) {
    let serde_json::Value::Object(map) = overrides else {
        return;
    };
    if let Some(v) = map.get("requests_per_second").and_then(|v| v.as_f64()) {
        target.requests_per_second = v;
    }
    if let Some(v) = map.get("burst_size").and_then(|v| v.as_u64()) {
        target.burst_size = v as u32;
    }
    if let Some(v) = map.get("window_size_ms").and_then(|v| v.as_u64()) {
        target.window_size_ms = v;
    }
    if let Some(v) = map.get("window_limit").and_then(|v| v.as_u64()) {
        target.window_limit = v as u32;
    }
    if let Some(v) = map.get("failure_threshold").and_then(|v| v.as_u64()) {
        target.failure_threshold = v as u32;
    }
    if let Some(v) = map.get("breaker_timeout_ms").and_then(|v| v.as_u64()) {
        target.breaker_timeout_ms = v;
    }
    if let Some(v) = map.get("success_threshold").and_then(|v| v.as_u64()) {
        target.success_threshold = v as u32;
    }
    if let Some(v) = map.get("max_half_open").and_then(|v| v.as_u64()) {
        target.max_half_open = v as u32;
    }
}

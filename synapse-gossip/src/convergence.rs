//! Estimates how many gossip rounds (and how much wall-clock time) a new
//! update needs to reach the whole cluster, for diagnostics and the
//! sidecar's `/stats` endpoint — not consulted on the hot path.

use synapse_core::config::GossipConfig;

/// Rounds until an update reaches at least `coverage_fraction` of
/// `peer_count` replicas, for a fanout-`fanout` push gossip process.
/// Classic epidemic-broadcast approximation: each round the
/// still-uninformed fraction shrinks by `(1 - fanout/peer_count)`.
pub fn rounds_to_reach(peer_count: usize, fanout: usize, coverage_fraction: f64) -> u32 {
    if peer_count == 0 || coverage_fraction <= 0.0 {
        return 0;
    }
    let coverage_fraction = coverage_fraction.min(0.999_999);
    let n = peer_count as f64;
    let f = fanout.min(peer_count) as f64;
    if f == 0.0 {
        return u32::MAX;
    }
    let shrink_per_round = 1.0 - (f / n);
    if shrink_per_round <= 0.0 {
        return 1;
    }
    let uninformed_target = 1.0 - coverage_fraction;
    // uninformed_target >= shrink_per_round^rounds  =>  rounds >= log(target)/log(shrink)
    let rounds = (uninformed_target.ln() / shrink_per_round.ln()).ceil();
    rounds.max(1.0) as u32
}

/// Wall-clock estimate for [`rounds_to_reach`], using `config.interval_ms`
/// as the per-round period.
pub fn estimate_propagation_time(peer_count: usize, config: &GossipConfig, coverage_fraction: f64) -> u64 {
    let rounds = rounds_to_reach(peer_count, config.fanout, coverage_fraction);
    (rounds as u64).saturating_mul(config.interval_ms)
}

//! Peer selection: seeded PRNG or cryptographic randomness, with an
//! optional utilization-weighted roulette wheel on top.

use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

use synapse_core::config::GossipConfig;

use crate::peer::PeerRecord;

/// Selects up to `fanout` peers for this round per `config`. Only `Active`
/// or `Suspect` peers are candidates; `Failed` peers are never selected.
pub fn select_peers<'a>(peers: &'a [PeerRecord], config: &GossipConfig) -> Vec<&'a PeerRecord> {
    let candidates: Vec<&PeerRecord> = peers.iter().filter(|p| p.is_active()).collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    if config.load_balanced_selection {
        weighted_select(&candidates, config)
    } else {
        shuffled_select(&candidates, config)
    }
}

fn shuffled_select<'a>(candidates: &[&'a PeerRecord], config: &GossipConfig) -> Vec<&'a PeerRecord> {
    let mut ordered: Vec<&PeerRecord> = candidates.to_vec();
    if config.cryptographic_selection {
        let mut rng = OsRng;
        ordered.shuffle(&mut rng);
    } else {
        let mut rng = StdRng::seed_from_u64(config.prng_seed);
        ordered.shuffle(&mut rng);
    }
    ordered.truncate(config.fanout);
    ordered
}

/// `weight(p) = max(0.01, 1 - utilization) * (1 + load_factor * (1 - utilization))`.
fn selection_weight(peer: &PeerRecord, load_factor: f64) -> f64 {
    let free = (1.0 - peer.utilization()).max(0.01);
    free * (1.0 + load_factor * (1.0 - peer.utilization()))
}

fn weighted_select<'a>(candidates: &[&'a PeerRecord], config: &GossipConfig) -> Vec<&'a PeerRecord> {
    let mut pool: Vec<&PeerRecord> = candidates.to_vec();
    let mut chosen = Vec::with_capacity(config.fanout.min(pool.len()));
    let mut rng = if config.cryptographic_selection {
        RngSource::Os(OsRng)
    } else {
        RngSource::Seeded(StdRng::seed_from_u64(config.prng_seed))
    };

    while !pool.is_empty() && chosen.len() < config.fanout {
        let weights: Vec<f64> = pool.iter().map(|p| selection_weight(p, config.load_factor)).collect();
        let total: f64 = weights.iter().sum();
        let mut roll = rng.next_f64() * total;
        let mut pick_index = weights.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                pick_index = i;
                break;
            }
            roll -= w;
        }
        chosen.push(pool.remove(pick_index));
    }
    chosen
}

enum RngSource {
    Seeded(StdRng),
    Os(OsRng),
}

impl RngSource {
    fn next_f64(&mut self) -> f64 {
        let raw = match self {
            RngSource::Seeded(rng) => rng.next_u64(),
            RngSource::Os(rng) => rng.next_u64(),
        };
        (raw as f64) / (u64::MAX as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, health: f64) -> PeerRecord {
        let mut p = PeerRecord::discovered(id, id, "addr", 0);
        p.health = health;
        p
    }

    #[test]
    fn seeded_selection_is_deterministic() {
        let peers = vec![peer("a", 1.0), peer("b", 1.0), peer("c", 1.0), peer("d", 1.0)];
        let config = GossipConfig { fanout: 2, prng_seed: 42, ..GossipConfig::default() };
        let first: Vec<String> = select_peers(&peers, &config).iter().map(|p| p.peer_id.clone()).collect();
        let second: Vec<String> = select_peers(&peers, &config).iter().map(|p| p.peer_id.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn failed_peers_are_never_selected() {
        let mut failed = peer("x", 1.0);
        failed.record_failure(1);
        let peers = vec![peer("a", 1.0), failed];
        let config = GossipConfig { fanout: 2, ..GossipConfig::default() };
        let selected = select_peers(&peers, &config);
        assert!(selected.iter().all(|p| p.peer_id != "x"));
    }

    #[test]
    fn load_balanced_selection_prefers_less_utilized_peers() {
        let peers = vec![peer("busy", 0.1), peer("idle", 1.0)];
        let config = GossipConfig {
            fanout: 1,
            load_balanced_selection: true,
            load_factor: 1.0,
            prng_seed: 7,
            ..GossipConfig::default()
        };
        let mut idle_wins = 0;
        for seed in 0..50 {
            let cfg = GossipConfig { prng_seed: seed, ..config.clone() };
            let selected = select_peers(&peers, &cfg);
            if selected.first().map(|p| p.peer_id.as_str()) == Some("idle") {
                idle_wins += 1;
            }
        }
        assert!(idle_wins > 25, "expected idle peer to win a majority of draws, got {idle_wins}/50");
    }
}

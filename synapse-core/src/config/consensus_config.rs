//! Configuration for the Byzantine aggregator (C6).

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tuning knobs for median/trimmed-mean/supermajority aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Fraction trimmed from each end by `trimmed_mean`. Default: 0.2.
    pub trim_fraction: f64,
    /// |z-score| above which an observation is reported as an outlier. Default: 2.0.
    pub outlier_z_score: f64,
    /// Minimum sample count before outlier detection runs. Default: 10.
    pub outlier_min_samples: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            trim_fraction: 0.2,
            outlier_z_score: constants::DEFAULT_OUTLIER_Z_SCORE,
            outlier_min_samples: constants::DEFAULT_OUTLIER_MIN_SAMPLES,
        }
    }
}

//! # synapse-consensus
//!
//! Byzantine-resistant aggregation over replicated scalar observations (C6):
//! median, trimmed mean, supermajority voting, and z-score outlier
//! reporting. None of these functions mutate their input or retry — the
//! sync coordinator decides what to do with the result.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One observation flagged as a statistical outlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub index: usize,
    pub value: f64,
    pub z_score: f64,
}

/// The exact median. For an even-length input, the lower of the two middle
/// values is returned (a stable tie-break, not an average, so the result is
/// always one of the actual observations).
///
/// Returns `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use synapse_consensus::median;
///
/// assert_eq!(median(&[1.0, 2.0, 3.0]), Some(2.0));
/// assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.0));
/// ```
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some(sorted[n / 2 - 1])
    }
}

/// Trim `floor(frac * n)` observations from each end after sorting, then
/// average what remains. `frac` is clamped to `[0, 0.5)`.
///
/// # Examples
///
/// ```
/// use synapse_consensus::trimmed_mean;
///
/// let values = [0.7, 0.72, 0.68, 0.71, 0.69, 0.70, 0.73, 0.67, 0.99, 0.01];
/// let mean = trimmed_mean(&values, 0.2).unwrap();
/// assert!(mean > 0.67 && mean < 0.73);
/// ```
pub fn trimmed_mean(values: &[f64], frac: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let frac = frac.clamp(0.0, 0.49);
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let trim = ((n as f64) * frac).floor() as usize;
    let kept = &sorted[trim..n - trim];
    if kept.is_empty() {
        return Some(sorted[n / 2]);
    }
    Some(kept.iter().sum::<f64>() / kept.len() as f64)
}

/// `Some(v)` iff at least `ceil(2n/3) + 1` observations are equal to `v`
/// under `equality_fn`; otherwise `None`. Candidates are drawn from the
/// input itself, so the winner (if any) is always one of the observations.
///
/// # Examples
///
/// ```
/// use synapse_consensus::supermajority;
///
/// let values = vec!["a", "a", "a", "a", "a", "a", "b"];
/// let winner = supermajority(&values, |a, b| a == b);
/// assert_eq!(winner, Some(&"a"));
/// ```
pub fn supermajority<T, F>(values: &[T], equality_fn: F) -> Option<&T>
where
    F: Fn(&T, &T) -> bool,
{
    let n = values.len();
    if n == 0 {
        return None;
    }
    let threshold = (2 * n).div_ceil(3) + 1;

    for candidate in values {
        let count = values.iter().filter(|v| equality_fn(candidate, v)).count();
        if count >= threshold {
            return Some(candidate);
        }
    }
    None
}

/// Flag observations whose |z-score| exceeds `z_threshold`, provided the
/// sample is large enough (`values.len() >= min_samples`) for a z-score to
/// be meaningful. Never silently drops anomalies — callers are expected to
/// forward the result to observability, not discard it.
pub fn detect_outliers(values: &[f64], z_threshold: f64, min_samples: usize) -> Vec<Outlier> {
    if values.len() < min_samples {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return Vec::new();
    }

    let outliers: Vec<Outlier> = values
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let z_score = (value - mean) / std_dev;
            if z_score.abs() > z_threshold {
                Some(Outlier { index, value, z_score })
            } else {
                None
            }
        })
        .collect();

    if !outliers.is_empty() {
        debug!(count = outliers.len(), "detected statistical outliers");
    }
    outliers
}

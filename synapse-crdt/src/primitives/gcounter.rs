//! Grow-only counter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use synapse_core::SynapseResult;

/// A counter that only ever increases, tracked per-replica so concurrent
/// increments never clobber each other.
///
/// # Examples
///
/// ```
/// use synapse_crdt::primitives::GCounter;
///
/// let mut a = GCounter::empty();
/// a.increment("replica-a", 3).unwrap();
/// let mut b = GCounter::empty();
/// b.increment("replica-b", 2).unwrap();
/// a.merge(&b);
/// assert_eq!(a.value(), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GCounter {
    counts: BTreeMap<String, u64>,
}

impl GCounter {
    /// A counter with no contributions yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add `amount` to `replica_id`'s contribution.
    pub fn increment(&mut self, replica_id: &str, amount: u64) -> SynapseResult<()> {
        let entry = self.counts.entry(replica_id.to_string()).or_insert(0);
        *entry = entry.checked_add(amount).ok_or_else(|| {
            synapse_core::SynapseError::OverflowError(format!("gcounter entry {replica_id} overflowed"))
        })?;
        Ok(())
    }

    /// The total across all replicas.
    pub fn value(&self) -> u64 {
        self.counts.values().sum()
    }

    /// One replica's contribution.
    pub fn replica_value(&self, replica_id: &str) -> u64 {
        self.counts.get(replica_id).copied().unwrap_or(0)
    }

    /// Merge `other` into `self` in place: per-replica max.
    pub fn merge(&mut self, other: &Self) {
        for (replica_id, &count) in &other.counts {
            let slot = self.counts.entry(replica_id.clone()).or_insert(0);
            if count > *slot {
                *slot = count;
            }
        }
    }

    /// Pure merge, returning a new value without mutating either input.
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.merge(other);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_commutative() {
        let mut a = GCounter::empty();
        a.increment("a", 4).unwrap();
        let mut b = GCounter::empty();
        b.increment("b", 7).unwrap();

        assert_eq!(a.merged(&b), b.merged(&a));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut a = GCounter::empty();
        a.increment("a", 4).unwrap();
        let once = a.merged(&a);
        assert_eq!(once, a);
    }

    #[test]
    fn overflow_is_rejected() {
        let mut a = GCounter::empty();
        a.increment("a", u64::MAX).unwrap();
        assert!(a.increment("a", 1).is_err());
    }
}

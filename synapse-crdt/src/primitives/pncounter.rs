//! Increment/decrement counter built from two grow-only counters.

use serde::{Deserialize, Serialize};
use synapse_core::SynapseResult;

use super::gcounter::GCounter;

/// A counter that can go up or down, implemented as a pair of
/// [`GCounter`]s — one for increments, one for decrements — so the
/// underlying per-replica max-merge stays conflict-free.
///
/// # Examples
///
/// ```
/// use synapse_crdt::primitives::PnCounter;
///
/// let mut a = PnCounter::empty();
/// a.increment("replica-a", 10).unwrap();
/// a.decrement("replica-a", 3).unwrap();
/// assert_eq!(a.value(), 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnCounter {
    increments: GCounter,
    decrements: GCounter,
}

impl PnCounter {
    /// A counter at zero.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Increase `replica_id`'s positive contribution.
    pub fn increment(&mut self, replica_id: &str, amount: u64) -> SynapseResult<()> {
        self.increments.increment(replica_id, amount)
    }

    /// Increase `replica_id`'s negative contribution.
    pub fn decrement(&mut self, replica_id: &str, amount: u64) -> SynapseResult<()> {
        self.decrements.increment(replica_id, amount)
    }

    /// Current value: total increments minus total decrements.
    pub fn value(&self) -> i64 {
        self.increments.value() as i64 - self.decrements.value() as i64
    }

    /// Merge `other` into `self` in place.
    pub fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
    }

    /// Pure merge, returning a new value.
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
    fn value_reflects_net_of_inc_and_dec() {
        let mut a = PnCounter::empty();
        a.increment("a", 10).unwrap();
        a.decrement("a", 4).unwrap();
        assert_eq!(a.value(), 6);
    }

    #[test]
    fn merge_combines_independent_replicas() {
        let mut a = PnCounter::empty();
        a.increment("a", 5).unwrap();
        let mut b = PnCounter::empty();
        b.decrement("b", 2).unwrap();

        let merged = a.merged(&b);
        assert_eq!(merged.value(), 3);
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = PnCounter::empty();
        a.increment("a", 5).unwrap();
        let mut b = PnCounter::empty();
        b.decrement("b", 2).unwrap();
        assert_eq!(a.merged(&b), b.merged(&a));
    }
}

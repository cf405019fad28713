//! Vector clocks and causal ordering (C1).
//!
//! A [`VectorClock`] tracks one monotonic counter per replica. Comparing two
//! clocks establishes happens-before, happens-after, equal, or concurrent —
//! the foundation every CRDT merge and the causal-delivery buffer in
//! `synapse-sync` builds on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use synapse_core::{SynapseError, SynapseResult};

/// Result of comparing two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// `self` happened strictly before `other`.
    Before,
    /// `self` happened strictly after `other`.
    After,
    /// Identical on every entry.
    Equal,
    /// Neither dominates — a genuine conflict.
    Concurrent,
}

/// A vector clock keyed by replica id. Uses a `BTreeMap` rather than a
/// `HashMap` so iteration order is deterministic, which canonical
/// serialization (`synapse-crypto`) depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    entries: BTreeMap<String, u64>,
}

impl VectorClock {
    /// The clock with every entry implicitly zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A clock with a single replica at count 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use synapse_crdt::clock::VectorClock;
    ///
    /// let clock = VectorClock::singleton("replica-a");
    /// assert_eq!(clock.get("replica-a"), 1);
    /// assert_eq!(clock.get("replica-b"), 0);
    /// ```
    pub fn singleton(replica_id: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(replica_id.into(), 1);
        Self { entries }
    }

    /// The counter for `replica_id`, or 0 if unseen.
    pub fn get(&self, replica_id: &str) -> u64 {
        self.entries.get(replica_id).copied().unwrap_or(0)
    }

    /// Bump `replica_id`'s own counter by one. Returns `OverflowError` at
    /// `u64::MAX` rather than wrapping, since a wrapped counter would make a
    /// genuinely newer write compare as older.
    pub fn increment(&mut self, replica_id: &str) -> SynapseResult<()> {
        let entry = self.entries.entry(replica_id.to_string()).or_insert(0);
        *entry = entry
            .checked_add(1)
            .ok_or_else(|| SynapseError::OverflowError(format!("vector clock entry {replica_id} overflowed")))?;
        Ok(())
    }

    /// Pointwise max merge — the only valid way to combine two clocks.
    pub fn merge(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (replica_id, count) in &other.entries {
            let slot = entries.entry(replica_id.clone()).or_insert(0);
            if *count > *slot {
                *slot = *count;
            }
        }
        Self { entries }
    }

    /// Compare two clocks for causal ordering.
    pub fn compare(&self, other: &Self) -> Ordering {
        let mut self_ahead = false;
        let mut other_ahead = false;

        for replica_id in self.agents().chain(other.agents()).collect::<std::collections::BTreeSet<_>>() {
            let a = self.get(replica_id);
            let b = other.get(replica_id);
            match a.cmp(&b) {
                std::cmp::Ordering::Greater => self_ahead = true,
                std::cmp::Ordering::Less => other_ahead = true,
                std::cmp::Ordering::Equal => {}
            }
        }

        match (self_ahead, other_ahead) {
            (false, false) => Ordering::Equal,
            (true, false) => Ordering::After,
            (false, true) => Ordering::Before,
            (true, true) => Ordering::Concurrent,
        }
    }

    /// `true` if `self` causally dominates (is equal to or after) `other`.
    pub fn dominates(&self, other: &Self) -> bool {
        matches!(self.compare(other), Ordering::After | Ordering::Equal)
    }

    /// Sum of all per-replica counters, used as a cheap monotonic progress
    /// metric by the convergence estimator.
    pub fn sum(&self) -> u64 {
        self.entries.values().sum()
    }

    /// Replica ids this clock has an entry for, in sorted order.
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_then_increment() {
        let mut clock = VectorClock::singleton("a");
        clock.increment("a").unwrap();
        assert_eq!(clock.get("a"), 2);
    }

    #[test]
    fn disjoint_clocks_are_concurrent() {
        let a = VectorClock::singleton("a");
        let b = VectorClock::singleton("b");
        assert_eq!(a.compare(&b), Ordering::Concurrent);
    }

    #[test]
    fn merge_dominates_both_inputs() {
        let mut a = VectorClock::singleton("a");
        let mut b = VectorClock::singleton("b");
        a.increment("a").unwrap();
        b.increment("b").unwrap();
        let merged = a.merge(&b);
        assert!(merged.dominates(&a));
        assert!(merged.dominates(&b));
    }

    #[test]
    fn equal_clocks_compare_equal() {
        let a = VectorClock::singleton("a");
        let b = VectorClock::singleton("a");
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert!(a.dominates(&b));
    }

    #[test]
    fn overflow_is_reported() {
        let mut clock = VectorClock::zero();
        clock.entries.insert("a".to_string(), u64::MAX);
        assert!(clock.increment("a").is_err());
    }

    #[test]
    fn strictly_ahead_on_one_entry_is_after() {
        let mut a = VectorClock::singleton("a");
        let b = a.clone();
        a.increment("a").unwrap();
        assert_eq!(a.compare(&b), Ordering::After);
        assert_eq!(b.compare(&a), Ordering::Before);
    }
}

//! Observed-remove set (add-wins OR-Set).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A globally-unique tag identifying one add operation: the replica that
/// performed it, plus a per-replica monotonic counter.
pub type Tag = (String, u64);

/// A set with add-wins semantics under concurrent add/remove: removing an
/// element only tombstones the tags observed at remove time, so a
/// concurrent add (a fresh tag) survives.
///
/// # Examples
///
/// ```
/// use synapse_crdt::primitives::OrSet;
///
/// let mut s = OrSet::empty();
/// s.add("x".to_string(), "replica-a");
/// assert!(s.contains(&"x".to_string()));
/// s.remove(&"x".to_string());
/// assert!(!s.contains(&"x".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrSet<T: Clone + PartialEq> {
    elements: BTreeMap<Tag, T>,
    tombstones: BTreeSet<Tag>,
    clock: BTreeMap<String, u64>,
}

impl<T: Clone + PartialEq> OrSet<T> {
    /// The empty set.
    pub fn empty() -> Self {
        Self {
            elements: BTreeMap::new(),
            tombstones: BTreeSet::new(),
            clock: BTreeMap::new(),
        }
    }

    /// Add `value`, tagged with a fresh, replica-unique counter.
    pub fn add(&mut self, value: T, replica_id: &str) {
        let counter = self.clock.entry(replica_id.to_string()).or_insert(0);
        *counter += 1;
        let tag = (replica_id.to_string(), *counter);
        self.elements.insert(tag, value);
    }

    /// Tombstone every tag currently observed for `value`. A concurrent add
    /// from another replica (a tag not yet observed here) is unaffected.
    pub fn remove(&mut self, value: &T) {
        for (tag, v) in &self.elements {
            if v == value {
                self.tombstones.insert(tag.clone());
            }
        }
    }

    /// `true` if any live (non-tombstoned) tag maps to `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.elements
            .iter()
            .any(|(tag, v)| v == value && !self.tombstones.contains(tag))
    }

    /// Current live members, deduplicated by value equality.
    pub fn value(&self) -> Vec<&T> {
        let mut out: Vec<&T> = Vec::new();
        for (tag, v) in &self.elements {
            if self.tombstones.contains(tag) {
                continue;
            }
            if !out.iter().any(|existing| *existing == v) {
                out.push(v);
            }
        }
        out
    }

    /// Merge `other` into `self` in place: union elements, union
    /// tombstones, per-replica max clock.
    pub fn merge(&mut self, other: &Self) {
        for (tag, value) in &other.elements {
            self.elements.entry(tag.clone()).or_insert_with(|| value.clone());
        }
        for tag in &other.tombstones {
            self.tombstones.insert(tag.clone());
        }
        for (replica_id, &count) in &other.clock {
            let slot = self.clock.entry(replica_id.clone()).or_insert(0);
            if count > *slot {
                *slot = count;
            }
        }
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
    fn concurrent_add_survives_remove() {
        let mut a = OrSet::empty();
        a.add("x".to_string(), "replica-a");

        let mut b = a.clone();
        // b observes a's add, then re-adds concurrently with a fresh tag.
        b.add("x".to_string(), "replica-b");

        a.remove(&"x".to_string());

        let merged = a.merged(&b);
        assert!(merged.contains(&"x".to_string()));
    }

    #[test]
    fn remove_without_concurrent_add_clears() {
        let mut a = OrSet::empty();
        a.add("x".to_string(), "replica-a");
        a.remove(&"x".to_string());
        assert!(!a.contains(&"x".to_string()));
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = OrSet::empty();
        a.add("x".to_string(), "replica-a");
        let mut b = OrSet::empty();
        b.add("y".to_string(), "replica-b");

        assert_eq!(a.merged(&b), b.merged(&a));
    }
}

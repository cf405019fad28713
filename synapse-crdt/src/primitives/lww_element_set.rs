//! Last-writer-wins element set: per-element add/remove timestamps, with
//! add-wins bias on exact ties.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A set where membership is decided per-element by comparing its latest
/// add timestamp against its latest remove timestamp. On an exact tie, the
/// element is considered present (add-wins), matching the bias spec.md
/// calls out for this primitive.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use synapse_crdt::primitives::LwwElementSet;
///
/// let mut s = LwwElementSet::empty();
/// s.add("x".to_string(), Utc::now());
/// assert!(s.contains(&"x".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwElementSet<T: Ord + Clone> {
    adds: BTreeMap<T, DateTime<Utc>>,
    removes: BTreeMap<T, DateTime<Utc>>,
}

impl<T: Ord + Clone> LwwElementSet<T> {
    /// The empty set.
    pub fn empty() -> Self {
        Self {
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }

    /// Record an add for `value` at `timestamp`, keeping only the latest.
    pub fn add(&mut self, value: T, timestamp: DateTime<Utc>) {
        let entry = self.adds.entry(value).or_insert(timestamp);
        if timestamp > *entry {
            *entry = timestamp;
        }
    }

    /// Record a remove for `value` at `timestamp`, keeping only the latest.
    pub fn remove(&mut self, value: T, timestamp: DateTime<Utc>) {
        let entry = self.removes.entry(value).or_insert(timestamp);
        if timestamp > *entry {
            *entry = timestamp;
        }
    }

    /// `true` if `value`'s latest add is at or after its latest remove.
    pub fn contains(&self, value: &T) -> bool {
        match (self.adds.get(value), self.removes.get(value)) {
            (Some(added), Some(removed)) => added >= removed,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Current live members, in sorted order.
    pub fn value(&self) -> Vec<&T> {
        self.adds.keys().filter(|v| self.contains(v)).collect()
    }

    /// Merge `other` into `self` in place: per-element max timestamp in
    /// each of the add/remove maps.
    pub fn merge(&mut self, other: &Self) {
        for (value, &timestamp) in &other.adds {
            let entry = self.adds.entry(value.clone()).or_insert(timestamp);
            if timestamp > *entry {
                *entry = timestamp;
            }
        }
        for (value, &timestamp) in &other.removes {
            let entry = self.removes.entry(value.clone()).or_insert(timestamp);
            if timestamp > *entry {
                *entry = timestamp;
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

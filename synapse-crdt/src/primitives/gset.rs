//! Grow-only set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set that only ever gains elements. Merge is union.
///
/// # Examples
///
/// ```
/// use synapse_crdt::primitives::GSet;
///
/// let mut a = GSet::empty();
/// a.add("x".to_string());
/// let mut b = GSet::empty();
/// b.add("y".to_string());
/// a.merge(&b);
/// assert!(a.contains(&"x".to_string()) && a.contains(&"y".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GSet<T: Ord + Clone> {
    elements: BTreeSet<T>,
}

impl<T: Ord + Clone> GSet<T> {
    /// The empty set.
    pub fn empty() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    /// Add an element. No-op if already present.
    pub fn add(&mut self, value: T) {
        self.elements.insert(value);
    }

    /// `true` if `value` is a member.
    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    /// All members, in sorted order.
    pub fn value(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// `true` if no members.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Merge `other` into `self` in place: union.
    pub fn merge(&mut self, other: &Self) {
        for value in &other.elements {
            self.elements.insert(value.clone());
        }
    }

    /// Pure merge, returning a new value.
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.merge(other);
        out
    }
}

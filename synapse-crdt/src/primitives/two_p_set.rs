//! Two-phase set: add-then-remove, remove wins forever.

use serde::{Deserialize, Serialize};

use super::gset::GSet;

/// A set where an element, once removed, can never be re-added. Built from
/// two [`GSet`]s: membership is "added but not tombstoned".
///
/// # Examples
///
/// ```
/// use synapse_crdt::primitives::TwoPSet;
///
/// let mut s = TwoPSet::empty();
/// s.add("x".to_string());
/// s.remove("x".to_string());
/// s.add("x".to_string()); // no effect — remove wins
/// assert!(!s.contains(&"x".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoPSet<T: Ord + Clone> {
    added: GSet<T>,
    removed: GSet<T>,
}

impl<T: Ord + Clone> TwoPSet<T> {
    /// The empty set.
    pub fn empty() -> Self {
        Self {
            added: GSet::empty(),
            removed: GSet::empty(),
        }
    }

    /// Add `value`. Has no effect if `value` was already removed.
    pub fn add(&mut self, value: T) {
        self.added.add(value);
    }

    /// Tombstone `value`, permanently.
    pub fn remove(&mut self, value: T) {
        self.removed.add(value);
    }

    /// `true` if `value` has been added and not removed.
    pub fn contains(&self, value: &T) -> bool {
        self.added.contains(value) && !self.removed.contains(value)
    }

    /// Current live members.
    pub fn value(&self) -> Vec<&T> {
        self.added.value().filter(|v| !self.removed.contains(v)).collect()
    }

    /// Merge `other` into `self` in place.
    pub fn merge(&mut self, other: &Self) {
        self.added.merge(&other.added);
        self.removed.merge(&other.removed);
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
    fn remove_wins_over_later_add() {
        let mut a = TwoPSet::empty();
        a.add("x");
        a.remove("x");
        a.add("x");
        assert!(!a.contains(&"x"));
    }

    #[test]
    fn merge_unions_tombstones() {
        let mut a = TwoPSet::empty();
        a.add("x");
        let mut b = TwoPSet::empty();
        b.add("x");
        b.remove("x");

        let merged = a.merged(&b);
        assert!(!merged.contains(&"x"));
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = TwoPSet::empty();
        a.add("x");
        let mut b = TwoPSet::empty();
        b.add("y");
        assert_eq!(a.merged(&b), b.merged(&a));
    }
}

//! Last-writer-wins register.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single value with last-writer-wins conflict resolution. Ties on
/// timestamp are broken by comparing `replica_id` lexicographically — the
/// higher id wins, so the tie-break is itself deterministic across replicas.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use synapse_crdt::primitives::LwwRegister;
///
/// let mut reg = LwwRegister::new("v1".to_string(), Utc::now(), "replica-a".to_string());
/// reg.set("v2".to_string(), Utc::now(), "replica-a".to_string());
/// assert_eq!(reg.get(), &"v2".to_string());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LwwRegister<T> {
    value: T,
    timestamp: DateTime<Utc>,
    replica_id: String,
}

impl<T: Clone> LwwRegister<T> {
    /// Construct a register with an initial value.
    pub fn new(value: T, timestamp: DateTime<Utc>, replica_id: String) -> Self {
        Self {
            value,
            timestamp,
            replica_id,
        }
    }

    /// Overwrite unconditionally — callers are expected to only call this
    /// for genuinely new local writes, not as a merge path.
    pub fn set(&mut self, value: T, timestamp: DateTime<Utc>, replica_id: String) {
        self.value = value;
        self.timestamp = timestamp;
        self.replica_id = replica_id;
    }

    /// The current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// The timestamp of the current value.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The replica that wrote the current value.
    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    /// Merge `other` into `self` in place, keeping whichever write is later
    /// (or, on a timestamp tie, whichever replica id sorts higher).
    pub fn merge(&mut self, other: &Self)
    where
        T: Clone,
    {
        if Self::wins(&other.timestamp, &other.replica_id, &self.timestamp, &self.replica_id) {
            self.value = other.value.clone();
            self.timestamp = other.timestamp;
            self.replica_id = other.replica_id.clone();
        }
    }

    /// Pure merge, returning a new value.
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    fn wins(
        candidate_ts: &DateTime<Utc>,
        candidate_replica: &str,
        incumbent_ts: &DateTime<Utc>,
        incumbent_replica: &str,
    ) -> bool {
        match candidate_ts.cmp(incumbent_ts) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => candidate_replica > incumbent_replica,
        }
    }
}

impl<T: PartialEq> PartialEq for LwwRegister<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.timestamp == other.timestamp && self.replica_id == other.replica_id
    }
}

impl<T: Eq> Eq for LwwRegister<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn later_timestamp_wins() {
        let t0 = Utc::now();
        let mut a = LwwRegister::new("old".to_string(), t0, "r1".to_string());
        let b = LwwRegister::new("new".to_string(), t0 + Duration::seconds(1), "r2".to_string());
        a.merge(&b);
        assert_eq!(a.get(), "new");
    }

    #[test]
    fn tie_breaks_on_replica_id() {
        let t0 = Utc::now();
        let mut a = LwwRegister::new("from-a".to_string(), t0, "replica-a".to_string());
        let b = LwwRegister::new("from-b".to_string(), t0, "replica-b".to_string());
        a.merge(&b);
        assert_eq!(a.get(), "from-b");
    }

    #[test]
    fn merge_is_idempotent() {
        let t0 = Utc::now();
        let a = LwwRegister::new("x".to_string(), t0, "r1".to_string());
        assert_eq!(a.merged(&a), a);
    }
}

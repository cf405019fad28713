//! Anti-entropy: a cheap Merkle-style digest over the local record id set,
//! compared against a peer's digest to find what's missing without shipping
//! full state on every round.

use std::collections::BTreeSet;

use synapse_crypto::sha384;

/// A digest summarizing a sorted set of record ids, cheap enough to send on
/// every anti-entropy round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleDigest {
    root: [u8; 48],
    leaf_count: usize,
}

impl MerkleDigest {
    /// Builds the digest by hashing the sorted, newline-joined id list.
    /// Sorting first makes the digest order-independent, so two replicas
    /// holding the same id set always agree on the digest.
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let sorted: BTreeSet<&str> = ids.into_iter().collect();
        let joined = sorted.iter().copied().collect::<Vec<_>>().join("\n");
        Self {
            root: sha384(joined.as_bytes()),
            leaf_count: sorted.len(),
        }
    }

    pub fn matches(&self, other: &MerkleDigest) -> bool {
        self == other
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }
}

/// Given the full local id set and the full remote id set, the ids the
/// local replica is missing and the ids the remote replica is missing.
/// Exchanging digests only tells the two sides they differ; a subsequent
/// round ships the actual id lists to compute this.
pub fn missing_ids<'a>(local_ids: &BTreeSet<&'a str>, remote_ids: &BTreeSet<&'a str>) -> (Vec<&'a str>, Vec<&'a str>) {
    let local_missing: Vec<&str> = remote_ids.difference(local_ids).copied().collect();
    let remote_missing: Vec<&str> = local_ids.difference(remote_ids).copied().collect();
    (local_missing, remote_missing)
}

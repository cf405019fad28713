//! Content-addressed hashing and fingerprinting.

use serde::Serialize;
use sha2::{Digest, Sha384};

use crate::canonical::canonical_serialize;
use crate::error::CryptoError;

/// SHA-384 digest of `bytes`.
pub fn sha384(bytes: &[u8]) -> [u8; 48] {
    let mut hasher = Sha384::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// BLAKE3 digest of `bytes`.
pub fn blake3(bytes: &[u8]) -> [u8; 32] {
    *blake3::hash(bytes).as_bytes()
}

/// The agent fingerprint: `hex(sha384("{agent_id}:{name}:{created_at}"))`
/// over the fixed `(agent_id, name, created_at)` triple. A full-object
/// fingerprint is an unspecified extension, deliberately not implemented.
///
/// # Examples
///
/// ```
/// use synapse_crypto::fingerprint;
///
/// let fp = fingerprint("agent-1", "scout", "2024-01-01T00:00:00Z");
/// assert_eq!(fp.len(), 96); // 48-byte SHA-384 digest, hex-encoded
/// ```
pub fn fingerprint(agent_id: &str, name: &str, created_at: &str) -> String {
    let input = format!("{agent_id}:{name}:{created_at}");
    hex::encode(sha384(input.as_bytes()))
}

/// `blake3(canonical_serialize(state))`, the content hash used for
/// anti-entropy digests and integrity checks.
pub fn state_hash<T: Serialize>(state: &T) -> Result<[u8; 32], CryptoError> {
    let bytes = canonical_serialize(state)?;
    Ok(blake3(&bytes))
}

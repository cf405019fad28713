//! # synapse-crypto
//!
//! Content-addressed hashing, canonical serialization, and Ed25519 signing
//! for the Synapse sync core (C4). Nothing here depends on any other crate
//! in the workspace knowing about agent state — it operates purely on bytes
//! and serializable values.

mod canonical;
mod error;
mod hashing;
mod signing;

pub use canonical::canonical_serialize;
pub use error::CryptoError;
pub use hashing::{blake3, fingerprint, sha384, state_hash};
pub use signing::{KeyPair, Signature, SigningKey, VerifyingKey};

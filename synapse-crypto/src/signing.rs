//! Ed25519 signing and verification.

use ed25519_dalek::{
    Signature as DalekSignature, Signer as _, SigningKey as DalekSigningKey, Verifier as _,
    VerifyingKey as DalekVerifyingKey,
};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Ed25519 secret signing key. Never logged, never `Debug`-formatted.
pub struct SigningKey(DalekSigningKey);

/// Ed25519 public verifying key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyingKey(DalekVerifyingKey);

/// An Ed25519 signature.
#[derive(Debug, Clone, Copy)]
pub struct Signature(DalekSignature);

/// A generated signing/verifying keypair.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair from the OS RNG.
    pub fn generate() -> Self {
        let signing = DalekSigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        Self {
            signing_key: SigningKey(signing),
            verifying_key: VerifyingKey(verifying),
        }
    }
}

impl SigningKey {
    /// Build a signing key from a raw 32-byte secret.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(DalekSigningKey::from_bytes(bytes))
    }

    /// The raw 32-byte secret. Callers must never log this.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Sign `message`.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }

    /// The verifying key matching this signing key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }
}

impl VerifyingKey {
    /// Build a verifying key from a raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        DalekVerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))
    }

    /// The raw 32-byte public key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Verify `signature` over `message`. Never panics on mismatch — returns
    /// `false`, per the contract that verification only ever reports a
    /// boolean outcome, never throws.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.0.verify(message, &signature.0).is_ok()
    }
}

impl Signature {
    /// Build a signature from a raw 64-byte value.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(DalekSignature::from_bytes(bytes))
    }

    /// The raw 64-byte signature.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"hello world");
        assert!(kp.verifying_key.verify(b"hello world", &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"correct");
        assert!(!kp.verifying_key.verify(b"wrong", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.signing_key.sign(b"message");
        assert!(!kp2.verifying_key.verify(b"message", &sig));
    }

    #[test]
    fn key_bytes_roundtrip() {
        let kp = KeyPair::generate();
        let bytes = kp.signing_key.to_bytes();
        let restored = SigningKey::from_bytes(&bytes);
        assert_eq!(restored.verifying_key().to_bytes(), kp.verifying_key.to_bytes());
    }

    #[test]
    fn malformed_verifying_key_is_rejected() {
        // All-0xFF is not a valid compressed Edwards point.
        let bytes = [0xFFu8; 32];
        assert!(VerifyingKey::from_bytes(&bytes).is_err());
    }
}

//! Signature primitives.
//!
//! Thin wrappers over ed25519: the consensus core only needs opaque
//! sign/verify with fixed-size keys and signatures.

use crate::Address;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

/// An ed25519 signature over a record's canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    /// Signs `bytes` with the given key.
    pub fn sign(key: &SigningKey, bytes: &[u8]) -> Self {
        use ed25519_dalek::Signer;
        Self(key.sign(bytes))
    }

    /// Verifies this signature over `bytes` against the signer's address.
    ///
    /// Returns `false` for malformed addresses as well as mismatched
    /// signatures; callers only care that the claimed signer did not produce
    /// the bytes.
    pub fn verify(&self, signer: &Address, bytes: &[u8]) -> bool {
        signer
            .verifying_key()
            .is_some_and(|key| key.verify_strict(bytes, &self.0).is_ok())
    }

    /// The all-zero placeholder signature.
    ///
    /// Carried by genesis blocks, which are anchored by their content id and
    /// exempt from signature checks.
    pub fn placeholder() -> Self {
        Self(ed25519_dalek::Signature::from_bytes(&[0; 64]))
    }
}

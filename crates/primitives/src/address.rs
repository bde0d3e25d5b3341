//! Account addresses.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address.
///
/// An address *is* an ed25519 verifying key, so signature verification never
/// needs a separate key-lookup or recovery step. The derived byte-wise [`Ord`]
/// is the deterministic tie-break ordering used wherever two addresses compete
/// (e.g. block-building selection), so it must stay a plain lexicographic
/// comparison.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address([u8; 32]);

impl Address {
    /// Wraps raw verifying-key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Recovers the verifying key this address wraps.
    ///
    /// Fails for byte strings that are not a valid curve point, i.e. addresses
    /// that cannot have signed anything.
    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0).ok()
    }
}

impl From<&SigningKey> for Address {
    fn from(key: &SigningKey) -> Self {
        Self(key.verifying_key().to_bytes())
    }
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &hex::encode(self.0)[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_bytewise() {
        let a = Address::from_bytes([1; 32]);
        let b = Address::from_bytes([2; 32]);
        assert!(a < b);

        let mut lo = [0u8; 32];
        lo[31] = 1;
        // A difference in the last byte loses to one in the first byte.
        assert!(Address::from_bytes(lo) < Address::from_bytes([1; 32]));
    }
}

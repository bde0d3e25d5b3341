//! Content addressing over canonical encodings.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A content identifier: the SHA-256 digest of a record's canonical encoding.
///
/// Records are compared and deduplicated by `ContentId` only, never by field
/// comparison.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Wraps a raw 32-byte digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Abbreviated like a git object id; the full digest is only
        // interesting to machines.
        write!(f, "{}", &hex::encode(self.0)[..12])
    }
}

/// Returns the canonical encoding of a value.
///
/// Canonical means: the same logical value always produces the same bytes, so
/// hashes and signatures over the encoding are stable under re-serialization.
/// Encoding plain in-memory data cannot fail, which is why this is infallible.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).expect("canonical types are always serializable")
}

/// Computes the [`ContentId`] of a value's canonical encoding.
pub fn content_id<T: Serialize>(value: &T) -> ContentId {
    ContentId(Sha256::digest(canonical_bytes(value)).into())
}

/// Computes the [`ContentId`] of an already-encoded record.
pub fn content_id_of_bytes(bytes: &[u8]) -> ContentId {
    ContentId(Sha256::digest(bytes).into())
}

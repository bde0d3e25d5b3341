//! Content-addressed record storage.

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use trellis_primitives::{canonical_bytes, content_id_of_bytes, ContentId};

/// Content store result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors a [`ContentStore`] can produce.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given id exists in the store.
    #[error("record not found: {0}")]
    NotFound(ContentId),
    /// A stored record could not be decoded into the requested type.
    #[error("failed to decode record {0}: {1}")]
    Codec(ContentId, String),
    /// The underlying medium failed.
    #[error("store io: {0}")]
    Io(String),
    /// A fetch exceeded its deadline. Fetches fail rather than hang; they are
    /// not retried automatically.
    #[error("store fetch timed out")]
    Timeout,
}

/// Content-addressed get/put of opaque records.
///
/// Records are keyed by the digest of their bytes, so a `put` of identical
/// bytes is idempotent and a `get` can never observe a partially-written
/// record. Implementations are synchronous; a remote-backed store is expected
/// to bound each fetch with a deadline and surface [`StoreError::Timeout`].
pub trait ContentStore: Send + Sync {
    /// Fetches the record with the given id.
    fn get(&self, cid: &ContentId) -> Result<Vec<u8>>;

    /// Stores a record, returning the id it is now addressable by.
    fn put(&self, bytes: Vec<u8>) -> Result<ContentId>;
}

/// Typed convenience layer over [`ContentStore`].
pub trait ContentStoreExt: ContentStore {
    /// Fetches and decodes a record.
    fn get_typed<T: DeserializeOwned>(&self, cid: &ContentId) -> Result<T> {
        let bytes = self.get(cid)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Codec(*cid, e.to_string()))
    }

    /// Encodes and stores a record.
    fn put_typed<T: Serialize>(&self, value: &T) -> Result<ContentId> {
        self.put(canonical_bytes(value))
    }
}

impl<S: ContentStore + ?Sized> ContentStoreExt for S {}

impl<S: ContentStore + ?Sized> ContentStore for &S {
    fn get(&self, cid: &ContentId) -> Result<Vec<u8>> {
        (**self).get(cid)
    }

    fn put(&self, bytes: Vec<u8>) -> Result<ContentId> {
        (**self).put(bytes)
    }
}

impl<S: ContentStore + ?Sized> ContentStore for std::sync::Arc<S> {
    fn get(&self, cid: &ContentId) -> Result<Vec<u8>> {
        (**self).get(cid)
    }

    fn put(&self, bytes: Vec<u8>) -> Result<ContentId> {
        (**self).put(bytes)
    }
}

/// The default in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<ContentId, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True iff no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, cid: &ContentId) -> Result<Vec<u8>> {
        self.records.read().get(cid).cloned().ok_or(StoreError::NotFound(*cid))
    }

    fn put(&self, bytes: Vec<u8>) -> Result<ContentId> {
        let cid = content_id_of_bytes(&bytes);
        self.records.write().insert(cid, bytes);
        Ok(cid)
    }
}

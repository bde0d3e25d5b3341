//! The pending message pool.

use crate::{validate::SignatureValidator, MessageValidator, PoolResult};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::trace;
use trellis_primitives::{Address, ContentId, SignedMessage};

/// The set of pending, unconfirmed messages known to this node.
///
/// Membership is keyed by content id: a message is in the pool at most once,
/// and re-adding an already-present message is a no-op rather than an error.
/// Semantically competing messages (same sender and nonce, different payload)
/// are *not* deduplicated against each other; only exact encodings collide.
///
/// All methods take `&self` and synchronize internally, so the pool can be
/// shared across concurrently submitting callers.
#[derive(Debug)]
pub struct MessagePool<V = SignatureValidator> {
    pending: RwLock<HashMap<ContentId, SignedMessage>>,
    validator: V,
}

impl MessagePool {
    /// Creates an empty pool with the default signature validator.
    pub fn new() -> Self {
        Self::with_validator(SignatureValidator)
    }
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new()
    }
}

// === impl MessagePool ===

impl<V: MessageValidator> MessagePool<V> {
    /// Creates an empty pool guarded by the given validator.
    pub fn with_validator(validator: V) -> Self {
        Self { pending: RwLock::new(HashMap::new()), validator }
    }

    /// Adds a message to the pool, returning its content id.
    ///
    /// Fails if the validator rejects the message; succeeds without mutation
    /// if an identical message is already pooled.
    pub fn add(&self, message: SignedMessage) -> PoolResult<ContentId> {
        self.validator.validate(&message)?;

        let cid = message.cid();
        let mut pending = self.pending.write();
        if pending.insert(cid, message).is_none() {
            trace!(target: "msgpool", %cid, total = pending.len(), "added pending message");
        }
        Ok(cid)
    }

    /// Removes the message with the given id, if present.
    pub fn remove(&self, cid: &ContentId) {
        if self.pending.write().remove(cid).is_some() {
            trace!(target: "msgpool", %cid, "removed pending message");
        }
    }

    /// Returns a snapshot of all pending messages, in no particular order.
    pub fn pending(&self) -> Vec<SignedMessage> {
        self.pending.read().values().cloned().collect()
    }

    /// Whether a message with the given id is pooled.
    pub fn contains(&self, cid: &ContentId) -> bool {
        self.pending.read().contains_key(cid)
    }

    /// Number of pooled messages.
    pub fn len(&self) -> usize {
        self.pending.read().len()
    }

    /// True iff nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.read().is_empty()
    }

    /// The largest nonce among pooled messages from `sender`, or `None` if
    /// the sender has nothing pending.
    pub fn largest_nonce(&self, sender: &Address) -> Option<u64> {
        self.pending
            .read()
            .values()
            .filter(|msg| msg.from() == sender)
            .map(SignedMessage::nonce)
            .max()
    }

    /// Applies a reconciliation outcome in one critical section: drops every
    /// newly-confirmed message, then reinstates the abandoned ones.
    ///
    /// Reinstated messages were pulled out of previously validated blocks and
    /// skip the admission validator; see `update_message_pool`.
    pub(crate) fn apply_chain_update(
        &self,
        confirmed: &HashSet<ContentId>,
        reinstated: Vec<SignedMessage>,
    ) {
        let mut pending = self.pending.write();
        for cid in confirmed {
            pending.remove(cid);
        }
        for message in reinstated {
            pending.entry(message.cid()).or_insert(message);
        }
    }
}

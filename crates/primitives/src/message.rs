//! Messages (transactions) and their signed envelopes.

use crate::{canonical_bytes, content_id, Address, ContentId, Signature};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

/// A single transaction from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Recipient account.
    pub to: Address,
    /// Sender account; the signature must verify against this key.
    pub from: Address,
    /// Per-sender sequence number, strictly increasing across the sender's
    /// accepted messages.
    pub nonce: u64,
    /// Value transferred from `from` to `to` on execution.
    pub value: u64,
    /// Price per unit of gas the sender is willing to pay. Block building
    /// prefers higher prices.
    pub gas_price: u64,
    /// Method to invoke on the recipient.
    pub method: String,
    /// Opaque, method-specific parameters.
    pub params: Vec<u8>,
}

impl Message {
    /// The bytes the sender signs: the canonical encoding of the bare message.
    pub fn signing_bytes(&self) -> Vec<u8> {
        canonical_bytes(self)
    }
}

/// A [`Message`] together with the sender's signature over it.
///
/// The signed envelope is what circulates: its [`cid`](Self::cid) is the
/// message's identity everywhere (pool membership, block inclusion, dedup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// The message being attested.
    pub message: Message,
    /// Sender's signature over [`Message::signing_bytes`].
    pub signature: Signature,
}

impl SignedMessage {
    /// Signs `message` with `key`.
    ///
    /// No check that `key` matches `message.from` is made here; a mismatched
    /// key simply produces an envelope that fails [`verify_signature`]
    /// (useful for exercising rejection paths).
    ///
    /// [`verify_signature`]: Self::verify_signature
    pub fn sign(message: Message, key: &SigningKey) -> Self {
        let signature = Signature::sign(key, &message.signing_bytes());
        Self { message, signature }
    }

    /// The message's content identity.
    ///
    /// Computed over the whole envelope, so two envelopes are the same
    /// message iff they are byte-identical under canonical encoding.
    pub fn cid(&self) -> ContentId {
        content_id(self)
    }

    /// Checks the signature against the stated sender.
    pub fn verify_signature(&self) -> bool {
        self.signature.verify(&self.message.from, &self.message.signing_bytes())
    }

    /// Sender address.
    pub fn from(&self) -> &Address {
        &self.message.from
    }

    /// Sender nonce.
    pub fn nonce(&self) -> u64 {
        self.message.nonce
    }

    /// Offered gas price.
    pub fn gas_price(&self) -> u64 {
        self.message.gas_price
    }
}

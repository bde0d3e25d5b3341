//! Deterministic fixtures for tests.
//!
//! No process-global state: every test constructs its own [`MockSigner`] and
//! gets the same keys for the same parameters.

use crate::{Address, Message, SignedMessage};
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};

/// A bag of deterministic ed25519 keys with signing helpers.
#[derive(Debug, Clone)]
pub struct MockSigner {
    keys: Vec<SigningKey>,
    counter: u64,
}

impl MockSigner {
    /// Creates a signer holding `n` keys derived from a fixed seed.
    pub fn new(n: usize) -> Self {
        let keys = (0..n)
            .map(|i| {
                let digest = Sha256::digest(format!("trellis-mock-signer-{i}"));
                SigningKey::from_bytes(&digest.into())
            })
            .collect();
        Self { keys, counter: 0 }
    }

    /// Addresses of all held keys, in key order.
    pub fn addresses(&self) -> Vec<Address> {
        self.keys.iter().map(Address::from).collect()
    }

    /// The signing key behind `addr`, if held.
    pub fn key_for(&self, addr: &Address) -> Option<&SigningKey> {
        self.keys.iter().find(|k| Address::from(*k) == *addr)
    }

    /// The first key, conventionally used as the test miner.
    pub fn miner_key(&self) -> &SigningKey {
        &self.keys[0]
    }

    /// Signs `message` with the key matching `message.from`.
    ///
    /// Panics if the sender is not one of this signer's addresses; tests
    /// should only sign for accounts they own.
    pub fn sign_message(&self, message: Message) -> SignedMessage {
        let key = self
            .key_for(&message.from)
            .expect("mock signer does not hold a key for the message sender");
        SignedMessage::sign(message, key)
    }

    /// Produces `count` distinct signed messages, round-robin across senders.
    ///
    /// Message payloads are numbered monotonically per signer instance
    /// (`m0`, `m1`, ...) so successive calls never collide by content id.
    pub fn signed_messages(&mut self, count: usize) -> Vec<SignedMessage> {
        (0..count)
            .map(|_| {
                let i = self.counter;
                self.counter += 1;
                let key = &self.keys[i as usize % self.keys.len()];
                let message = Message {
                    to: Address::from_bytes([0xee; 32]),
                    from: Address::from(key),
                    nonce: i / self.keys.len() as u64,
                    value: 0,
                    gas_price: 1,
                    method: format!("m{i}"),
                    params: Vec::new(),
                };
                SignedMessage::sign(message, key)
            })
            .collect()
    }
}

/// A bare message with the fields tests care about; everything else zeroed.
pub fn message(from: Address, nonce: u64, gas_price: u64, method: &str) -> Message {
    Message {
        to: Address::from_bytes([0xee; 32]),
        from,
        nonce,
        value: 0,
        gas_price,
        method: method.to_string(),
        params: Vec::new(),
    }
}

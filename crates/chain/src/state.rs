//! The replayable account state.
//!
//! Execution semantics are deliberately minimal: the consensus core only
//! needs a deterministic "apply this ordered batch, produce a content hash"
//! contract. Accounts carry a balance and the per-sender nonce that enforces
//! message ordering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trellis_interfaces::{ContentStore, ContentStoreExt, StoreError};
use trellis_primitives::{Address, ContentId, SignedMessage};

/// Why a message could not be applied.
///
/// Application failures are block-validation failures: a block carrying an
/// inapplicable message is invalid in its entirety.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApplyError {
    /// The message nonce does not match the sender's next expected nonce.
    #[error("bad nonce for {from}: message has {got}, account expects {expected}")]
    NonceMismatch {
        /// Message sender.
        from: Address,
        /// Nonce carried by the message.
        got: u64,
        /// Nonce the account state expects next.
        expected: u64,
    },
    /// The sender cannot cover the transferred value.
    #[error("insufficient funds for {from}: balance {balance}, transfer {value}")]
    InsufficientFunds {
        /// Message sender.
        from: Address,
        /// Sender balance before the transfer.
        balance: u64,
        /// Value the message moves.
        value: u64,
    },
}

/// One account's state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorState {
    /// Next expected message nonce.
    pub nonce: u64,
    /// Spendable balance.
    pub balance: u64,
}

/// A snapshot of all account state, identified by the content id of its
/// canonical encoding.
///
/// The ordered map makes the encoding, and therefore the state root,
/// independent of insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTree {
    actors: BTreeMap<Address, ActorState>,
}

impl StateTree {
    /// The empty pre-genesis state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the snapshot with the given root from the store.
    pub fn load<S: ContentStore>(store: &S, root: &ContentId) -> Result<Self, StoreError> {
        store.get_typed(root)
    }

    /// Persists this snapshot and returns its root.
    pub fn flush<S: ContentStore>(&self, store: &S) -> Result<ContentId, StoreError> {
        store.put_typed(self)
    }

    /// The state of `address`, if the account exists.
    pub fn actor(&self, address: &Address) -> Option<&ActorState> {
        self.actors.get(address)
    }

    /// Sets an account's state; used to seed genesis allocations.
    pub fn set_actor(&mut self, address: Address, actor: ActorState) {
        self.actors.insert(address, actor);
    }

    /// Applies a single message: checks the sender's nonce and funds, bumps
    /// the nonce, and moves the value.
    pub fn apply_message(&mut self, message: &SignedMessage) -> Result<(), ApplyError> {
        let from = *message.from();
        let value = message.message.value;

        let sender = self.actors.entry(from).or_default();
        if message.nonce() != sender.nonce {
            return Err(ApplyError::NonceMismatch {
                from,
                got: message.nonce(),
                expected: sender.nonce,
            });
        }
        if sender.balance < value {
            return Err(ApplyError::InsufficientFunds {
                from,
                balance: sender.balance,
                value,
            });
        }
        sender.nonce += 1;
        sender.balance -= value;

        if value > 0 {
            self.actors.entry(message.message.to).or_default().balance += value;
        }
        Ok(())
    }

    /// Applies a block's message batch in order.
    ///
    /// The caller owns atomicity: on error the tree is part-applied and must
    /// be discarded, which block validation does by replaying into a scratch
    /// copy.
    pub fn apply_messages(&mut self, messages: &[SignedMessage]) -> Result<(), ApplyError> {
        for message in messages {
            self.apply_message(message)?;
        }
        Ok(())
    }
}

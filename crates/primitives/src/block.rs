//! Blocks.

use crate::{canonical_bytes, content_id, Address, ContentId, Signature, SignedMessage, TipSetKey};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

/// A block: one chain position's worth of messages, mined by one account.
///
/// Blocks are immutable, content-addressed records; sibling blocks at the same
/// height form a [`TipSet`](crate::TipSet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Account that produced the block and signed it.
    pub miner: Address,
    /// Key of the parent tip set. Empty only for genesis.
    pub parents: TipSetKey,
    /// Distance from genesis; also the fork-choice score.
    pub height: u64,
    /// Election ticket. Distinguishes sibling blocks a miner produces for the
    /// same chain position.
    pub ticket: u64,
    /// Messages included in this block, in execution order.
    pub messages: Vec<SignedMessage>,
    /// Root of the state obtained by executing `messages` against the parent
    /// state.
    pub state_root: ContentId,
    /// Miner's signature over [`signing_bytes`](Self::signing_bytes).
    pub signature: Signature,
}

/// The unsigned fields of a [`Block`], used to build and sign one.
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    /// Parent tip set key.
    pub parents: TipSetKey,
    /// Block height.
    pub height: u64,
    /// Election ticket.
    pub ticket: u64,
    /// Included messages.
    pub messages: Vec<SignedMessage>,
    /// Declared resulting state root.
    pub state_root: ContentId,
}

impl Block {
    /// Signs a [`BlockTemplate`] with the given miner key.
    pub fn sign(template: BlockTemplate, key: &SigningKey) -> Self {
        let BlockTemplate { parents, height, ticket, messages, state_root } = template;
        let miner = Address::from(key);
        let signature = Signature::sign(
            key,
            &signing_bytes(&miner, &parents, height, ticket, &messages, &state_root),
        );
        Self { miner, parents, height, ticket, messages, state_root, signature }
    }

    /// The block's content identity, over the full record including the
    /// signature.
    pub fn cid(&self) -> ContentId {
        content_id(self)
    }

    /// Fork-choice score. Total order over blocks; a candidate replaces the
    /// head only with a strictly greater score, so equal-score ties always
    /// keep the incumbent.
    pub fn score(&self) -> u64 {
        self.height
    }

    /// Whether this is a chain anchor: no parents, height zero.
    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty() && self.height == 0
    }

    /// The bytes the miner signs: everything but the signature itself.
    pub fn signing_bytes(&self) -> Vec<u8> {
        signing_bytes(
            &self.miner,
            &self.parents,
            self.height,
            self.ticket,
            &self.messages,
            &self.state_root,
        )
    }

    /// Checks the miner signature.
    pub fn verify_signature(&self) -> bool {
        self.signature.verify(&self.miner, &self.signing_bytes())
    }
}

fn signing_bytes(
    miner: &Address,
    parents: &TipSetKey,
    height: u64,
    ticket: u64,
    messages: &[SignedMessage],
    state_root: &ContentId,
) -> Vec<u8> {
    canonical_bytes(&(miner, parents, height, ticket, messages, state_root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(height: u64, ticket: u64) -> BlockTemplate {
        BlockTemplate {
            parents: TipSetKey::empty(),
            height,
            ticket,
            messages: Vec::new(),
            state_root: ContentId::default(),
        }
    }

    #[test]
    fn signed_block_verifies() {
        let key = SigningKey::from_bytes(&[5; 32]);
        let block = Block::sign(template(0, 0), &key);

        assert!(block.verify_signature());
        assert!(block.is_genesis());
    }

    #[test]
    fn mutated_block_fails_verification() {
        let key = SigningKey::from_bytes(&[5; 32]);
        let mut block = Block::sign(template(1, 0), &key);
        block.height = 2;

        assert!(!block.verify_signature());
    }

    #[test]
    fn tickets_distinguish_siblings() {
        let key = SigningKey::from_bytes(&[5; 32]);
        let a = Block::sign(template(1, 0), &key);
        let b = Block::sign(template(1, 1), &key);
        assert_ne!(a.cid(), b.cid());
    }

    #[test]
    fn cid_covers_signature() {
        let key = SigningKey::from_bytes(&[5; 32]);
        let block = Block::sign(template(1, 0), &key);
        let mut resigned = block.clone();
        resigned.signature = Signature::placeholder();

        assert_ne!(block.cid(), resigned.cid());
    }
}

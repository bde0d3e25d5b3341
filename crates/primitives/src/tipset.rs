//! Tip sets: the set of sibling blocks occupying one chain position.

use crate::{Block, ContentId, SignedMessage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a tip set: the sorted, deduplicated cids of its blocks.
///
/// Two tip sets are the same chain position iff their keys are equal; height
/// comparison is never used for identity.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TipSetKey(Vec<ContentId>);

impl TipSetKey {
    /// Builds a key from block cids in any order.
    pub fn new(mut cids: Vec<ContentId>) -> Self {
        cids.sort_unstable();
        cids.dedup();
        Self(cids)
    }

    /// The genesis sentinel: the parent key of blocks at height zero.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// True for the genesis sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of blocks named by this key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The cids, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentId> {
        self.0.iter()
    }
}

impl fmt::Display for TipSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cid) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{cid}")?;
        }
        write!(f, "}}")
    }
}

/// Errors from [`TipSet`] construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TipSetError {
    /// A tip set must contain at least one block.
    #[error("tip set must not be empty")]
    Empty,
    /// All blocks in a tip set occupy the same height.
    #[error("mismatched heights in tip set: {0} != {1}")]
    MismatchedHeights(u64, u64),
    /// All blocks in a tip set extend the same parent tip set.
    #[error("mismatched parents in tip set")]
    MismatchedParents,
}

/// A non-empty set of blocks sharing the same parents and height.
///
/// Blocks are held sorted by cid, which makes [`key`](Self::key) and message
/// iteration order deterministic across nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSet {
    blocks: Vec<Block>,
}

impl TipSet {
    /// Builds a tip set, validating the sibling invariants.
    pub fn new(mut blocks: Vec<Block>) -> Result<Self, TipSetError> {
        let first = blocks.first().ok_or(TipSetError::Empty)?;
        let (height, parents) = (first.height, first.parents.clone());
        for block in &blocks[1..] {
            if block.height != height {
                return Err(TipSetError::MismatchedHeights(height, block.height));
            }
            if block.parents != parents {
                return Err(TipSetError::MismatchedParents);
            }
        }
        blocks.sort_unstable_by_key(Block::cid);
        blocks.dedup_by_key(|b| b.cid());
        Ok(Self { blocks })
    }

    /// Wraps a single block; the invariants hold trivially.
    pub fn single(block: Block) -> Self {
        Self { blocks: vec![block] }
    }

    /// The tip set's identity.
    pub fn key(&self) -> TipSetKey {
        TipSetKey::new(self.blocks.iter().map(Block::cid).collect())
    }

    /// Height shared by every block in the set.
    pub fn height(&self) -> u64 {
        self.blocks[0].height
    }

    /// Parent key shared by every block in the set.
    pub fn parents(&self) -> &TipSetKey {
        &self.blocks[0].parents
    }

    /// Fork-choice score of the position.
    pub fn score(&self) -> u64 {
        self.blocks[0].score()
    }

    /// True iff this is a chain anchor.
    pub fn is_genesis(&self) -> bool {
        self.parents().is_empty()
    }

    /// The member blocks, sorted by cid.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All messages carried at this chain position, across every member
    /// block, in deterministic (block-cid, intra-block) order.
    pub fn messages(&self) -> impl Iterator<Item = &SignedMessage> {
        self.blocks.iter().flat_map(|b| b.messages.iter())
    }
}

impl fmt::Display for TipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tipset(h={}, {})", self.height(), self.key())
    }
}

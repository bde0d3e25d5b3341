//! Chain acceptance errors.

use crate::state::ApplyError;
use trellis_interfaces::StoreError;
use trellis_primitives::ContentId;
use trellis_transaction_pool::PoolError;

/// Chain result type.
pub type ChainResult<T> = std::result::Result<T, ChainError>;

/// Self-contained defects of a single block, independent of any ancestor.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StructuralError {
    /// The miner signature does not verify against the miner address.
    #[error("block signature does not verify against miner")]
    BlockSignature,
    /// An included message's signature does not verify against its sender.
    #[error("message {0} does not verify against its sender")]
    MessageSignature(ContentId),
    /// Parents and height disagree about being genesis: exactly the blocks at
    /// height zero have no parents.
    #[error("inconsistent genesis shape: height {height} with {parents} parents")]
    GenesisShape {
        /// Declared height.
        height: u64,
        /// Number of parent cids.
        parents: usize,
    },
    /// A block's parent does not sit below it.
    #[error("parent height {parent} does not precede child height {child}")]
    ParentHeight {
        /// Height of the fetched parent.
        parent: u64,
        /// Height of the child being validated.
        child: u64,
    },
}

/// All errors block processing can throw.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The block is malformed in itself; the chain is unaffected.
    #[error("structural validation failed: {0}")]
    Structural(#[from] StructuralError),
    /// The candidate does not strictly outscore the current head. Not a
    /// defect: the block is simply not adopted, and ties keep the incumbent.
    #[error("block is not better than the current head ({score} <= {best})")]
    NotBetter {
        /// Candidate score.
        score: u64,
        /// Incumbent head score.
        best: u64,
    },
    /// The content store failed to produce or persist a record; the head does
    /// not advance.
    #[error("content store failure: {0}")]
    Store(#[from] StoreError),
    /// Replaying a block's messages produced a different state root than the
    /// block declares. Semantic fraud-or-bug signal; the block is rejected.
    #[error("state root mismatch: computed {computed}, block declares {declared}")]
    StateRootMismatch {
        /// Root obtained by replay.
        computed: ContentId,
        /// Root the block carries.
        declared: ContentId,
    },
    /// A message in the block cannot execute against its prior state.
    #[error("message application failed: {0}")]
    Apply(#[from] ApplyError),
    /// The candidate's ancestry never reaches a known-good block.
    #[error("chain does not connect to a known-good ancestor")]
    Disconnected,
    /// Reconciling the message pool after acceptance failed; the head does
    /// not advance.
    #[error("message pool reconciliation failed: {0}")]
    Pool(#[from] PoolError),
}

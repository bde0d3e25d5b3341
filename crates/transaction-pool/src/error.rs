//! Message pool errors.

use trellis_interfaces::StoreError;
use trellis_primitives::TipSetError;

/// Message pool result type.
pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// All errors the message pool can throw.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The message's signature does not verify against its stated sender; the
    /// message never enters the pool.
    #[error("invalid message signature")]
    InvalidSignature,
    /// An ancestor tip set needed for reconciliation could not be fetched.
    /// The reconciliation aborts without touching the pool.
    #[error("failed to fetch chain ancestry: {0}")]
    ChainFetch(#[from] StoreError),
    /// Stored sibling blocks do not form a valid tip set.
    #[error("malformed tip set in chain ancestry: {0}")]
    MalformedTipSet(#[from] TipSetError),
    /// Walking both heads exhausted one chain without the walks meeting.
    /// Only reachable when the two heads descend from different anchors.
    #[error("chains share no common ancestor")]
    NoCommonAncestor,
    /// An ancestor's height failed to decrease toward genesis; the ancestry
    /// is corrupt and walking it would not terminate.
    #[error("ancestor height does not decrease toward genesis")]
    InvalidAncestry,
}

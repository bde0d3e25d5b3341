//! Chain bootstrap.

use crate::{ChainResult, StateTree};
use trellis_interfaces::{ContentStore, ContentStoreExt};
use trellis_primitives::{Address, Block, Signature, TipSetKey};

/// Builds the genesis block anchoring a chain over the empty state.
pub fn genesis_block<S: ContentStore>(store: &S) -> ChainResult<Block> {
    genesis_with_state(store, StateTree::empty())
}

/// Builds a genesis block over a pre-seeded state (e.g. initial allocations).
///
/// Genesis blocks are anchored by content id, not by a miner signature: they
/// carry the placeholder signature and the zero miner address, and enter the
/// known-good set by construction rather than through validation.
pub fn genesis_with_state<S: ContentStore>(store: &S, state: StateTree) -> ChainResult<Block> {
    let state_root = state.flush(store)?;
    let block = Block {
        miner: Address::default(),
        parents: TipSetKey::empty(),
        height: 0,
        ticket: 0,
        messages: Vec::new(),
        state_root,
        signature: Signature::placeholder(),
    };
    store.put_typed(&block)?;
    Ok(block)
}

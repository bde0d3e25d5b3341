//! Chain-building helpers for pool and reconciliation tests.

use crate::{MessagePool, MessageValidator};
use trellis_interfaces::{ContentStore, ContentStoreExt};
use trellis_primitives::{
    test_utils::MockSigner, Block, BlockTemplate, ContentId, SignedMessage, TipSet, TipSetKey,
};

/// Builds a chain of tip sets on top of `base` (or on a fresh anchor) and
/// persists every block to `store`.
///
/// Each entry in `levels` describes one tip set as a list of per-block
/// message lists; an entry with no blocks produces a tip set with a single
/// empty block. Sibling blocks are disambiguated by ticket. Returns the built
/// tip sets in chain order, excluding `base`.
pub fn chain_with_messages<S: ContentStore>(
    store: &S,
    base: Option<&TipSet>,
    levels: Vec<Vec<Vec<SignedMessage>>>,
    signer: &MockSigner,
) -> Vec<TipSet> {
    let (mut parents, mut height) = match base {
        Some(ts) => (ts.key(), ts.height() + 1),
        None => (TipSetKey::empty(), 0),
    };

    let mut chain = Vec::with_capacity(levels.len());
    for level in levels {
        let block_messages = if level.is_empty() { vec![Vec::new()] } else { level };
        let blocks: Vec<Block> = block_messages
            .into_iter()
            .enumerate()
            .map(|(ticket, messages)| {
                let block = Block::sign(
                    BlockTemplate {
                        parents: parents.clone(),
                        height,
                        ticket: ticket as u64,
                        messages,
                        state_root: ContentId::default(),
                    },
                    signer.miner_key(),
                );
                store.put_typed(&block).expect("store never fails in tests");
                block
            })
            .collect();

        let tipset = TipSet::new(blocks).expect("built blocks share parents and height");
        parents = tipset.key();
        height += 1;
        chain.push(tipset);
    }
    chain
}

/// Clones message references into an owned list; mirrors how test scenarios
/// spell out per-block message sets.
pub fn msgs(list: &[&SignedMessage]) -> Vec<SignedMessage> {
    list.iter().map(|m| (*m).clone()).collect()
}

/// Adds all messages to the pool, panicking on rejection.
pub fn must_add<V: MessageValidator>(pool: &MessagePool<V>, messages: &[&SignedMessage]) {
    for message in messages {
        pool.add((*message).clone()).expect("test message must be accepted");
    }
}

/// Asserts the pool holds exactly `expected`, compared by content id.
#[track_caller]
pub fn assert_pool_equals<V: MessageValidator>(
    pool: &MessagePool<V>,
    expected: &[&SignedMessage],
) {
    let mut got: Vec<ContentId> = pool.pending().iter().map(SignedMessage::cid).collect();
    let mut want: Vec<ContentId> = expected.iter().map(|m| m.cid()).collect();
    got.sort();
    want.sort();
    assert_eq!(
        got,
        want,
        "pool content mismatch: {} pending, expected {}",
        got.len(),
        want.len()
    );
}

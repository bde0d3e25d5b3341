//! Reconciling the pool with canonical-chain changes.
//!
//! Whenever the head moves (a plain extension, a truncation, or a reorg
//! across a fork) pool membership must be recomputed: messages confirmed by
//! the new chain leave the pool, and messages that were only confirmed on the
//! abandoned branch are returned to it.

use crate::{MessagePool, MessageValidator, PoolError, PoolResult};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};
use trellis_interfaces::{ContentStore, ContentStoreExt};
use trellis_primitives::{Block, ContentId, SignedMessage, TipSet, TipSetKey};

/// Updates `pool` for the head transition `old_head -> new_head`.
///
/// Both heads are walked back to their fork point, collecting every message
/// on each side. Messages seen on the new side are confirmed and removed from
/// the pool; messages seen only on the old side are reinstated. A message
/// confirmed on both branches stays confirmed; it is never returned to the
/// pool.
///
/// The two walks are pure reads over immutable, content-addressed chain data
/// and run without the pool lock; the resulting removals and reinsertions are
/// then applied in a single critical section. Any fetch failure aborts before
/// that section, leaving the pool untouched.
pub fn update_message_pool<V, S>(
    pool: &MessagePool<V>,
    store: &S,
    old_head: &TipSet,
    new_head: &TipSet,
) -> PoolResult<()>
where
    V: MessageValidator,
    S: ContentStore,
{
    if old_head.key() == new_head.key() {
        trace!(target: "msgpool", head = %new_head.key(), "head unchanged, nothing to reconcile");
        return Ok(());
    }

    let mut abandoned = HashMap::new();
    let mut confirmed_msgs = HashMap::new();
    let mut old = Walker::start(old_head);
    let mut new = Walker::start(new_head);

    // Lockstep walk: step whichever side is deeper until both cursors sit on
    // the fork point. Ranks decrease strictly, so the walk terminates at the
    // latest on the empty anchor key shared by chains of the same genesis.
    while old.key != new.key {
        if old.rank >= new.rank {
            old.step(store, &mut abandoned)?;
        }
        if new.rank > old.rank {
            new.step(store, &mut confirmed_msgs)?;
        }
    }

    let confirmed: HashSet<ContentId> = confirmed_msgs.keys().copied().collect();
    let reinstated: Vec<SignedMessage> = abandoned
        .into_iter()
        .filter(|(cid, _)| !confirmed.contains(cid))
        .map(|(_, msg)| msg)
        .collect();

    debug!(
        target: "msgpool",
        old = %old_head.key(),
        new = %new_head.key(),
        removed = confirmed.len(),
        reinstated = reinstated.len(),
        "reconciled pool with new head"
    );

    pool.apply_chain_update(&confirmed, reinstated);
    Ok(())
}

/// A cursor walking one chain from its head toward genesis.
///
/// `rank` is `height + 1` for a real tip set and `0` for the virtual anchor
/// position below genesis, so two cursors on the same chain position always
/// compare equal by key.
struct Walker {
    key: TipSetKey,
    rank: u64,
    tip: Option<TipSet>,
}

impl Walker {
    fn start(head: &TipSet) -> Self {
        Self { key: head.key(), rank: head.height() + 1, tip: Some(head.clone()) }
    }

    /// Collects the current tip set's messages and moves to its parent.
    fn step(
        &mut self,
        store: &impl ContentStore,
        collected: &mut HashMap<ContentId, SignedMessage>,
    ) -> PoolResult<()> {
        let Some(tip) = self.tip.take() else {
            // Already below genesis yet still unequal to the other cursor:
            // the heads do not descend from the same anchor.
            return Err(PoolError::NoCommonAncestor);
        };

        for message in tip.messages() {
            collected.insert(message.cid(), message.clone());
        }

        if tip.parents().is_empty() {
            self.key = TipSetKey::empty();
            self.rank = 0;
        } else {
            let parent = fetch_tipset(store, tip.parents())?;
            if parent.height() >= tip.height() {
                return Err(PoolError::InvalidAncestry);
            }
            self.key = parent.key();
            self.rank = parent.height() + 1;
            self.tip = Some(parent);
        }
        Ok(())
    }
}

/// Loads the tip set named by `key` from the store.
fn fetch_tipset(store: &impl ContentStore, key: &TipSetKey) -> PoolResult<TipSet> {
    let blocks = key
        .iter()
        .map(|cid| store.get_typed::<Block>(cid))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TipSet::new(blocks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_pool_equals, chain_with_messages, msgs, must_add};
    use assert_matches::assert_matches;
    use trellis_interfaces::{MemoryStore, StoreError};
    use trellis_primitives::test_utils::MockSigner;

    fn head_of(chain: &[TipSet]) -> &TipSet {
        chain.last().expect("built chains are never empty")
    }

    #[test]
    fn replace_head() {
        // Msg pool: [m0, m1], Chain: b[]
        // to
        // Msg pool: [m0],     Chain: b[m1]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(2);
        must_add(&pool, &[&m[0], &m[1]]);

        let old_chain = chain_with_messages(&store, None, vec![vec![]], &signer);
        let new_chain = chain_with_messages(&store, None, vec![vec![msgs(&[&m[1]])]], &signer);

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[0]]);
    }

    #[test]
    fn replace_head_with_self() {
        // Msg pool: [m0, m1], Chain: b[m2]
        // to
        // Msg pool: [m0, m1], Chain: b[m2]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(3);
        must_add(&pool, &[&m[0], &m[1]]);

        let old_chain = chain_with_messages(&store, None, vec![vec![msgs(&[&m[2]])]], &signer);
        let head = head_of(&old_chain);

        update_message_pool(&pool, &store, head, head).unwrap();
        assert_pool_equals(&pool, &[&m[0], &m[1]]);
    }

    #[test]
    fn replace_head_with_a_long_chain() {
        // Msg pool: [m2, m5], Chain: b[m0, m1]
        // to
        // Msg pool: [m1],     Chain: b[m2, m3] -> b[m4] -> b[m0] -> b[] -> b[m5, m6]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(7);
        must_add(&pool, &[&m[2], &m[5]]);

        let old_chain =
            chain_with_messages(&store, None, vec![vec![msgs(&[&m[0], &m[1]])]], &signer);
        let new_chain = chain_with_messages(
            &store,
            None,
            vec![
                vec![msgs(&[&m[2], &m[3]])],
                vec![msgs(&[&m[4]])],
                vec![msgs(&[&m[0]])],
                vec![msgs(&[])],
                vec![msgs(&[&m[5], &m[6]])],
            ],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[1]]);
    }

    #[test]
    fn replace_head_with_multi_block_tipset_chains() {
        // Msg pool: [m2, m5], Chain: {b[m0], b[m1]}
        // to
        // Msg pool: [m1],     Chain: b[m2, m3] -> {b[m4], b[m0], b[], b[]} -> {b[], b[m5, m6]}
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(7);
        must_add(&pool, &[&m[2], &m[5]]);

        let old_chain = chain_with_messages(
            &store,
            None,
            vec![vec![msgs(&[&m[0]]), msgs(&[&m[1]])]],
            &signer,
        );
        let new_chain = chain_with_messages(
            &store,
            None,
            vec![
                vec![msgs(&[&m[2], &m[3]])],
                vec![msgs(&[&m[4]]), msgs(&[&m[0]]), msgs(&[]), msgs(&[])],
                vec![msgs(&[]), msgs(&[&m[5], &m[6]])],
            ],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[1]]);
    }

    #[test]
    fn replace_internal_node() {
        // Msg pool: [m3, m5], Chain: b[m0] -> b[m1] -> b[m2]
        // to
        // Msg pool: [m1, m2], Chain: b[m0] -> b[m3] -> b[m4, m5]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(6);
        must_add(&pool, &[&m[3], &m[5]]);

        let old_chain = chain_with_messages(
            &store,
            None,
            vec![vec![msgs(&[&m[0]])], vec![msgs(&[&m[1]])], vec![msgs(&[&m[2]])]],
            &signer,
        );
        let new_chain = chain_with_messages(
            &store,
            Some(&old_chain[0]),
            vec![vec![msgs(&[&m[3]])], vec![msgs(&[&m[4], &m[5]])]],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[1], &m[2]]);
    }

    #[test]
    fn replace_internal_node_with_a_long_chain() {
        // Msg pool: [m6], Chain: b[m0] -> b[m1] -> b[m2]
        // to
        // Msg pool: [m6], Chain: b[m0] -> b[m3] -> b[m4] -> b[m5] -> b[m1, m2]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(7);
        must_add(&pool, &[&m[6]]);

        let old_chain = chain_with_messages(
            &store,
            None,
            vec![vec![msgs(&[&m[0]])], vec![msgs(&[&m[1]])], vec![msgs(&[&m[2]])]],
            &signer,
        );
        let new_chain = chain_with_messages(
            &store,
            Some(&old_chain[0]),
            vec![
                vec![msgs(&[&m[3]])],
                vec![msgs(&[&m[4]])],
                vec![msgs(&[&m[5]])],
                vec![msgs(&[&m[1], &m[2]])],
            ],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[6]]);
    }

    #[test]
    fn replace_internal_node_with_multi_block_tipset_chains() {
        // Msg pool: [m6], Chain: {b[m0], b[m1]} -> b[m2]
        // to
        // Msg pool: [m6], Chain: {b[m0], b[m1]} -> b[m3] -> b[m4] -> {b[m5], b[m1, m2]}
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(7);
        must_add(&pool, &[&m[6]]);

        let old_chain = chain_with_messages(
            &store,
            None,
            vec![vec![msgs(&[&m[0]]), msgs(&[&m[1]])], vec![msgs(&[&m[2]])]],
            &signer,
        );
        let new_chain = chain_with_messages(
            &store,
            Some(&old_chain[0]),
            vec![
                vec![msgs(&[&m[3]])],
                vec![msgs(&[&m[4]])],
                vec![msgs(&[&m[5]]), msgs(&[&m[1], &m[2]])],
            ],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[6]]);
    }

    #[test]
    fn replace_with_same_messages_in_different_block_structure() {
        // Msg pool: [m3, m5], Chain: b[m0] -> b[m1] -> b[m2]
        // to
        // Msg pool: [m3, m5], Chain: {b[m0], b[m1], b[m2]}
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(6);
        must_add(&pool, &[&m[3], &m[5]]);

        let old_chain = chain_with_messages(
            &store,
            None,
            vec![vec![msgs(&[&m[0]])], vec![msgs(&[&m[1]])], vec![msgs(&[&m[2]])]],
            &signer,
        );
        let new_chain = chain_with_messages(
            &store,
            None,
            vec![vec![msgs(&[&m[0]]), msgs(&[&m[1]]), msgs(&[&m[2]])]],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[3], &m[5]]);
    }

    #[test]
    fn truncate_to_internal_node() {
        // Msg pool: [],       Chain: b[m0] -> b[m1] -> b[m2] -> b[m3]
        // to
        // Msg pool: [m2, m3], Chain: b[m0] -> b[m1]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);
        let m = signer.signed_messages(4);

        let old_chain = chain_with_messages(
            &store,
            None,
            vec![
                vec![msgs(&[&m[0]])],
                vec![msgs(&[&m[1]])],
                vec![msgs(&[&m[2]])],
                vec![msgs(&[&m[3]])],
            ],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), &old_chain[1]).unwrap();
        assert_pool_equals(&pool, &[&m[2], &m[3]]);
    }

    #[test]
    fn extend_head() {
        // Msg pool: [m0, m1], Chain: b[]
        // to
        // Msg pool: [m0],     Chain: b[] -> b[m1, m2]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(3);
        must_add(&pool, &[&m[0], &m[1]]);

        let old_chain = chain_with_messages(&store, None, vec![vec![msgs(&[])]], &signer);
        let new_chain = chain_with_messages(
            &store,
            Some(head_of(&old_chain)),
            vec![vec![msgs(&[&m[1], &m[2]])]],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[&m[0]]);
    }

    #[test]
    fn extend_head_with_a_longer_chain_and_more_messages() {
        // Msg pool: [m2, m5], Chain: b[m0] -> b[m1]
        // to
        // Msg pool: [],       Chain: b[m0] -> b[m1] -> b[m2, m3] -> b[m4] -> b[m5, m6]
        let store = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(7);
        must_add(&pool, &[&m[2], &m[5]]);

        let old_chain = chain_with_messages(
            &store,
            None,
            vec![vec![msgs(&[&m[0]])], vec![msgs(&[&m[1]])]],
            &signer,
        );
        let new_chain = chain_with_messages(
            &store,
            Some(&old_chain[1]),
            vec![
                vec![msgs(&[&m[2], &m[3]])],
                vec![msgs(&[&m[4]])],
                vec![msgs(&[&m[5], &m[6]])],
            ],
            &signer,
        );

        update_message_pool(&pool, &store, head_of(&old_chain), head_of(&new_chain)).unwrap();
        assert_pool_equals(&pool, &[]);
    }

    #[test]
    fn missing_ancestor_aborts_without_touching_the_pool() {
        let populated = MemoryStore::new();
        let pool = MessagePool::new();
        let mut signer = MockSigner::new(10);

        let m = signer.signed_messages(4);
        must_add(&pool, &[&m[3]]);

        let old_chain = chain_with_messages(
            &populated,
            None,
            vec![vec![msgs(&[&m[0]])], vec![msgs(&[&m[1]])]],
            &signer,
        );
        let new_chain = chain_with_messages(
            &populated,
            Some(&old_chain[0]),
            vec![vec![msgs(&[&m[2]])], vec![msgs(&[])]],
            &signer,
        );

        // Reconciling against a store that lost the ancestry must fail fatally
        // and leave the pool exactly as it was.
        let empty = MemoryStore::new();
        let result = update_message_pool(&pool, &empty, head_of(&old_chain), head_of(&new_chain));
        assert_matches!(result, Err(PoolError::ChainFetch(StoreError::NotFound(_))));
        assert_pool_equals(&pool, &[&m[3]]);
    }
}

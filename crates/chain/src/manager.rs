//! The state manager: fork choice and chain acceptance.

use crate::{ChainError, ChainResult, StateTree, StructuralError};
use std::{cmp::Reverse, collections::HashSet, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use trellis_interfaces::{ContentStore, ContentStoreExt};
use trellis_primitives::{Block, ContentId, TipSet, TipSetKey};
use trellis_transaction_pool::{
    update_message_pool, MessagePool, MessageValidator, SignatureValidator,
};

/// Owner of the canonical head.
///
/// The manager accepts candidate blocks, validates them by replaying their
/// messages against a previously validated ancestor's state, and adopts a
/// candidate as the new head only when it strictly outscores the incumbent.
/// Every adoption reconciles the shared [`MessagePool`] with the head
/// transition, so a message is never silently lost to a reorg nor left
/// pending once confirmed.
///
/// The manager is the single consumer of chain-acceptance events: methods
/// take `&mut self` and are expected to run serialized, while the pool it
/// shares remains open to concurrent submitters throughout.
#[derive(Debug)]
pub struct StateManager<S, V = SignatureValidator>
where
    S: ContentStore,
    V: MessageValidator,
{
    /// The current best (head) block.
    best_block: Block,
    /// Key of the head tip set.
    head: TipSetKey,
    /// State snapshot at the head.
    state: StateTree,
    /// Cids of blocks already proven valid this session, so validation never
    /// re-replays the whole ancestry. Unbounded, like the chain it mirrors;
    /// bounding it needs a finality signal this core does not own.
    known_good: HashSet<ContentId>,
    store: Arc<S>,
    pool: Arc<MessagePool<V>>,
    /// Accepted blocks are forwarded here for the block producer.
    block_out: mpsc::Sender<Block>,
}

// === impl StateManager ===

impl<S, V> StateManager<S, V>
where
    S: ContentStore,
    V: MessageValidator,
{
    /// Creates a manager anchored at `genesis` (or any trusted checkpoint
    /// block whose state is loadable from `store`).
    pub fn new(
        store: Arc<S>,
        pool: Arc<MessagePool<V>>,
        genesis: Block,
        block_out: mpsc::Sender<Block>,
    ) -> ChainResult<Self> {
        // Re-putting is idempotent and guarantees the anchor is fetchable.
        store.put_typed(&genesis)?;
        let state = StateTree::load(&store, &genesis.state_root)?;
        let head = TipSet::single(genesis.clone()).key();
        let known_good = HashSet::from([genesis.cid()]);
        Ok(Self { best_block: genesis, head, state, known_good, store, pool, block_out })
    }

    /// The current head block.
    pub fn best_block(&self) -> &Block {
        &self.best_block
    }

    /// The current head tip set key.
    pub fn head(&self) -> &TipSetKey {
        &self.head
    }

    /// The state snapshot at the current head.
    pub fn state(&self) -> &StateTree {
        &self.state
    }

    /// Whether a block has already been proven valid this session.
    pub fn is_known_good(&self, cid: &ContentId) -> bool {
        self.known_good.contains(cid)
    }

    /// Delivers a candidate block, fire-and-forget.
    ///
    /// Rejections are logged and swallowed; callers that need the outcome use
    /// [`process_new_block`](Self::process_new_block) directly. On acceptance
    /// the block is forwarded to the block producer; if that consumer is not
    /// keeping up the notification is dropped rather than blocking
    /// acceptance.
    pub fn inform(&mut self, block: Block) {
        let cid = block.cid();
        match self.process_new_block(block.clone()) {
            Ok(()) => {
                if self.block_out.try_send(block).is_err() {
                    debug!(target: "chain", %cid, "producer busy, dropping block notification");
                }
            }
            Err(err) => warn!(target: "chain", %cid, %err, "rejected informed block"),
        }
    }

    /// Validates a candidate and adopts it if it strictly outscores the
    /// current head.
    pub fn process_new_block(&mut self, block: Block) -> ChainResult<()> {
        self.validate_block(&block)?;

        if block.score() > self.best_block.score() {
            self.accept_new_block(block)
        } else {
            Err(ChainError::NotBetter {
                score: block.score(),
                best: self.best_block.score(),
            })
        }
    }

    /// Proves a candidate block valid.
    ///
    /// Walks backward through parent references until a known-good ancestor,
    /// structurally checking every block on the way, then replays forward
    /// from the ancestor's state snapshot, checking each block's declared
    /// state root. Successfully replayed blocks are memoized as known-good.
    pub fn validate_block(&mut self, block: &Block) -> ChainResult<()> {
        self.check_block(block)?;

        // Fail fast before touching the ancestry.
        if block.score() <= self.best_block.score() {
            return Err(ChainError::NotBetter {
                score: block.score(),
                best: self.best_block.score(),
            });
        }

        let mut validating = Vec::new();
        let mut base = block.clone();
        while !self.known_good.contains(&base.cid()) {
            if base.is_genesis() {
                // A different anchor than ours; nothing to replay from.
                return Err(ChainError::Disconnected);
            }
            validating.push(base.clone());
            let parent = self.fetch_parent(&base)?;
            self.check_block(&parent)?;
            base = parent;
        }

        debug!(
            target: "chain",
            candidate = %block.cid(),
            depth = validating.len(),
            base = %base.cid(),
            "replaying candidate ancestry"
        );

        let mut state = StateTree::load(&self.store, &base.state_root)?;
        for pending in validating.iter().rev() {
            self.check_state_change(&mut state, pending)?;
            self.known_good.insert(pending.cid());
        }
        Ok(())
    }

    /// Adopts `block` as the new head.
    ///
    /// Everything fallible (persistence, state load, pool reconciliation)
    /// runs before any field changes, so a failure leaves the previous head,
    /// state and pool fully intact.
    fn accept_new_block(&mut self, block: Block) -> ChainResult<()> {
        let cid = self.store.put_typed(&block)?;

        let old_head = TipSet::single(self.best_block.clone());
        let new_head = TipSet::single(block.clone());
        let state = StateTree::load(&self.store, &block.state_root)?;
        update_message_pool(&self.pool, &self.store, &old_head, &new_head)?;

        self.known_good.insert(cid);
        self.head = new_head.key();
        self.state = state;
        self.best_block = block;

        info!(
            target: "chain",
            head = %cid,
            score = self.best_block.score(),
            state_root = %self.best_block.state_root,
            "accepted new head"
        );
        Ok(())
    }

    /// Verifies a block on its own: field consistency and signatures.
    ///
    /// Validity of state changes is checked separately, and only once the
    /// state of the parent has been validated.
    fn check_block(&self, block: &Block) -> Result<(), StructuralError> {
        if block.parents.is_empty() != (block.height == 0) {
            return Err(StructuralError::GenesisShape {
                height: block.height,
                parents: block.parents.len(),
            });
        }
        // Genesis blocks are anchored by cid and carry no real signature.
        if !block.is_genesis() && !block.verify_signature() {
            return Err(StructuralError::BlockSignature);
        }
        for message in &block.messages {
            if !message.verify_signature() {
                return Err(StructuralError::MessageSignature(message.cid()));
            }
        }
        Ok(())
    }

    /// Replays `block`'s messages onto `state` and checks the result against
    /// the declared state root.
    fn check_state_change(&self, state: &mut StateTree, block: &Block) -> ChainResult<()> {
        state.apply_messages(&block.messages)?;
        let computed = state.flush(&self.store)?;
        if computed != block.state_root {
            return Err(ChainError::StateRootMismatch {
                computed,
                declared: block.state_root,
            });
        }
        Ok(())
    }

    /// Fetches the parent block to continue the validation walk through.
    ///
    /// The validation spine is linear: when the parent key names sibling
    /// blocks, the walk follows the strongest one, lowest cid on ties.
    fn fetch_parent(&self, block: &Block) -> ChainResult<Block> {
        let mut best: Option<Block> = None;
        for cid in block.parents.iter() {
            let candidate: Block = self.store.get_typed(cid)?;
            if candidate.height >= block.height {
                return Err(StructuralError::ParentHeight {
                    parent: candidate.height,
                    child: block.height,
                }
                .into());
            }
            let stronger = best
                .as_ref()
                .map(|b| {
                    (candidate.score(), Reverse(candidate.cid())) > (b.score(), Reverse(b.cid()))
                })
                .unwrap_or(true);
            if stronger {
                best = Some(candidate);
            }
        }
        best.ok_or(ChainError::Disconnected)
    }
}

//! Block-building message selection.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, VecDeque},
};
use trellis_primitives::{Address, SignedMessage};

/// A priority queue of messages from different senders, ordered by decreasing
/// gas price subject to the constraint that one sender's messages are always
/// yielded in increasing nonce order.
///
/// The queue is a one-shot drain structure: all messages are inserted at
/// construction from a pool snapshot, after which messages may only be
/// popped. It is intended for a single block-building round on a single
/// thread (construct, drain, discard).
#[derive(Debug, Default)]
pub struct MessageQueue {
    by_sender: BinaryHeap<SenderQueue>,
}

impl MessageQueue {
    /// Builds the queue from a snapshot of pending messages.
    ///
    /// Messages are grouped by sender and each sender's group sorted by
    /// nonce; the heap then ranks senders by the gas price of their current
    /// front message, tie-broken by ascending sender address so the drain
    /// order is reproducible across nodes.
    pub fn new(messages: impl IntoIterator<Item = SignedMessage>) -> Self {
        let mut by_sender: HashMap<Address, Vec<SignedMessage>> = HashMap::new();
        for message in messages {
            by_sender.entry(*message.from()).or_default().push(message);
        }

        let by_sender = by_sender
            .into_iter()
            .map(|(sender, mut queue)| {
                queue.sort_by_key(SignedMessage::nonce);
                SenderQueue { sender, messages: queue.into() }
            })
            .collect();

        Self { by_sender }
    }

    /// Removes and returns the next best message, or `None` if drained.
    ///
    /// Cost is logarithmic in the number of distinct senders.
    pub fn pop(&mut self) -> Option<SignedMessage> {
        let mut best = self.by_sender.pop()?;
        let message = best.messages.pop_front()?;
        if !best.messages.is_empty() {
            // The sender's next message may price differently; reinsert to
            // restore the heap order.
            self.by_sender.push(best);
        }
        Some(message)
    }

    /// True iff no sender has remaining messages.
    pub fn is_empty(&self) -> bool {
        self.by_sender.is_empty()
    }

    /// Pops until empty, returning the full selection order.
    pub fn drain(&mut self) -> Vec<SignedMessage> {
        std::iter::from_fn(|| self.pop()).collect()
    }
}

/// One sender's pending messages, front-ordered by nonce.
///
/// Heap priority is the gas price of the front message; the ordering is only
/// meaningful while the queue is non-empty, which the heap maintains.
#[derive(Debug)]
struct SenderQueue {
    sender: Address,
    messages: VecDeque<SignedMessage>,
}

impl SenderQueue {
    fn front_gas_price(&self) -> u64 {
        self.messages.front().map(SignedMessage::gas_price).unwrap_or_default()
    }
}

impl Ord for SenderQueue {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest gas price wins; on a tie the byte-wise smaller address must
        // pop first, hence the inverted operand order.
        self.front_gas_price()
            .cmp(&other.front_gas_price())
            .then_with(|| other.sender.cmp(&self.sender))
    }
}

impl PartialOrd for SenderQueue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SenderQueue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SenderQueue {}

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! The trellis message pool.
//!
//! The pool is the authoritative set of pending, not-yet-mined messages known
//! to this node. Three pieces cooperate:
//!
//! - [`MessagePool`] stores validated pending messages, deduplicated by
//!   content id. Insertion is guarded by a [`MessageValidator`]: a message
//!   whose signature does not verify never enters the pool.
//! - [`update_message_pool`] reconciles the pool against an arbitrary head
//!   transition (extension, truncation, or deep reorg): messages confirmed by
//!   the new chain leave the pool, messages stranded on the abandoned branch
//!   return to it.
//! - [`MessageQueue`] is a one-shot drain structure for block building: it
//!   yields the pool snapshot in decreasing gas-price order while never
//!   emitting a sender's messages out of nonce order.
//!
//! Pool membership implies nothing about ordering; ordering is imposed only
//! when a [`MessageQueue`] is constructed for a block-building round.

mod error;
mod maintain;
mod pool;
mod queue;
mod validate;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{PoolError, PoolResult};
pub use maintain::update_message_pool;
pub use pool::MessagePool;
pub use queue::MessageQueue;
pub use validate::{MessageValidator, SignatureValidator};

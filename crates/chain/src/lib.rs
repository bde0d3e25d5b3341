#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Fork choice, block validation and chain acceptance.
//!
//! The [`StateManager`] owns the canonical head: candidate blocks are
//! validated by replaying their messages against a previously validated
//! ancestor's state, adopted when they strictly outscore the current head,
//! and every adoption reconciles the pending message pool with the head
//! transition.

mod error;
mod genesis;
mod manager;
mod state;

pub use error::{ChainError, ChainResult, StructuralError};
pub use genesis::{genesis_block, genesis_with_state};
pub use manager::StateManager;
pub use state::{ActorState, ApplyError, StateTree};

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Commonly used types in trellis.
//!
//! Everything in the chain is content-addressed: a record's identity is the
//! [`ContentId`] of its canonical encoding, so two records constructed
//! independently are equal iff their encodings are byte-identical.

mod address;
mod block;
mod crypto;
mod hash;
mod message;
mod tipset;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use address::Address;
pub use block::{Block, BlockTemplate};
pub use crypto::Signature;
pub use hash::{canonical_bytes, content_id, content_id_of_bytes, ContentId};
pub use message::{Message, SignedMessage};
pub use tipset::{TipSet, TipSetError, TipSetKey};

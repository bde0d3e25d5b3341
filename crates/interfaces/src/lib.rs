#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]

//! Abstractions over the trellis core's external collaborators.
//!
//! The consensus core treats storage as an opaque content-addressed get/put
//! keyed by [`ContentId`](trellis_primitives::ContentId); everything here is
//! the seam between the core and whatever backs that store.

pub mod store;

pub use store::{ContentStore, ContentStoreExt, MemoryStore, StoreError};

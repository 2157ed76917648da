// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transactional persistence for name / index mappings.
//!
//! This crate holds the only shared mutable resource of the mapping layer: a key/value store of
//! structured records addressed by hierarchical [`MappingPath`]s. All accesses happen through a
//! transaction handle implementing [`MappingStore`]. A [`TxContext`] pairs that handle with the
//! [`DumpCache`] that memoizes dataplane enumerations for the lifetime of the transaction.

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use thiserror::Error;

pub mod cache;
pub mod memory;
pub mod path;
pub mod store;
pub mod tx;

pub use cache::{DumpCache, DumpKind};
pub use memory::{MemoryStore, MemoryTx};
pub use path::MappingPath;
pub use store::{MappingStore, MappingStoreExt, Transaction};
pub use tx::TxContext;

/// The errors produced by mapping stores
#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("Failed to encode record at '{path}': {reason}")]
    Encode { path: MappingPath, reason: String },
    #[error("Failed to decode record at '{path}': {reason}")]
    Decode { path: MappingPath, reason: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! An in-memory, transactional mapping store.
//!
//! Committed records live in a single ordered map shared by all transactions. A transaction
//! ([`MemoryTx`]) buffers its writes in a private overlay and reads through it, so that its own
//! writes are visible to itself only. Committing applies the overlay under the write lock; the
//! last writer wins. Dropping a transaction without committing discards its writes.

use crate::store::{MappingStore, Transaction};
use crate::{MappingPath, StoreError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
#[allow(unused)]
use tracing::{debug, trace};

type Records = BTreeMap<MappingPath, Value>;

/// A mapping store kept in memory. Clones share the same records.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Records>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new transaction over this store.
    #[must_use]
    pub fn begin(&self) -> MemoryTx {
        MemoryTx {
            store: self.clone(),
            overlay: BTreeMap::new(),
        }
    }

    /// Number of committed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.read().is_empty()
    }

    /// Paths of all committed records under `prefix`.
    #[must_use]
    pub fn paths(&self, prefix: &MappingPath) -> Vec<MappingPath> {
        let committed = self.committed.read();
        scan(&*committed, prefix).map(|(p, _)| p.clone()).collect()
    }
}

fn scan<'a, V>(
    records: &'a BTreeMap<MappingPath, V>,
    prefix: &'a MappingPath,
) -> impl Iterator<Item = (&'a MappingPath, &'a V)> {
    records
        .range(prefix.clone()..)
        .take_while(move |(path, _)| path.starts_with(prefix))
}

/// A transaction over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    store: MemoryStore,
    overlay: BTreeMap<MappingPath, Option<Value>>,
}

impl MemoryTx {
    /// Number of paths written (or deleted) by this transaction.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.overlay.len()
    }
}

impl MappingStore for MemoryTx {
    fn read(&self, path: &MappingPath) -> Result<Option<Value>, StoreError> {
        if let Some(buffered) = self.overlay.get(path) {
            return Ok(buffered.clone());
        }
        Ok(self.store.committed.read().get(path).cloned())
    }

    fn put(&mut self, path: &MappingPath, record: Value) -> Result<(), StoreError> {
        trace!("put {path}");
        self.overlay.insert(path.clone(), Some(record));
        Ok(())
    }

    fn delete(&mut self, path: &MappingPath) -> Result<(), StoreError> {
        trace!("delete {path}");
        self.overlay.insert(path.clone(), None);
        Ok(())
    }

    fn list(&self, prefix: &MappingPath) -> Result<Vec<(MappingPath, Value)>, StoreError> {
        let mut merged: Records = {
            let committed = self.store.committed.read();
            scan(&*committed, prefix)
                .map(|(p, v)| (p.clone(), v.clone()))
                .collect()
        };
        for (path, buffered) in scan(&self.overlay, prefix) {
            match buffered {
                Some(value) => {
                    merged.insert(path.clone(), value.clone());
                }
                None => {
                    merged.remove(path);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl Transaction for MemoryTx {
    fn commit(self) -> Result<(), StoreError> {
        let mut committed = self.store.committed.write();
        let writes = self.overlay.len();
        for (path, buffered) in self.overlay {
            match buffered {
                Some(value) => {
                    committed.insert(path, value);
                }
                None => {
                    committed.remove(&path);
                }
            }
        }
        debug!("Committed transaction with {writes} writes");
        Ok(())
    }

    fn rollback(self) {
        debug!(
            "Rolled back transaction discarding {} writes",
            self.overlay.len()
        );
    }
}

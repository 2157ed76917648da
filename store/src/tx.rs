// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The context carried by every read and write of one transaction.

use crate::cache::DumpCache;
use crate::store::{MappingStore, Transaction};
use crate::StoreError;

/// One transaction: a handle to the mapping store plus the transaction-scoped dump cache.
///
/// Mapping facades (naming contexts and the like) are stateless and shared; everything that is
/// specific to a transaction lives here and is passed explicitly to every call.
#[derive(Debug)]
pub struct TxContext<S> {
    mapping: S,
    cache: DumpCache,
}

impl<S: MappingStore> TxContext<S> {
    #[must_use]
    pub fn new(mapping: S) -> Self {
        Self {
            mapping,
            cache: DumpCache::new(),
        }
    }

    #[must_use]
    pub fn mapping(&self) -> &S {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut S {
        &mut self.mapping
    }

    #[must_use]
    pub fn cache(&self) -> &DumpCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DumpCache {
        &mut self.cache
    }

    /// Borrow the mapping store and the dump cache at the same time.
    pub fn parts(&mut self) -> (&mut S, &mut DumpCache) {
        (&mut self.mapping, &mut self.cache)
    }
}

impl<S: Transaction> TxContext<S> {
    /// Commit the mapping writes. The dump cache is dropped.
    ///
    /// # Errors
    ///
    /// Fails if the mapping store fails to commit.
    pub fn commit(self) -> Result<(), StoreError> {
        self.mapping.commit()
    }

    /// Discard the mapping writes. The dump cache is dropped.
    pub fn rollback(self) {
        self.mapping.rollback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DumpKind, MappingPath, MappingStoreExt, MemoryStore};

    struct Interfaces;
    impl DumpKind for Interfaces {
        type Params = ();
        type Reply = Vec<u32>;
        const NAME: &'static str = "interfaces";
    }

    #[test]
    fn cache_does_not_outlive_transaction() {
        let store = MemoryStore::new();
        let mut tx = TxContext::new(store.begin());
        tx.cache_mut().put::<Interfaces>((), vec![1]);
        tx.mapping_mut()
            .put_record(&MappingPath::root("ctx").child("a"), &1u32)
            .unwrap();
        tx.commit().unwrap();

        let tx = TxContext::new(store.begin());
        assert!(tx.cache().is_empty());
        assert_eq!(
            tx.mapping()
                .read_record::<u32>(&MappingPath::root("ctx").child("a"))
                .unwrap(),
            Some(1)
        );
    }
}

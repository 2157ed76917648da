// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A per-transaction memo of dataplane enumerations.
//!
//! Dumps are expensive, and many readers within a single transaction need the same one (every
//! interface-scoped reader needs the interface dump, every session of a classify table needs that
//! table's session dump, ...). The [`DumpCache`] ensures that, within one transaction, each
//! distinct dump is requested from the dataplane at most once.
//!
//! Entries are typed: every kind of dump is described by a [`DumpKind`] stating the type of its
//! parameters (the cache key) and the type of its reply. There are no string keys.
//!
//! The cache has no validity beyond its transaction, since the dataplane may change between
//! transactions. It is owned by [`crate::TxContext`] and dropped with it.

use ahash::RandomState;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// A kind of dataplane enumeration.
pub trait DumpKind: 'static {
    /// What distinguishes two dumps of this kind (e.g. the interface or table they are about).
    /// Use `()` for unfiltered dumps.
    type Params: Clone + Debug + Eq + Hash + Send + Sync + 'static;
    /// The reply to the dump.
    type Reply: Send + Sync + 'static;
    /// A name for logs.
    const NAME: &'static str;
}

type Entries<K> = HashMap<<K as DumpKind>::Params, Arc<<K as DumpKind>::Reply>, RandomState>;

pub struct DumpCache {
    kinds: HashMap<TypeId, Box<dyn Any + Send + Sync>, RandomState>,
}

impl Debug for DumpCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpCache")
            .field("kinds", &self.kinds.len())
            .finish()
    }
}

impl Default for DumpCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: HashMap::with_hasher(RandomState::with_seed(0)),
        }
    }

    fn entries<K: DumpKind>(&self) -> Option<&Entries<K>> {
        self.kinds
            .get(&TypeId::of::<K>())
            .and_then(|entries| entries.downcast_ref::<Entries<K>>())
    }

    #[allow(clippy::unwrap_used)] // slots are keyed by the TypeId of K
    fn entries_mut<K: DumpKind>(&mut self) -> &mut Entries<K> {
        self.kinds
            .entry(TypeId::of::<K>())
            .or_insert_with(|| Box::new(Entries::<K>::with_hasher(RandomState::with_seed(0))))
            .downcast_mut::<Entries<K>>()
            .unwrap()
    }

    /// Get the cached reply of a dump, if any.
    #[must_use]
    pub fn get<K: DumpKind>(&self, params: &K::Params) -> Option<Arc<K::Reply>> {
        self.entries::<K>()?.get(params).cloned()
    }

    #[must_use]
    pub fn contains<K: DumpKind>(&self, params: &K::Params) -> bool {
        self.entries::<K>().is_some_and(|e| e.contains_key(params))
    }

    /// Store the reply to a dump, replacing any previous one.
    pub fn put<K: DumpKind>(&mut self, params: K::Params, reply: K::Reply) -> Arc<K::Reply> {
        let reply = Arc::new(reply);
        self.entries_mut::<K>().insert(params, reply.clone());
        reply
    }

    /// Get the reply to a dump, performing it with `dump` if this is the first request for it.
    ///
    /// Failures are not cached: a later request with the same parameters calls `dump` again.
    ///
    /// # Errors
    ///
    /// Returns whatever error `dump` returns.
    pub fn get_or_dump<K: DumpKind, E>(
        &mut self,
        params: &K::Params,
        dump: impl FnOnce(&K::Params) -> Result<K::Reply, E>,
    ) -> Result<Arc<K::Reply>, E> {
        if let Some(reply) = self.get::<K>(params) {
            debug!("{} dump for {params:?} is present in cache", K::NAME);
            return Ok(reply);
        }
        debug!("Dumping {} for {params:?}", K::NAME);
        let reply = dump(params)?;
        Ok(self.put::<K>(params.clone(), reply))
    }

    /// Forget every cached dump of kind `K`.
    pub fn invalidate<K: DumpKind>(&mut self) {
        self.kinds.remove(&TypeId::of::<K>());
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.kinds.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

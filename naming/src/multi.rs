// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mapping of (parent, child key) pairs to dataplane indices.
//!
//! Some dataplane handles only make sense under a parent object: an IPsec SA for example is looked
//! up per direction and SPI. A [`MultiNamingContext`] stores those as ordinary mapping records
//! whose name is the parent and the child key joined by [`SEPARATOR`]. Neither component may
//! contain the separator, otherwise the composite would be ambiguous.

use crate::context::Mapping;
use crate::errors::{MappingError, MappingResult};
use config::MultiContextConfig;
use handle::Handle;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use store::{MappingPath, MappingStore, MappingStoreExt};
use tracing::debug;

/// Joins parent and child key in the names of the records.
pub const SEPARATOR: char = '|';

pub struct MultiNamingContext<T: ?Sized> {
    instance_name: String,
    start_index: u32,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Clone for MultiNamingContext<T> {
    fn clone(&self) -> Self {
        Self {
            instance_name: self.instance_name.clone(),
            start_index: self.start_index,
            _kind: PhantomData,
        }
    }
}

impl<T: ?Sized> Debug for MultiNamingContext<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiNamingContext")
            .field("instance_name", &self.instance_name)
            .field("start_index", &self.start_index)
            .finish()
    }
}

fn validate(component: &str, what: &str) -> MappingResult<()> {
    if component.contains(SEPARATOR) {
        return Err(MappingError::InvalidArgument(format!(
            "{what} '{component}' contains '{SEPARATOR}'"
        )));
    }
    Ok(())
}

impl<T: ?Sized> MultiNamingContext<T> {
    #[must_use]
    pub fn new(instance_name: &str, start_index: u32) -> Self {
        Self {
            instance_name: instance_name.to_owned(),
            start_index,
            _kind: PhantomData,
        }
    }

    #[must_use]
    pub fn from_config(config: &MultiContextConfig) -> Self {
        Self::new(&config.instance_name, config.start_index)
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    #[must_use]
    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    fn mappings_root(&self) -> MappingPath {
        MappingPath::root(&self.instance_name).child("mappings")
    }

    fn composite(parent: &str, child_key: &str) -> MappingResult<String> {
        validate(parent, "parent name")?;
        validate(child_key, "child key")?;
        Ok(format!("{parent}{SEPARATOR}{child_key}"))
    }

    /// Map `(parent, child_key)` to `index`, replacing any previous mapping of the pair.
    ///
    /// # Errors
    ///
    /// [`MappingError::InvalidArgument`] if a component contains [`SEPARATOR`] or `index` is below
    /// the start index of this context.
    pub fn add_child<S: MappingStore + ?Sized>(
        &self,
        parent: &str,
        index: Handle<T>,
        child_key: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        let name = Self::composite(parent, child_key)?;
        if index.into_raw() < self.start_index {
            return Err(MappingError::InvalidArgument(format!(
                "Index {index} is below the start index {} of context {}",
                self.start_index, self.instance_name
            )));
        }
        debug!(
            "Mapping {parent}/{child_key} to index {index} in context {}",
            self.instance_name
        );
        store.put_record(
            &self.mappings_root().child(&name),
            &Mapping::new(&name, index.into_raw()),
        )?;
        Ok(())
    }

    /// Map `(parent, child_key)` to the lowest index above all the indices of the children of
    /// `parent` (the start index of this context if it has none).
    pub fn add_next_child<S: MappingStore + ?Sized>(
        &self,
        parent: &str,
        child_key: &str,
        store: &mut S,
    ) -> MappingResult<Handle<T>> {
        let next = match self.children(parent, store)?.iter().map(|(_, i)| *i).max() {
            None => self.start_index,
            Some(max) => max.into_raw().checked_add(1).ok_or_else(|| {
                MappingError::IllegalState(format!(
                    "No index left for {parent} in context {}",
                    self.instance_name
                ))
            })?,
        };
        let index = Handle::from_raw(next);
        self.add_child(parent, index, child_key, store)?;
        Ok(index)
    }

    /// Remove the mapping of `(parent, child_key)`. Won't fail if there is none.
    pub fn remove_child<S: MappingStore + ?Sized>(
        &self,
        parent: &str,
        child_key: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        let path = self.mappings_root().child(Self::composite(parent, child_key)?);
        if store.read(&path)?.is_some() {
            debug!(
                "Removing mapping of {parent}/{child_key} in context {}",
                self.instance_name
            );
            store.delete(&path)?;
        }
        Ok(())
    }

    /// Get the index mapped to `(parent, child_key)`.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if the pair is not mapped.
    pub fn get_index<S: MappingStore + ?Sized>(
        &self,
        parent: &str,
        child_key: &str,
        store: &S,
    ) -> MappingResult<Handle<T>> {
        let name = Self::composite(parent, child_key)?;
        store
            .read_record::<Mapping>(&self.mappings_root().child(&name))?
            .map(|m| Handle::from_raw(m.index))
            .ok_or_else(|| MappingError::not_found(&self.instance_name, &name))
    }

    /// The children of `parent`, ordered by child key.
    pub fn children<S: MappingStore + ?Sized>(
        &self,
        parent: &str,
        store: &S,
    ) -> MappingResult<Vec<(String, Handle<T>)>> {
        validate(parent, "parent name")?;
        let prefix = format!("{parent}{SEPARATOR}");
        Ok(store
            .list_records::<Mapping>(&self.mappings_root())?
            .into_iter()
            .filter_map(|(_, m)| {
                m.name
                    .strip_prefix(&prefix)
                    .map(|child| (child.to_owned(), Handle::from_raw(m.index)))
            })
            .collect())
    }

    /// Get the key of the child of `parent` mapped to `index`.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if no child of `parent` is mapped to `index`,
    /// [`MappingError::IllegalState`] if more than one is.
    pub fn get_child_key<S: MappingStore + ?Sized>(
        &self,
        parent: &str,
        index: Handle<T>,
        store: &S,
    ) -> MappingResult<String> {
        let mut keys: Vec<String> = self
            .children(parent, store)?
            .into_iter()
            .filter(|(_, i)| *i == index)
            .map(|(key, _)| key)
            .collect();
        match keys.len() {
            0 => Err(MappingError::not_found(
                &self.instance_name,
                format!("{parent}{SEPARATOR}#{index}"),
            )),
            1 => Ok(keys.remove(0)),
            _ => Err(MappingError::IllegalState(format!(
                "Multiple children of {parent} mapped to index {index} in context {}: {keys:?}",
                self.instance_name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handle::kind::SadEntry;
    use pretty_assertions::assert_eq;
    use store::MemoryStore;

    fn sad() -> MultiNamingContext<SadEntry> {
        MultiNamingContext::new("ipsec-sad-context", 0)
    }

    fn idx(raw: u32) -> Handle<SadEntry> {
        Handle::from_raw(raw)
    }

    #[test]
    fn same_key_under_different_parents_is_independent() {
        let ctx = sad();
        let mut tx = MemoryStore::new().begin();
        ctx.add_child("in", idx(1), "100", &mut tx).unwrap();
        ctx.add_child("out", idx(1), "100", &mut tx).unwrap();
        ctx.add_child("out", idx(7), "100", &mut tx).unwrap();
        assert_eq!(ctx.get_index("in", "100", &tx).unwrap(), idx(1));
        assert_eq!(ctx.get_index("out", "100", &tx).unwrap(), idx(7));

        ctx.remove_child("in", "100", &mut tx).unwrap();
        assert!(ctx.get_index("in", "100", &tx).unwrap_err().is_not_found());
        assert_eq!(ctx.get_index("out", "100", &tx).unwrap(), idx(7));
    }

    #[test]
    fn separator_is_rejected() {
        let ctx = sad();
        let mut tx = MemoryStore::new().begin();
        for (parent, child) in [("in|out", "1"), ("in", "1|2")] {
            assert!(matches!(
                ctx.add_child(parent, idx(0), child, &mut tx),
                Err(MappingError::InvalidArgument(_))
            ));
            assert!(matches!(
                ctx.get_index(parent, child, &tx),
                Err(MappingError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn children_do_not_leak_across_parents() {
        let ctx = sad();
        let mut tx = MemoryStore::new().begin();
        ctx.add_child("in", idx(1), "a", &mut tx).unwrap();
        ctx.add_child("in", idx(2), "b", &mut tx).unwrap();
        ctx.add_child("inbound", idx(3), "c", &mut tx).unwrap();
        assert_eq!(
            ctx.children("in", &tx).unwrap(),
            vec![("a".to_owned(), idx(1)), ("b".to_owned(), idx(2))]
        );
        assert_eq!(ctx.get_child_key("in", idx(2), &tx).unwrap(), "b");
        assert!(ctx.get_child_key("in", idx(3), &tx).unwrap_err().is_not_found());
    }

    #[test]
    fn next_child_starts_at_start_index() {
        let ctx: MultiNamingContext<SadEntry> = MultiNamingContext::new("spd", 10);
        let mut tx = MemoryStore::new().begin();
        assert_eq!(ctx.add_next_child("p", "x", &mut tx).unwrap(), idx(10));
        assert_eq!(ctx.add_next_child("p", "y", &mut tx).unwrap(), idx(11));
        assert_eq!(ctx.add_next_child("q", "x", &mut tx).unwrap(), idx(10));
        assert!(matches!(
            ctx.add_child("p", idx(3), "z", &mut tx),
            Err(MappingError::InvalidArgument(_))
        ));
    }
}

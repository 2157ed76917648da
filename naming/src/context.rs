// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bidirectional mapping between the names of the management model and dataplane indices.

use crate::errors::{MappingError, MappingResult};
use config::ContextConfig;
use handle::Handle;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use store::{MappingPath, MappingStore, MappingStoreExt};
#[allow(unused)]
use tracing::{debug, trace, warn};

/// A persisted mapping record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub name: String,
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Mapping {
    #[must_use]
    pub fn new(name: &str, index: u32) -> Self {
        Self {
            name: name.to_owned(),
            index,
            metadata: None,
        }
    }
}

/// The name/index mapping of one kind of dataplane object (`T`).
///
/// Records live at `<instance name>/mappings/<name>`. There is no index-keyed record: lookups by
/// index scan all the records of the context.
///
/// A `NamingContext` holds no state besides its settings, so it can be shared by any number of
/// concurrent transactions. The mapping store to use is passed to every call.
pub struct NamingContext<T: ?Sized> {
    instance_name: String,
    artificial_name_prefix: String,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Clone for NamingContext<T> {
    fn clone(&self) -> Self {
        Self {
            instance_name: self.instance_name.clone(),
            artificial_name_prefix: self.artificial_name_prefix.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T: ?Sized> Debug for NamingContext<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamingContext")
            .field("instance_name", &self.instance_name)
            .field("artificial_name_prefix", &self.artificial_name_prefix)
            .finish()
    }
}

impl<T: ?Sized> NamingContext<T> {
    #[must_use]
    pub fn new(instance_name: &str, artificial_name_prefix: &str) -> Self {
        Self {
            instance_name: instance_name.to_owned(),
            artificial_name_prefix: artificial_name_prefix.to_owned(),
            _kind: PhantomData,
        }
    }

    #[must_use]
    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(&config.instance_name, &config.artificial_name_prefix)
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    #[must_use]
    pub fn artificial_name_prefix(&self) -> &str {
        &self.artificial_name_prefix
    }

    /// The name made up for an object only known by its index.
    #[must_use]
    pub fn artificial_name(&self, index: Handle<T>) -> String {
        format!("{}{index}", self.artificial_name_prefix)
    }

    fn mappings_root(&self) -> MappingPath {
        MappingPath::root(&self.instance_name).child("mappings")
    }

    fn mapping_path(&self, name: &str) -> MappingPath {
        self.mappings_root().child(name)
    }

    /// All the mappings of this context, ordered by name.
    pub fn mappings<S: MappingStore + ?Sized>(&self, store: &S) -> MappingResult<Vec<Mapping>> {
        Ok(store
            .list_records::<Mapping>(&self.mappings_root())?
            .into_iter()
            .map(|(_, mapping)| mapping)
            .collect())
    }

    fn names_of<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        store: &S,
    ) -> MappingResult<Vec<String>> {
        Ok(self
            .mappings(store)?
            .into_iter()
            .filter(|m| m.index == index.into_raw())
            .map(|m| m.name)
            .collect())
    }

    /// Get the index mapped to `name`.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `name` is not mapped.
    pub fn get_index<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<Handle<T>> {
        store
            .read_record::<Mapping>(&self.mapping_path(name))?
            .map(|m| Handle::from_raw(m.index))
            .ok_or_else(|| MappingError::not_found(&self.instance_name, name))
    }

    /// Get the name mapped to `index`, if any.
    ///
    /// # Errors
    ///
    /// [`MappingError::IllegalState`] if more than one name is mapped to `index`.
    pub fn get_name_if_present<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        store: &S,
    ) -> MappingResult<Option<String>> {
        let mut names = self.names_of(index, store)?;
        match names.len() {
            0 | 1 => Ok(names.pop()),
            _ => Err(MappingError::IllegalState(format!(
                "Multiple mappings for index {index} in context {}: {names:?}",
                self.instance_name
            ))),
        }
    }

    /// Get the name mapped to `index`.
    ///
    /// If there is none, an artificial name (the prefix of this context followed by the index) is
    /// mapped to `index` and returned, so that asking again returns the same name.
    ///
    /// # Errors
    ///
    /// [`MappingError::IllegalState`] if more than one name is mapped to `index`.
    pub fn get_name<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        store: &mut S,
    ) -> MappingResult<String> {
        if let Some(name) = self.get_name_if_present(index, store)? {
            return Ok(name);
        }
        let name = self.artificial_name(index);
        debug!(
            "Mapping artificial name {name} to index {index} in context {}",
            self.instance_name
        );
        store.put_record(&self.mapping_path(&name), &Mapping::new(&name, index.into_raw()))?;
        Ok(name)
    }

    /// Tell if some name is mapped to `index`.
    pub fn contains_name<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        store: &S,
    ) -> MappingResult<bool> {
        Ok(!self.names_of(index, store)?.is_empty())
    }

    /// Tell if `name` is mapped to some index.
    pub fn contains_index<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<bool> {
        Ok(store.read(&self.mapping_path(name))?.is_some())
    }

    /// Map `name` to `index`, replacing any previous mapping of `name`.
    ///
    /// `index` must be the one the dataplane returned when it created the object.
    pub fn add_name<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        name: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        debug!(
            "Mapping {name} to index {index} in context {}",
            self.instance_name
        );
        store.put_record(&self.mapping_path(name), &Mapping::new(name, index.into_raw()))?;
        Ok(())
    }

    /// Map `name` to the lowest index above all the indices of this context (0 if it is empty).
    ///
    /// For objects whose index is not assigned by the dataplane. If `name` is already mapped, its
    /// index is returned unchanged.
    pub fn add_next<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &mut S,
    ) -> MappingResult<Handle<T>> {
        let mappings = self.mappings(store)?;
        if let Some(existing) = mappings.iter().find(|m| m.name == name) {
            return Ok(Handle::from_raw(existing.index));
        }
        let next = match mappings.iter().map(|m| m.index).max() {
            None => 0,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                MappingError::IllegalState(format!(
                    "No index left in context {}",
                    self.instance_name
                ))
            })?,
        };
        let index = Handle::from_raw(next);
        self.add_name(index, name, store)?;
        Ok(index)
    }

    /// Remove the mapping of `name`. Won't fail if there is none.
    pub fn remove_name<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        let path = self.mapping_path(name);
        if store.read(&path)?.is_none() {
            trace!("No mapping for {name} in context {}", self.instance_name);
            return Ok(());
        }
        debug!("Removing mapping of {name} in context {}", self.instance_name);
        store.delete(&path)?;
        Ok(())
    }

    /// Map `name` to the index the dataplane just assigned to a newly created object.
    ///
    /// The dataplane may hand out the slot of an object deleted earlier. If that object's name is
    /// still mapped to `index`, it is unmapped first so that `index` resolves to `name` only.
    /// Returns the names that were unmapped.
    pub fn bind_created<S: MappingStore + ?Sized>(
        &self,
        index: Handle<T>,
        name: &str,
        store: &mut S,
    ) -> MappingResult<Vec<String>> {
        let stale: Vec<String> = self
            .names_of(index, store)?
            .into_iter()
            .filter(|former| former != name)
            .collect();
        for former in &stale {
            warn!(
                "Index {index} reused by the dataplane: unmapping {former} in context {}",
                self.instance_name
            );
            store.delete(&self.mapping_path(former))?;
        }
        self.add_name(index, name, store)?;
        Ok(stale)
    }
}

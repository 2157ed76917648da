// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The mapping store abstraction.

use crate::{MappingPath, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A transaction-scoped view over a key/value store of structured records.
///
/// Implementations are handed to every mapping operation explicitly; nothing in the mapping layer
/// keeps a reference to a store (or to a transaction) across calls.
pub trait MappingStore {
    /// Read the record stored at `path`.
    fn read(&self, path: &MappingPath) -> Result<Option<Value>, StoreError>;

    /// Store `record` at `path`, overwriting whatever was there.
    fn put(&mut self, path: &MappingPath, record: Value) -> Result<(), StoreError>;

    /// Remove the record stored at `path`. Won't fail if not there.
    fn delete(&mut self, path: &MappingPath) -> Result<(), StoreError>;

    /// All records whose path starts with `prefix`, ordered by path.
    fn list(&self, prefix: &MappingPath) -> Result<Vec<(MappingPath, Value)>, StoreError>;
}

/// A [`MappingStore`] whose writes can be made durable or discarded as a whole.
pub trait Transaction: MappingStore {
    /// Make every write of this transaction visible to transactions started afterwards.
    ///
    /// # Errors
    ///
    /// Fails if the underlying store can not persist the writes.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;

    /// Discard every write of this transaction.
    fn rollback(self)
    where
        Self: Sized;
}

/// Typed access to the records of a [`MappingStore`].
pub trait MappingStoreExt: MappingStore {
    /// Read and decode the record at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the stored record is not an `R`.
    fn read_record<R: DeserializeOwned>(&self, path: &MappingPath) -> Result<Option<R>, StoreError> {
        self.read(path)?.map(|value| decode(path, value)).transpose()
    }

    /// Encode and store `record` at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or `record` can not be encoded.
    fn put_record<R: Serialize>(&mut self, path: &MappingPath, record: &R) -> Result<(), StoreError> {
        let value = serde_json::to_value(record).map_err(|e| StoreError::Encode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        self.put(path, value)
    }

    /// Read and decode all records under `prefix`.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or any of the records is not an `R`.
    fn list_records<R: DeserializeOwned>(
        &self,
        prefix: &MappingPath,
    ) -> Result<Vec<(MappingPath, R)>, StoreError> {
        self.list(prefix)?
            .into_iter()
            .map(|(path, value)| decode(&path, value).map(|record| (path, record)))
            .collect()
    }

    /// Remove every record under `prefix`. Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Fails if the store fails.
    fn delete_all(&mut self, prefix: &MappingPath) -> Result<usize, StoreError> {
        let paths: Vec<MappingPath> = self.list(prefix)?.into_iter().map(|(p, _)| p).collect();
        for path in &paths {
            self.delete(path)?;
        }
        Ok(paths.len())
    }
}

impl<S: MappingStore + ?Sized> MappingStoreExt for S {}

fn decode<R: DeserializeOwned>(path: &MappingPath, value: Value) -> Result<R, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode {
        path: path.clone(),
        reason: e.to_string(),
    })
}

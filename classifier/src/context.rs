// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Names of classify tables, and of the graph nodes their next indices point to.
//!
//! A table record holds the name of the table, its index, and the classifier node it was attached
//! to when created (if any). The next indices of a table (miss next, hit next of sessions) are
//! relative to that node, and the dataplane can not tell which node a relative index points to.
//! Node names are thus recorded per table when the table or its sessions are written, so that they
//! can be read back.

use config::ContextConfig;
use handle::Handle;
use handle::kind::{ClassifyTable, RelativeNode};
use naming::{Mapping, MappingError, MappingResult};
use serde::{Deserialize, Serialize};
use store::{MappingPath, MappingStore, MappingStoreExt};
#[allow(unused)]
use tracing::{debug, trace, warn};

/// The record of a classify table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub name: String,
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_node: Option<String>,
}

#[derive(Clone, Debug)]
pub struct VppClassifierContextManager {
    instance_name: String,
    artificial_name_prefix: String,
}

impl VppClassifierContextManager {
    #[must_use]
    pub fn new(instance_name: &str, artificial_name_prefix: &str) -> Self {
        Self {
            instance_name: instance_name.to_owned(),
            artificial_name_prefix: artificial_name_prefix.to_owned(),
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

    fn tables_root(&self) -> MappingPath {
        MappingPath::root(&self.instance_name).child("tables")
    }

    fn table_path(&self, name: &str) -> MappingPath {
        self.tables_root().child(name)
    }

    fn nodes_root(&self, table_name: &str) -> MappingPath {
        MappingPath::root(&self.instance_name)
            .child("nodes")
            .child(table_name)
    }

    /// Every table record, ordered by name.
    pub fn tables<S: MappingStore + ?Sized>(&self, store: &S) -> MappingResult<Vec<TableRecord>> {
        Ok(store
            .list_records::<TableRecord>(&self.tables_root())?
            .into_iter()
            .map(|(_, table)| table)
            .collect())
    }

    fn read_table<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<Option<TableRecord>> {
        Ok(store.read_record::<TableRecord>(&self.table_path(name))?)
    }

    fn names_of<S: MappingStore + ?Sized>(
        &self,
        index: Handle<ClassifyTable>,
        store: &S,
    ) -> MappingResult<Vec<String>> {
        Ok(self
            .tables(store)?
            .into_iter()
            .filter(|t| t.index == index.into_raw())
            .map(|t| t.name)
            .collect())
    }

    /// Record the table the dataplane created at `index`, along with the classifier node its
    /// next indices are relative to.
    ///
    /// Tables formerly recorded at `index` are dropped, with their node names. If `name` was
    /// recorded with another index or classifier node, its node names are dropped as well. Node
    /// names resolved for `name` before it was first recorded are kept.
    pub fn add_table<S: MappingStore + ?Sized>(
        &self,
        index: Handle<ClassifyTable>,
        name: &str,
        classifier_node: Option<&str>,
        store: &mut S,
    ) -> MappingResult<()> {
        for stale in self.names_of(index, store)? {
            if stale != name {
                warn!("Classify table index {index} reused by the dataplane: dropping table {stale}");
                self.remove_table(&stale, store)?;
            }
        }
        let former = self.read_table(name, store)?;
        let moved = former.is_some_and(|t| {
            t.index != index.into_raw() || t.classifier_node.as_deref() != classifier_node
        });
        if moved {
            let dropped = store.delete_all(&self.nodes_root(name))?;
            debug!("Dropped {dropped} node names of former classify table {name}");
        }
        debug!("Mapping classify table {name} to index {index}");
        store.put_record(
            &self.table_path(name),
            &TableRecord {
                name: name.to_owned(),
                index: index.into_raw(),
                classifier_node: classifier_node.map(str::to_owned),
            },
        )?;
        Ok(())
    }

    pub fn contains_table<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<bool> {
        Ok(self.read_table(name, store)?.is_some())
    }

    /// # Errors
    ///
    /// [`MappingError::NotFound`] if table `name` was never created.
    pub fn get_table_index<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<Handle<ClassifyTable>> {
        self.read_table(name, store)?
            .map(|t| Handle::from_raw(t.index))
            .ok_or_else(|| MappingError::not_found(&self.instance_name, name))
    }

    /// The name of the table at `index`, if one is recorded.
    ///
    /// # Errors
    ///
    /// [`MappingError::IllegalState`] if several tables are recorded at `index`.
    pub fn get_table_name_if_present<S: MappingStore + ?Sized>(
        &self,
        index: Handle<ClassifyTable>,
        store: &S,
    ) -> MappingResult<Option<String>> {
        let mut names = self.names_of(index, store)?;
        match names.len() {
            0 | 1 => Ok(names.pop()),
            _ => Err(MappingError::IllegalState(format!(
                "Multiple classify tables at index {index}: {names:?}"
            ))),
        }
    }

    /// The name of the table at `index`. A table with no name is given an artificial one, with no
    /// classifier node.
    pub fn get_table_name<S: MappingStore + ?Sized>(
        &self,
        index: Handle<ClassifyTable>,
        store: &mut S,
    ) -> MappingResult<String> {
        if let Some(name) = self.get_table_name_if_present(index, store)? {
            return Ok(name);
        }
        let name = format!("{}{index}", self.artificial_name_prefix);
        debug!("Naming classify table {index} {name}");
        self.add_table(index, &name, None, store)?;
        Ok(name)
    }

    /// The classifier node table `name` was attached to. `None` if there is none, or if the table
    /// is unknown.
    pub fn get_table_base_node<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &S,
    ) -> MappingResult<Option<String>> {
        Ok(self.read_table(name, store)?.and_then(|t| t.classifier_node))
    }

    /// Drop table `name` and the node names recorded for it. Won't fail if not there.
    pub fn remove_table<S: MappingStore + ?Sized>(
        &self,
        name: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        debug!("Removing classify table {name}");
        store.delete(&self.table_path(name))?;
        store.delete_all(&self.nodes_root(name))?;
        Ok(())
    }

    /// Remember that relative index `node_index` of table `table_name` points to `node_name`.
    pub fn add_node_name<S: MappingStore + ?Sized>(
        &self,
        table_name: &str,
        node_index: Handle<RelativeNode>,
        node_name: &str,
        store: &mut S,
    ) -> MappingResult<()> {
        trace!("Relative node {node_index} of classify table {table_name} is {node_name}");
        store.put_record(
            &self.nodes_root(table_name).child(node_name),
            &Mapping::new(node_name, node_index.into_raw()),
        )?;
        Ok(())
    }

    /// The name of the node relative index `node_index` of the table at `table_index` points to,
    /// if it was ever resolved.
    pub fn get_node_name<S: MappingStore + ?Sized>(
        &self,
        table_index: Handle<ClassifyTable>,
        node_index: Handle<RelativeNode>,
        store: &S,
    ) -> MappingResult<Option<String>> {
        let Some(table_name) = self.get_table_name_if_present(table_index, store)? else {
            return Ok(None);
        };
        Ok(store
            .list_records::<Mapping>(&self.nodes_root(&table_name))?
            .into_iter()
            .map(|(_, node)| node)
            .find(|node| node.index == node_index.into_raw())
            .map(|node| node.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use store::MemoryStore;
    use tracing_test::traced_test;

    fn tables() -> VppClassifierContextManager {
        VppClassifierContextManager::new("classify-table-context", "classify-table-")
    }

    #[test]
    fn table_records_keep_their_base_node() {
        let ctx = tables();
        let mut tx = MemoryStore::new().begin();
        ctx.add_table(Handle::from_raw(2), "t", Some("ip4-classify"), &mut tx)
            .unwrap();
        assert!(ctx.contains_table("t", &tx).unwrap());
        assert_eq!(ctx.get_table_index("t", &tx).unwrap(), Handle::from_raw(2));
        assert_eq!(
            ctx.get_table_base_node("t", &tx).unwrap().as_deref(),
            Some("ip4-classify")
        );
        assert_eq!(ctx.get_table_base_node("u", &tx).unwrap(), None);
        assert!(ctx.get_table_index("u", &tx).unwrap_err().is_not_found());
    }

    #[test]
    fn unknown_tables_get_artificial_names_once() {
        let ctx = tables();
        let mut tx = MemoryStore::new().begin();
        let name = ctx.get_table_name(Handle::from_raw(7), &mut tx).unwrap();
        assert_eq!(name, "classify-table-7");
        assert_eq!(ctx.get_table_name(Handle::from_raw(7), &mut tx).unwrap(), name);
        assert_eq!(ctx.tables(&tx).unwrap().len(), 1);
        assert_eq!(ctx.get_table_base_node(&name, &tx).unwrap(), None);
    }

    #[test]
    fn node_names_are_scoped_to_their_table() {
        let ctx = tables();
        let mut tx = MemoryStore::new().begin();
        ctx.add_table(Handle::from_raw(0), "a", Some("ip4-classify"), &mut tx)
            .unwrap();
        ctx.add_table(Handle::from_raw(1), "b", Some("ip6-classify"), &mut tx)
            .unwrap();
        ctx.add_node_name("a", Handle::from_raw(3), "ip4-rewrite", &mut tx)
            .unwrap();
        assert_eq!(
            ctx.get_node_name(Handle::from_raw(0), Handle::from_raw(3), &tx)
                .unwrap()
                .as_deref(),
            Some("ip4-rewrite")
        );
        assert_eq!(
            ctx.get_node_name(Handle::from_raw(1), Handle::from_raw(3), &tx)
                .unwrap(),
            None
        );
        // unknown table
        assert_eq!(
            ctx.get_node_name(Handle::from_raw(9), Handle::from_raw(3), &tx)
                .unwrap(),
            None
        );
    }

    #[test]
    fn removal_drops_node_names() {
        let ctx = tables();
        let mut tx = MemoryStore::new().begin();
        ctx.add_table(Handle::from_raw(0), "a", Some("ip4-classify"), &mut tx)
            .unwrap();
        ctx.add_node_name("a", Handle::from_raw(3), "ip4-rewrite", &mut tx)
            .unwrap();
        ctx.remove_table("a", &mut tx).unwrap();
        assert!(!ctx.contains_table("a", &tx).unwrap());
        ctx.add_table(Handle::from_raw(0), "a", None, &mut tx).unwrap();
        assert_eq!(
            ctx.get_node_name(Handle::from_raw(0), Handle::from_raw(3), &tx)
                .unwrap(),
            None
        );
        ctx.remove_table("gone", &mut tx).unwrap();
    }

    #[test]
    fn readded_table_forgets_former_node_names() {
        let ctx = tables();
        let mut tx = MemoryStore::new().begin();
        ctx.add_table(Handle::from_raw(0), "a", Some("ip4-classify"), &mut tx)
            .unwrap();
        ctx.add_node_name("a", Handle::from_raw(3), "ip4-rewrite", &mut tx)
            .unwrap();
        // same index and base node: nothing to forget
        ctx.add_table(Handle::from_raw(0), "a", Some("ip4-classify"), &mut tx)
            .unwrap();
        assert_eq!(
            ctx.get_node_name(Handle::from_raw(0), Handle::from_raw(3), &tx)
                .unwrap()
                .as_deref(),
            Some("ip4-rewrite")
        );
        ctx.add_table(Handle::from_raw(5), "a", Some("ip6-classify"), &mut tx)
            .unwrap();
        assert_eq!(
            ctx.get_node_name(Handle::from_raw(5), Handle::from_raw(3), &tx)
                .unwrap(),
            None
        );
        assert_eq!(ctx.get_table_index("a", &tx).unwrap(), Handle::from_raw(5));
        assert_eq!(
            ctx.get_table_base_node("a", &tx).unwrap().as_deref(),
            Some("ip6-classify")
        );
    }

    #[test]
    #[traced_test]
    fn reused_index_drops_stale_table() {
        let ctx = tables();
        let mut tx = MemoryStore::new().begin();
        ctx.add_table(Handle::from_raw(4), "old", None, &mut tx).unwrap();
        ctx.add_table(Handle::from_raw(4), "new", None, &mut tx).unwrap();
        assert!(!ctx.contains_table("old", &tx).unwrap());
        assert_eq!(
            ctx.get_table_name(Handle::from_raw(4), &mut tx).unwrap(),
            "new"
        );
        assert!(logs_contain("dropping table old"));
    }
}

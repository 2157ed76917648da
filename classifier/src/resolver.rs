// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Translation of next nodes to relative indices and back.
//!
//! The dataplane answers "which index does node N have among the next nodes of node B", and
//! nothing else. Every node name resolved for writing is recorded along with the index it got, so
//! that the index can be read back as a name. Indices that were never resolved that way read as
//! plain numbers.

use crate::context::VppClassifierContextManager;
use crate::node::{PacketHandlingAction, VppNode};
use crate::table::Table;
use handle::Handle;
use handle::kind::ClassifyTable;
use naming::{MappingError, MappingResult, reply_for_write};
use std::sync::Arc;
use store::MappingStore;
use tracing::{debug, trace};
use vppapi::{ClassifyApi, GetNextIndex};

pub struct NodeResolver<A: ?Sized> {
    api: Arc<A>,
    tables: VppClassifierContextManager,
}

impl<A: ClassifyApi + ?Sized> NodeResolver<A> {
    pub fn new(api: Arc<A>, tables: VppClassifierContextManager) -> Self {
        Self { api, tables }
    }

    #[must_use]
    pub fn tables(&self) -> &VppClassifierContextManager {
        &self.tables
    }

    /// The index to write for `node` in a request about `table`.
    ///
    /// Named nodes are looked up among the next nodes of the classifier node of `table`, and the
    /// resulting index is recorded for `table`.
    ///
    /// # Errors
    ///
    /// [`MappingError::InvalidArgument`] if `node` is named and `table` has no classifier node,
    /// [`MappingError::WriteFailed`] if the dataplane can not resolve the name.
    pub fn resolve<S: MappingStore + ?Sized>(
        &self,
        node: &VppNode,
        table: &Table,
        store: &mut S,
    ) -> MappingResult<u32> {
        let name = match node {
            VppNode::Action(action) => return Ok(action.value()),
            VppNode::Index(index) => return Ok(*index),
            VppNode::Named(name) => name,
        };
        let Some(base) = &table.classifier_node else {
            return Err(MappingError::InvalidArgument(format!(
                "Node {name} is relative to the classifier node of table {}, which has none",
                table.name
            )));
        };
        let reply = reply_for_write(
            self.api.get_next_index(&GetNextIndex {
                node_name: base.clone(),
                next_name: name.clone(),
            }),
            &format!("resolve node {name} relative to {base}"),
        )?;
        debug!(
            "Node {name} is next {} of {base} (table {})",
            reply.next_index, table.name
        );
        self.tables
            .add_node_name(&table.name, Handle::from_raw(reply.next_index), name, store)?;
        Ok(reply.next_index)
    }

    /// What relative index `raw` of the table at `table_index` stands for.
    pub fn read_vpp_node<S: MappingStore + ?Sized>(
        &self,
        table_index: Handle<ClassifyTable>,
        raw: u32,
        store: &S,
    ) -> MappingResult<VppNode> {
        if let Some(action) = PacketHandlingAction::from_value(raw) {
            return Ok(VppNode::Action(action));
        }
        match self
            .tables
            .get_node_name(table_index, Handle::from_raw(raw), store)?
        {
            Some(name) => Ok(VppNode::Named(name)),
            None => {
                trace!("Next {raw} of classify table {table_index} was never named");
                Ok(VppNode::Index(raw))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;
    use pretty_assertions::assert_eq;
    use store::MemoryStore;
    use vppapi::{ApiError, FakeVpp};

    fn setup() -> (Arc<FakeVpp>, NodeResolver<FakeVpp>) {
        let vpp = Arc::new(FakeVpp::new());
        let tables = VppClassifierContextManager::new("classify-table-context", "classify-table-");
        (vpp.clone(), NodeResolver::new(vpp, tables))
    }

    fn table(name: &str, base: Option<&str>) -> Table {
        let mut builder = TableBuilder::default();
        builder
            .name(name)
            .nbuckets(2u32)
            .memory_size(4096u32)
            .miss_next(PacketHandlingAction::Deny)
            .mask(vec![0u8; 16]);
        if let Some(base) = base {
            builder.classifier_node(base);
        }
        builder.build().unwrap()
    }

    #[test]
    fn named_node_roundtrips_through_the_table() {
        let (vpp, resolver) = setup();
        let mut tx = MemoryStore::new().begin();
        let t = table("t", Some("ip4-classify"));
        resolver
            .tables()
            .add_table(Handle::from_raw(0), "t", Some("ip4-classify"), &mut tx)
            .unwrap();

        let k = resolver
            .resolve(&VppNode::named("ip4-rewrite"), &t, &mut tx)
            .unwrap();
        assert_ne!(k, 0);
        assert_eq!(vpp.calls("get_next_index"), 1);
        assert_eq!(
            resolver.read_vpp_node(Handle::from_raw(0), k, &tx).unwrap(),
            VppNode::named("ip4-rewrite")
        );
        assert_eq!(
            resolver.read_vpp_node(Handle::from_raw(0), 42, &tx).unwrap(),
            VppNode::Index(42)
        );
    }

    #[test]
    fn actions_need_no_lookup() {
        let (vpp, resolver) = setup();
        let mut tx = MemoryStore::new().begin();
        let t = table("t", None);
        for action in [PacketHandlingAction::Deny, PacketHandlingAction::Permit] {
            let raw = resolver.resolve(&action.into(), &t, &mut tx).unwrap();
            assert_eq!(raw, action.value());
            assert_eq!(
                resolver.read_vpp_node(Handle::from_raw(0), raw, &tx).unwrap(),
                VppNode::Action(action)
            );
        }
        assert_eq!(vpp.calls("get_next_index"), 0);
    }

    #[test]
    fn named_node_without_classifier_node_is_invalid() {
        let (vpp, resolver) = setup();
        let mut tx = MemoryStore::new().begin();
        let err = resolver
            .resolve(&VppNode::named("ip4-rewrite"), &table("t", None), &mut tx)
            .unwrap_err();
        assert!(matches!(err, MappingError::InvalidArgument(_)));
        assert_eq!(vpp.calls("get_next_index"), 0);
    }

    #[test]
    fn dataplane_failure_is_a_write_failure() {
        let (vpp, resolver) = setup();
        let mut tx = MemoryStore::new().begin();
        vpp.fail_next(
            "get_next_index",
            ApiError::Retval {
                op: "get_next_index",
                retval: -7,
            },
        );
        let err = resolver
            .resolve(
                &VppNode::named("ip4-rewrite"),
                &table("t", Some("ip4-classify")),
                &mut tx,
            )
            .unwrap_err();
        assert!(matches!(err, MappingError::WriteFailed { .. }));
    }
}

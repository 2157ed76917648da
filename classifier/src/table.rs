// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Classify tables.

use crate::context::VppClassifierContextManager;
use crate::dump::{ClassifyTableIds, ClassifyTableInfo};
use crate::node::VppNode;
use crate::resolver::NodeResolver;
use derive_builder::Builder;
use handle::Handle;
use handle::kind::ClassifyTable;
use naming::{MappingError, MappingResult, reply_for_read, reply_for_write};
use std::sync::Arc;
use store::{MappingStore, TxContext};
#[allow(unused)]
use tracing::{debug, trace};
use vppapi::{ClassifyAddDelTable, ClassifyApi, NOT_ASSIGNED};

/// Size of a match vector, in bytes.
pub const VECTOR_SIZE: usize = 16;

/// A classify table, as configured.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(setter(into))]
pub struct Table {
    pub name: String,
    /// The node next indices are relative to. Required to use named nodes.
    #[builder(setter(into, strip_option), default)]
    pub classifier_node: Option<String>,
    pub nbuckets: u32,
    pub memory_size: u32,
    #[builder(default)]
    pub skip_n_vectors: u32,
    #[builder(setter(into, strip_option), default)]
    pub next_table: Option<String>,
    pub miss_next: VppNode,
    pub mask: Vec<u8>,
}

impl Table {
    fn match_n_vectors(&self) -> MappingResult<u32> {
        if self.mask.is_empty() || self.mask.len() % VECTOR_SIZE != 0 {
            return Err(MappingError::InvalidArgument(format!(
                "Mask of classify table {} is {} bytes long, expected a non-zero multiple of {VECTOR_SIZE}",
                self.name,
                self.mask.len()
            )));
        }
        u32::try_from(self.mask.len() / VECTOR_SIZE).map_err(|_| {
            MappingError::InvalidArgument(format!("Mask of classify table {} is too long", self.name))
        })
    }
}

/// A classify table, as read from the dataplane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableState {
    pub name: String,
    pub classifier_node: Option<String>,
    pub nbuckets: u32,
    pub skip_n_vectors: u32,
    pub match_n_vectors: u32,
    pub next_table: Option<String>,
    pub miss_next: VppNode,
    pub mask: Vec<u8>,
    pub active_sessions: u32,
}

pub struct ClassifyTableWriter<A: ?Sized> {
    api: Arc<A>,
    resolver: NodeResolver<A>,
}

impl<A: ClassifyApi + ?Sized> ClassifyTableWriter<A> {
    pub fn new(api: Arc<A>, tables: VppClassifierContextManager) -> Self {
        Self {
            resolver: NodeResolver::new(api.clone(), tables),
            api,
        }
    }

    fn tables(&self) -> &VppClassifierContextManager {
        self.resolver.tables()
    }

    /// Create `table` and record the index the dataplane gave it.
    ///
    /// # Errors
    ///
    /// [`MappingError::InvalidArgument`] if a table with the same name exists or the mask is
    /// malformed, [`MappingError::NotFound`] if the next table does not exist,
    /// [`MappingError::WriteFailed`] if the dataplane refuses the table.
    pub fn create<S: MappingStore + ?Sized>(
        &self,
        table: &Table,
        store: &mut S,
    ) -> MappingResult<Handle<ClassifyTable>> {
        if self.tables().contains_table(&table.name, store)? {
            return Err(MappingError::InvalidArgument(format!(
                "Classify table {} already exists",
                table.name
            )));
        }
        let match_n_vectors = table.match_n_vectors()?;
        let next_table_index = match &table.next_table {
            Some(next) => self.tables().get_table_index(next, store)?.into_raw(),
            None => NOT_ASSIGNED,
        };
        let miss_next_index = self.resolver.resolve(&table.miss_next, table, store)?;
        let reply = reply_for_write(
            self.api.classify_add_del_table(&ClassifyAddDelTable {
                is_add: true,
                table_index: NOT_ASSIGNED,
                nbuckets: table.nbuckets,
                memory_size: table.memory_size,
                skip_n_vectors: table.skip_n_vectors,
                match_n_vectors,
                next_table_index,
                miss_next_index,
                mask: table.mask.clone(),
            }),
            &format!("create classify table {}", table.name),
        )?;
        let index = Handle::from_raw(reply.new_table_index);
        self.tables().add_table(
            index,
            &table.name,
            table.classifier_node.as_deref(),
            store,
        )?;
        debug!("Created classify table {} at {index}", table.name);
        Ok(index)
    }

    /// Delete table `name`.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if table `name` was never created.
    pub fn delete<S: MappingStore + ?Sized>(&self, name: &str, store: &mut S) -> MappingResult<()> {
        let index = self.tables().get_table_index(name, store)?;
        reply_for_write(
            self.api.classify_add_del_table(&ClassifyAddDelTable {
                is_add: false,
                table_index: index.into_raw(),
                nbuckets: 0,
                memory_size: 0,
                skip_n_vectors: 0,
                match_n_vectors: 0,
                next_table_index: NOT_ASSIGNED,
                miss_next_index: NOT_ASSIGNED,
                mask: vec![],
            }),
            &format!("delete classify table {name}"),
        )?;
        debug!("Deleted classify table {name} at {index}");
        self.tables().remove_table(name, store)
    }
}

pub struct ClassifyTableReader<A: ?Sized> {
    api: Arc<A>,
    resolver: NodeResolver<A>,
}

impl<A: ClassifyApi + ?Sized> ClassifyTableReader<A> {
    pub fn new(api: Arc<A>, tables: VppClassifierContextManager) -> Self {
        Self {
            resolver: NodeResolver::new(api.clone(), tables),
            api,
        }
    }

    /// The names of every table of the dataplane. Tables created behind the back of the
    /// management plane are given artificial names.
    pub fn all_tables<S: MappingStore>(&self, tx: &mut TxContext<S>) -> MappingResult<Vec<String>> {
        let ids = tx
            .cache_mut()
            .get_or_dump::<ClassifyTableIds, _>(&(), |()| {
                reply_for_read(self.api.classify_table_ids(), "dump classify table ids")
            })?;
        ids.iter()
            .map(|id| {
                let name = self
                    .resolver
                    .tables()
                    .get_table_name(Handle::from_raw(*id), tx.mapping_mut())?;
                trace!("Classify table {name} is at {id}");
                Ok::<_, MappingError>(name)
            })
            .collect()
    }

    /// Read table `name`. `None` if the table was never created.
    ///
    /// # Errors
    ///
    /// Fails if the dataplane can not be read.
    pub fn read<S: MappingStore>(
        &self,
        name: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Option<TableState>> {
        let tables = self.resolver.tables();
        if !tables.contains_table(name, tx.mapping())? {
            debug!("Classify table {name} is not mapped");
            return Ok(None);
        }
        let index = tables.get_table_index(name, tx.mapping())?;
        let info = tx
            .cache_mut()
            .get_or_dump::<ClassifyTableInfo, _>(&index.into_raw(), |id| {
                reply_for_read(
                    self.api.classify_table_info(*id),
                    &format!("read classify table {name}"),
                )
            })?;
        let next_table = match Handle::try_from_raw(info.next_table_index) {
            Some(next) => Some(tables.get_table_name(next, tx.mapping_mut())?),
            None => None,
        };
        Ok(Some(TableState {
            name: name.to_owned(),
            classifier_node: tables.get_table_base_node(name, tx.mapping())?,
            nbuckets: info.nbuckets,
            skip_n_vectors: info.skip_n_vectors,
            match_n_vectors: info.match_n_vectors,
            next_table,
            miss_next: self
                .resolver
                .read_vpp_node(index, info.miss_next_index, tx.mapping())?,
            mask: info.mask.clone(),
            active_sessions: info.active_sessions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PacketHandlingAction;
    use pretty_assertions::assert_eq;
    use store::MemoryStore;
    use vppapi::FakeVpp;

    fn tables() -> VppClassifierContextManager {
        VppClassifierContextManager::new("classify-table-context", "classify-table-")
    }

    fn setup() -> (
        Arc<FakeVpp>,
        ClassifyTableWriter<FakeVpp>,
        ClassifyTableReader<FakeVpp>,
    ) {
        let vpp = Arc::new(FakeVpp::new());
        (
            vpp.clone(),
            ClassifyTableWriter::new(vpp.clone(), tables()),
            ClassifyTableReader::new(vpp, tables()),
        )
    }

    fn base_table(name: &str) -> TableBuilder {
        let mut builder = TableBuilder::default();
        builder
            .name(name)
            .classifier_node("ip4-classify")
            .nbuckets(2u32)
            .memory_size(2u32 << 20)
            .miss_next(PacketHandlingAction::Permit)
            .mask(vec![0xffu8; 32]);
        builder
    }

    #[test]
    fn created_table_reads_back() {
        let (_, writer, reader) = setup();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        let first = base_table("first").build().unwrap();
        writer.create(&first, tx.mapping_mut()).unwrap();
        let second = base_table("second")
            .next_table("first")
            .miss_next(VppNode::named("ip4-lookup"))
            .build()
            .unwrap();
        writer.create(&second, tx.mapping_mut()).unwrap();

        let state = reader.read("second", &mut tx).unwrap().unwrap();
        assert_eq!(state.next_table.as_deref(), Some("first"));
        assert_eq!(state.miss_next, VppNode::named("ip4-lookup"));
        assert_eq!(state.classifier_node.as_deref(), Some("ip4-classify"));
        assert_eq!(state.match_n_vectors, 2);
        assert_eq!(state.active_sessions, 0);

        let state = reader.read("first", &mut tx).unwrap().unwrap();
        assert_eq!(state.next_table, None);
        assert_eq!(state.miss_next, VppNode::Action(PacketHandlingAction::Permit));
    }

    #[test]
    fn unmapped_table_reads_none() {
        let (vpp, _, reader) = setup();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        assert_eq!(reader.read("nope", &mut tx).unwrap(), None);
        assert_eq!(vpp.calls("classify_table_info"), 0);
    }

    #[test]
    fn tables_created_elsewhere_are_listed_with_artificial_names() {
        let (vpp, writer, reader) = setup();
        let mut tx = TxContext::new(MemoryStore::new().begin());
        writer
            .create(&base_table("mine").build().unwrap(), tx.mapping_mut())
            .unwrap();
        vpp.classify_add_del_table(&ClassifyAddDelTable {
            is_add: true,
            table_index: NOT_ASSIGNED,
            nbuckets: 1,
            memory_size: 1,
            skip_n_vectors: 0,
            match_n_vectors: 1,
            next_table_index: NOT_ASSIGNED,
            miss_next_index: 0,
            mask: vec![0; 16],
        })
        .unwrap();
        assert_eq!(
            reader.all_tables(&mut tx).unwrap(),
            vec!["mine".to_owned(), "classify-table-1".to_owned()]
        );
        let foreign = reader.read("classify-table-1", &mut tx).unwrap().unwrap();
        assert_eq!(foreign.classifier_node, None);
        assert_eq!(foreign.miss_next, VppNode::Action(PacketHandlingAction::Deny));
    }

    #[test]
    fn malformed_mask_is_refused() {
        let (vpp, writer, _) = setup();
        let mut tx = MemoryStore::new().begin();
        let table = base_table("t").mask(vec![0u8; 20]).build().unwrap();
        assert!(matches!(
            writer.create(&table, &mut tx),
            Err(MappingError::InvalidArgument(_))
        ));
        assert_eq!(vpp.calls("classify_add_del_table"), 0);
    }

    #[test]
    fn unknown_next_table_is_not_found() {
        let (_, writer, _) = setup();
        let mut tx = MemoryStore::new().begin();
        let table = base_table("t").next_table("nope").build().unwrap();
        assert!(writer.create(&table, &mut tx).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_unmaps_and_frees_the_index() {
        let (vpp, writer, _) = setup();
        let mut tx = MemoryStore::new().begin();
        let index = writer
            .create(&base_table("t").build().unwrap(), &mut tx)
            .unwrap();
        writer.delete("t", &mut tx).unwrap();
        assert!(!tables().contains_table("t", &tx).unwrap());
        assert!(vpp.classify_table_ids().unwrap().is_empty());
        let again = writer
            .create(&base_table("u").build().unwrap(), &mut tx)
            .unwrap();
        assert_eq!(index, again);
        assert!(writer.delete("t", &mut tx).unwrap_err().is_not_found());
    }
}

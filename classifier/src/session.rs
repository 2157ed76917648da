// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Classify sessions. A session is identified by its match within its table.

use crate::context::VppClassifierContextManager;
use crate::dump::ClassifySessionDump;
use crate::node::VppNode;
use crate::resolver::NodeResolver;
use crate::table::Table;
use derive_builder::Builder;
use naming::{MappingError, MappingResult, reply_for_read, reply_for_write};
use std::sync::Arc;
use store::{MappingStore, TxContext};
use tracing::debug;
use vppapi::{ClassifyAddDelSession, ClassifyApi, ClassifySessionDetails, NOT_ASSIGNED};

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(setter(into))]
pub struct Session {
    pub match_bytes: Vec<u8>,
    pub hit_next: VppNode,
    /// Either a node or a plain number. Unset is `~0` on the wire.
    #[builder(setter(into, strip_option), default)]
    pub opaque_index: Option<VppNode>,
    #[builder(default)]
    pub advance: i32,
}

pub struct ClassifySessionWriter<A: ?Sized> {
    api: Arc<A>,
    resolver: NodeResolver<A>,
}

impl<A: ClassifyApi + ?Sized> ClassifySessionWriter<A> {
    pub fn new(api: Arc<A>, tables: VppClassifierContextManager) -> Self {
        Self {
            resolver: NodeResolver::new(api.clone(), tables),
            api,
        }
    }

    fn add_del<S: MappingStore + ?Sized>(
        &self,
        is_add: bool,
        table: &Table,
        session: &Session,
        store: &mut S,
    ) -> MappingResult<()> {
        let table_index = self.resolver.tables().get_table_index(&table.name, store)?;
        let hit_next_index = self.resolver.resolve(&session.hit_next, table, store)?;
        let opaque_index = match &session.opaque_index {
            Some(opaque) => self.resolver.resolve(opaque, table, store)?,
            None => NOT_ASSIGNED,
        };
        let op = if is_add { "add" } else { "delete" };
        reply_for_write(
            self.api.classify_add_del_session(&ClassifyAddDelSession {
                is_add,
                table_index: table_index.into_raw(),
                hit_next_index,
                opaque_index,
                advance: session.advance,
                match_bytes: session.match_bytes.clone(),
            }),
            &format!("{op} session of classify table {}", table.name),
        )?;
        debug!(
            "Classify session {:02x?} of table {} ({op}), hit next {}",
            session.match_bytes, table.name, session.hit_next
        );
        Ok(())
    }

    /// Add `session` to `table`, which must have been created.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if `table` was never created, or the errors of
    /// [`NodeResolver::resolve`].
    pub fn create<S: MappingStore + ?Sized>(
        &self,
        table: &Table,
        session: &Session,
        store: &mut S,
    ) -> MappingResult<()> {
        self.add_del(true, table, session, store)
    }

    pub fn delete<S: MappingStore + ?Sized>(
        &self,
        table: &Table,
        session: &Session,
        store: &mut S,
    ) -> MappingResult<()> {
        self.add_del(false, table, session, store)
    }
}

pub struct ClassifySessionReader<A: ?Sized> {
    api: Arc<A>,
    resolver: NodeResolver<A>,
}

impl<A: ClassifyApi + ?Sized> ClassifySessionReader<A> {
    pub fn new(api: Arc<A>, tables: VppClassifierContextManager) -> Self {
        Self {
            resolver: NodeResolver::new(api.clone(), tables),
            api,
        }
    }

    fn sessions<S: MappingStore>(
        &self,
        table_name: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Arc<Vec<ClassifySessionDetails>>> {
        let tables = self.resolver.tables();
        if !tables.contains_table(table_name, tx.mapping())? {
            return Err(MappingError::IllegalState(format!(
                "Reading sessions of classify table {table_name}, which is not mapped"
            )));
        }
        let index = tables.get_table_index(table_name, tx.mapping())?;
        tx.cache_mut()
            .get_or_dump::<ClassifySessionDump, _>(&index.into_raw(), |id| {
                reply_for_read(
                    self.api.classify_session_dump(*id),
                    &format!("dump sessions of classify table {table_name}"),
                )
            })
    }

    /// The matches of the sessions of table `table_name`.
    ///
    /// # Errors
    ///
    /// [`MappingError::IllegalState`] if the table is not mapped.
    pub fn session_keys<S: MappingStore>(
        &self,
        table_name: &str,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Vec<Vec<u8>>> {
        Ok(self
            .sessions(table_name, tx)?
            .iter()
            .map(|s| s.match_bytes.clone())
            .collect())
    }

    /// Read the session of table `table_name` with match `match_bytes`, if any.
    ///
    /// # Errors
    ///
    /// [`MappingError::IllegalState`] if the table is not mapped, or if several sessions have
    /// that match.
    pub fn read<S: MappingStore>(
        &self,
        table_name: &str,
        match_bytes: &[u8],
        tx: &mut TxContext<S>,
    ) -> MappingResult<Option<Session>> {
        let sessions = self.sessions(table_name, tx)?;
        let mut found = sessions.iter().filter(|s| s.match_bytes == match_bytes);
        let Some(detail) = found.next() else {
            return Ok(None);
        };
        let extra = found.count();
        if extra > 0 {
            return Err(MappingError::IllegalState(format!(
                "Found {} classify sessions with match {match_bytes:02x?} in table {table_name}",
                extra + 1
            )));
        }
        let table_index = handle::Handle::from_raw(detail.table_id);
        let hit_next = self
            .resolver
            .read_vpp_node(table_index, detail.hit_next_index, tx.mapping())?;
        let opaque_index = match detail.opaque_index {
            NOT_ASSIGNED => None,
            raw => Some(self.resolver.read_vpp_node(table_index, raw, tx.mapping())?),
        };
        Ok(Some(Session {
            match_bytes: detail.match_bytes.clone(),
            hit_next,
            opaque_index,
            advance: detail.advance,
        }))
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! An in-memory dataplane, for tests.
//!
//! [`FakeVpp`] keeps just enough state to answer every call of the client traits consistently:
//! objects created can be dumped, deleted objects disappear, and indices are allocated the way the
//! dataplane allocates them from its pools (lowest free slot first, so that a slot freed by a
//! delete is handed out again by the next create).
//!
//! Every call is counted per operation, and failures can be injected per operation.

use crate::{
    AclAddReplace, AclAddReplaceReply, AclApi, AclDetails, AclInterfaceListDetails,
    AclInterfaceSetAclList, AclRule, ApiError, ApiResult, ClassifyAddDelSession,
    ClassifyAddDelTable, ClassifyAddDelTableReply, ClassifyApi, ClassifySessionDetails,
    ClassifyTableInfoReply, GetNextIndex, GetNextIndexReply, GreTunnel, GreTunnelAddDelReply,
    InterfaceApi, IpsecApi, IpsecSaDetails, IpsecSadAddDelEntry, MacipAclAdd, MacipAclAddReply,
    MacipAclDetails, MacipAclInterfaceGetReply, MacipAclRule, NOT_ASSIGNED, SwInterfaceDetails,
    SwInterfaceDump,
};
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

const NO_SUCH_ENTRY: i32 = -6;
const INVALID_VALUE: i32 = -7;
const VALUE_EXIST: i32 = -17;

/// The next nodes every classifier node starts with.
const DEFAULT_NEXT_NODES: [&str; 1] = ["error-drop"];

/// A pool of objects indexed by the slot they occupy.
#[derive(Debug)]
struct Pool<T>(BTreeMap<u32, T>);

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T> Pool<T> {
    fn insert(&mut self, value: T) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let slot = (0u32..)
            .zip(self.0.keys())
            .find(|(expected, used)| expected != *used)
            .map_or(self.0.len() as u32, |(free, _)| free);
        self.0.insert(slot, value);
        slot
    }
}

#[derive(Debug)]
struct Interface {
    name: String,
    admin_up: bool,
    link_up: bool,
    link_mtu: u16,
    gre: Option<GreTunnel>,
}

#[derive(Debug)]
struct Table {
    request: ClassifyAddDelTable,
    sessions: Vec<ClassifySessionDetails>,
}

#[derive(Debug, Default)]
struct State {
    calls: BTreeMap<&'static str, usize>,
    failures: BTreeMap<&'static str, VecDeque<ApiError>>,
    interfaces: Pool<Interface>,
    tables: Pool<Table>,
    next_nodes: BTreeMap<String, Vec<String>>,
    acls: Pool<(String, Vec<AclRule>)>,
    acl_interfaces: BTreeMap<u32, (u8, Vec<u32>)>,
    macip_acls: Pool<(String, Vec<MacipAclRule>)>,
    macip_interfaces: BTreeMap<u32, u32>,
    sads: BTreeMap<u32, IpsecSadAddDelEntry>,
}

#[derive(Debug, Default)]
pub struct FakeVpp {
    state: Mutex<State>,
}

impl FakeVpp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a call to `op`, failing it if a failure was injected.
    fn call(&self, op: &'static str) -> ApiResult<MutexGuard<'_, State>> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_default() += 1;
        if let Some(err) = state.failures.get_mut(op).and_then(VecDeque::pop_front) {
            trace!("{op}: injected failure {err}");
            return Err(err);
        }
        trace!("{op}");
        Ok(state)
    }

    /// Number of times `op` was called (failed calls included).
    #[must_use]
    pub fn calls(&self, op: &str) -> usize {
        self.state.lock().calls.get(op).copied().unwrap_or(0)
    }

    /// Make the next call to `op` fail with `err`. Failures queue up.
    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.state.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Create an interface out of band (as a physical NIC showing up would).
    pub fn add_interface(&self, name: &str) -> u32 {
        self.state.lock().interfaces.insert(Interface {
            name: name.to_owned(),
            admin_up: false,
            link_up: false,
            link_mtu: 1500,
            gre: None,
        })
    }

    /// Remove an interface out of band.
    pub fn remove_interface(&self, sw_if_index: u32) {
        self.state.lock().interfaces.0.remove(&sw_if_index);
    }

    /// Apply standard ACLs to an interface out of band.
    pub fn set_interface_acls(&self, sw_if_index: u32, n_input: u8, acls: &[u32]) {
        self.state
            .lock()
            .acl_interfaces
            .insert(sw_if_index, (n_input, acls.to_vec()));
    }

    /// Add a session to a table out of band.
    pub fn add_session(&self, session: ClassifySessionDetails) {
        if let Some(table) = self.state.lock().tables.0.get_mut(&session.table_id) {
            table.sessions.push(session);
        }
    }

    /// The request that installed SA `sad_id`, keys included.
    #[must_use]
    pub fn sad(&self, sad_id: u32) -> Option<IpsecSadAddDelEntry> {
        self.state.lock().sads.get(&sad_id).cloned()
    }
}

impl InterfaceApi for FakeVpp {
    fn sw_interface_dump(&self, request: &SwInterfaceDump) -> ApiResult<Vec<SwInterfaceDetails>> {
        let state = self.call("sw_interface_dump")?;
        Ok(state
            .interfaces
            .0
            .iter()
            .filter(|(_, i)| {
                request
                    .name_filter
                    .as_deref()
                    .is_none_or(|filter| i.name.contains(filter))
            })
            .map(|(index, i)| SwInterfaceDetails {
                sw_if_index: *index,
                interface_name: i.name.clone(),
                admin_up: i.admin_up,
                link_up: i.link_up,
                link_mtu: i.link_mtu,
            })
            .collect())
    }

    fn gre_tunnel_add_del(
        &self,
        is_add: bool,
        tunnel: &GreTunnel,
    ) -> ApiResult<GreTunnelAddDelReply> {
        const OP: &str = "gre_tunnel_add_del";
        let mut state = self.call(OP)?;
        let existing = state
            .interfaces
            .0
            .iter()
            .find(|(_, i)| i.gre.as_ref() == Some(tunnel))
            .map(|(index, _)| *index);
        match (is_add, existing) {
            (true, Some(_)) => Err(ApiError::Retval {
                op: OP,
                retval: VALUE_EXIST,
            }),
            (true, None) => {
                let name = (0..)
                    .map(|instance| format!("gre{instance}"))
                    .find(|name| state.interfaces.0.values().all(|i| i.name != *name))
                    .unwrap_or_default();
                let sw_if_index = state.interfaces.insert(Interface {
                    name,
                    admin_up: false,
                    link_up: true,
                    link_mtu: 1476,
                    gre: Some(*tunnel),
                });
                Ok(GreTunnelAddDelReply { sw_if_index })
            }
            (false, Some(sw_if_index)) => {
                state.interfaces.0.remove(&sw_if_index);
                Ok(GreTunnelAddDelReply { sw_if_index })
            }
            (false, None) => Err(ApiError::Retval {
                op: OP,
                retval: NO_SUCH_ENTRY,
            }),
        }
    }
}

impl ClassifyApi for FakeVpp {
    fn classify_add_del_table(
        &self,
        request: &ClassifyAddDelTable,
    ) -> ApiResult<ClassifyAddDelTableReply> {
        const OP: &str = "classify_add_del_table";
        let mut state = self.call(OP)?;
        if request.is_add {
            let new_table_index = state.tables.insert(Table {
                request: request.clone(),
                sessions: vec![],
            });
            Ok(ClassifyAddDelTableReply {
                new_table_index,
                skip_n_vectors: request.skip_n_vectors,
                match_n_vectors: request.match_n_vectors,
            })
        } else {
            let table = state
                .tables
                .0
                .remove(&request.table_index)
                .ok_or(ApiError::Retval {
                    op: OP,
                    retval: NO_SUCH_ENTRY,
                })?;
            Ok(ClassifyAddDelTableReply {
                new_table_index: NOT_ASSIGNED,
                skip_n_vectors: table.request.skip_n_vectors,
                match_n_vectors: table.request.match_n_vectors,
            })
        }
    }

    fn classify_table_ids(&self) -> ApiResult<Vec<u32>> {
        let state = self.call("classify_table_ids")?;
        Ok(state.tables.0.keys().copied().collect())
    }

    fn classify_table_info(&self, table_id: u32) -> ApiResult<ClassifyTableInfoReply> {
        const OP: &str = "classify_table_info";
        let state = self.call(OP)?;
        let table = state.tables.0.get(&table_id).ok_or(ApiError::Retval {
            op: OP,
            retval: NO_SUCH_ENTRY,
        })?;
        #[allow(clippy::cast_possible_truncation)]
        let active_sessions = table.sessions.len() as u32;
        Ok(ClassifyTableInfoReply {
            table_id,
            nbuckets: table.request.nbuckets,
            match_n_vectors: table.request.match_n_vectors,
            skip_n_vectors: table.request.skip_n_vectors,
            active_sessions,
            next_table_index: table.request.next_table_index,
            miss_next_index: table.request.miss_next_index,
            mask: table.request.mask.clone(),
        })
    }

    fn classify_add_del_session(&self, request: &ClassifyAddDelSession) -> ApiResult<()> {
        const OP: &str = "classify_add_del_session";
        let mut state = self.call(OP)?;
        let table = state
            .tables
            .0
            .get_mut(&request.table_index)
            .ok_or(ApiError::Retval {
                op: OP,
                retval: NO_SUCH_ENTRY,
            })?;
        let position = table
            .sessions
            .iter()
            .position(|s| s.match_bytes == request.match_bytes);
        match (request.is_add, position) {
            (true, position) => {
                let session = ClassifySessionDetails {
                    table_id: request.table_index,
                    hit_next_index: request.hit_next_index,
                    opaque_index: request.opaque_index,
                    advance: request.advance,
                    match_bytes: request.match_bytes.clone(),
                };
                match position {
                    Some(position) => table.sessions[position] = session,
                    None => table.sessions.push(session),
                }
                Ok(())
            }
            (false, Some(position)) => {
                table.sessions.remove(position);
                Ok(())
            }
            (false, None) => Err(ApiError::Retval {
                op: OP,
                retval: NO_SUCH_ENTRY,
            }),
        }
    }

    fn classify_session_dump(&self, table_id: u32) -> ApiResult<Vec<ClassifySessionDetails>> {
        let state = self.call("classify_session_dump")?;
        Ok(state
            .tables
            .0
            .get(&table_id)
            .map(|table| table.sessions.clone())
            .unwrap_or_default())
    }

    fn get_next_index(&self, request: &GetNextIndex) -> ApiResult<GetNextIndexReply> {
        const OP: &str = "get_next_index";
        let mut state = self.call(OP)?;
        if request.node_name.is_empty() || request.next_name.is_empty() {
            return Err(ApiError::Retval {
                op: OP,
                retval: INVALID_VALUE,
            });
        }
        let nexts = state
            .next_nodes
            .entry(request.node_name.clone())
            .or_insert_with(|| DEFAULT_NEXT_NODES.iter().map(|n| (*n).to_owned()).collect());
        let next_index = match nexts.iter().position(|n| *n == request.next_name) {
            Some(position) => position,
            None => {
                nexts.push(request.next_name.clone());
                nexts.len() - 1
            }
        };
        #[allow(clippy::cast_possible_truncation)]
        let next_index = next_index as u32;
        Ok(GetNextIndexReply { next_index })
    }
}

impl AclApi for FakeVpp {
    fn acl_add_replace(&self, request: &AclAddReplace) -> ApiResult<AclAddReplaceReply> {
        const OP: &str = "acl_add_replace";
        let mut state = self.call(OP)?;
        let entry = (request.tag.clone(), request.rules.clone());
        if request.acl_index == NOT_ASSIGNED {
            let acl_index = state.acls.insert(entry);
            return Ok(AclAddReplaceReply { acl_index });
        }
        match state.acls.0.get_mut(&request.acl_index) {
            Some(existing) => {
                *existing = entry;
                Ok(AclAddReplaceReply {
                    acl_index: request.acl_index,
                })
            }
            None => Err(ApiError::Retval {
                op: OP,
                retval: NO_SUCH_ENTRY,
            }),
        }
    }

    fn acl_del(&self, acl_index: u32) -> ApiResult<()> {
        const OP: &str = "acl_del";
        let mut state = self.call(OP)?;
        state.acls.0.remove(&acl_index).map(|_| ()).ok_or(ApiError::Retval {
            op: OP,
            retval: NO_SUCH_ENTRY,
        })
    }

    fn acl_dump(&self, acl_index: u32) -> ApiResult<Vec<AclDetails>> {
        let state = self.call("acl_dump")?;
        Ok(state
            .acls
            .0
            .iter()
            .filter(|(index, _)| acl_index == NOT_ASSIGNED || **index == acl_index)
            .map(|(index, (tag, rules))| AclDetails {
                acl_index: *index,
                tag: tag.clone(),
                rules: rules.clone(),
            })
            .collect())
    }

    fn acl_interface_list_dump(
        &self,
        sw_if_index: u32,
    ) -> ApiResult<Vec<AclInterfaceListDetails>> {
        let state = self.call("acl_interface_list_dump")?;
        Ok(state
            .acl_interfaces
            .iter()
            .filter(|(index, _)| sw_if_index == NOT_ASSIGNED || **index == sw_if_index)
            .map(|(index, (n_input, acls))| AclInterfaceListDetails {
                sw_if_index: *index,
                n_input: *n_input,
                acls: acls.clone(),
            })
            .collect())
    }

    fn acl_interface_set_acl_list(&self, request: &AclInterfaceSetAclList) -> ApiResult<()> {
        const OP: &str = "acl_interface_set_acl_list";
        let mut state = self.call(OP)?;
        if !state.interfaces.0.contains_key(&request.sw_if_index)
            || usize::from(request.n_input) > request.acls.len()
        {
            return Err(ApiError::Retval {
                op: OP,
                retval: INVALID_VALUE,
            });
        }
        if request.acls.is_empty() {
            state.acl_interfaces.remove(&request.sw_if_index);
        } else {
            state
                .acl_interfaces
                .insert(request.sw_if_index, (request.n_input, request.acls.clone()));
        }
        Ok(())
    }

    fn macip_acl_add(&self, request: &MacipAclAdd) -> ApiResult<MacipAclAddReply> {
        let mut state = self.call("macip_acl_add")?;
        let acl_index = state
            .macip_acls
            .insert((request.tag.clone(), request.rules.clone()));
        Ok(MacipAclAddReply { acl_index })
    }

    fn macip_acl_del(&self, acl_index: u32) -> ApiResult<()> {
        const OP: &str = "macip_acl_del";
        let mut state = self.call(OP)?;
        state
            .macip_acls
            .0
            .remove(&acl_index)
            .map(|_| ())
            .ok_or(ApiError::Retval {
                op: OP,
                retval: NO_SUCH_ENTRY,
            })
    }

    fn macip_acl_dump(&self, acl_index: u32) -> ApiResult<Vec<MacipAclDetails>> {
        let state = self.call("macip_acl_dump")?;
        Ok(state
            .macip_acls
            .0
            .iter()
            .filter(|(index, _)| acl_index == NOT_ASSIGNED || **index == acl_index)
            .map(|(index, (tag, rules))| MacipAclDetails {
                acl_index: *index,
                tag: tag.clone(),
                rules: rules.clone(),
            })
            .collect())
    }

    fn macip_acl_interface_add_del(
        &self,
        is_add: bool,
        sw_if_index: u32,
        acl_index: u32,
    ) -> ApiResult<()> {
        const OP: &str = "macip_acl_interface_add_del";
        let mut state = self.call(OP)?;
        if is_add {
            if !state.macip_acls.0.contains_key(&acl_index) {
                return Err(ApiError::Retval {
                    op: OP,
                    retval: NO_SUCH_ENTRY,
                });
            }
            state.macip_interfaces.insert(sw_if_index, acl_index);
        } else {
            state.macip_interfaces.remove(&sw_if_index);
        }
        Ok(())
    }

    fn macip_acl_interface_get(&self) -> ApiResult<MacipAclInterfaceGetReply> {
        let state = self.call("macip_acl_interface_get")?;
        let count = state
            .macip_interfaces
            .keys()
            .next_back()
            .map_or(0, |last| last + 1);
        let acls = (0..count)
            .map(|sw_if_index| {
                state
                    .macip_interfaces
                    .get(&sw_if_index)
                    .copied()
                    .unwrap_or(NOT_ASSIGNED)
            })
            .collect();
        Ok(MacipAclInterfaceGetReply { count, acls })
    }
}

impl IpsecApi for FakeVpp {
    fn ipsec_sad_add_del_entry(&self, request: &IpsecSadAddDelEntry) -> ApiResult<()> {
        const OP: &str = "ipsec_sad_add_del_entry";
        let mut state = self.call(OP)?;
        let present = state.sads.contains_key(&request.sad_id);
        match (request.is_add, present) {
            (true, false) => {
                state.sads.insert(request.sad_id, request.clone());
                Ok(())
            }
            (false, true) => {
                state.sads.remove(&request.sad_id);
                Ok(())
            }
            (true, true) => Err(ApiError::Retval {
                op: OP,
                retval: VALUE_EXIST,
            }),
            (false, false) => Err(ApiError::Retval {
                op: OP,
                retval: NO_SUCH_ENTRY,
            }),
        }
    }

    fn ipsec_sa_dump(&self, sa_id: u32) -> ApiResult<Vec<IpsecSaDetails>> {
        let state = self.call("ipsec_sa_dump")?;
        Ok(state
            .sads
            .values()
            .filter(|sa| sa_id == NOT_ASSIGNED || sa.sad_id == sa_id)
            .map(|sa| IpsecSaDetails {
                sa_id: sa.sad_id,
                spi: sa.spi,
                protocol: sa.protocol,
                crypto_alg: sa.crypto_algorithm,
                integ_alg: sa.integrity_algorithm,
                use_anti_replay: sa.use_anti_replay,
                is_tunnel: sa.is_tunnel,
                tunnel_src: sa.tunnel_src,
                tunnel_dst: sa.tunnel_dst,
            })
            .collect())
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Classifier messages, and the graph-node query used to resolve relative node indices.

use crate::ApiResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifyAddDelTable {
    pub is_add: bool,
    /// The table to delete. Ignored on add.
    pub table_index: u32,
    pub nbuckets: u32,
    pub memory_size: u32,
    pub skip_n_vectors: u32,
    pub match_n_vectors: u32,
    /// `~0` if there is no next table.
    pub next_table_index: u32,
    /// Relative to the classifier node the table is attached to.
    pub miss_next_index: u32,
    pub mask: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifyAddDelTableReply {
    pub new_table_index: u32,
    pub skip_n_vectors: u32,
    pub match_n_vectors: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifyTableInfoReply {
    pub table_id: u32,
    pub nbuckets: u32,
    pub match_n_vectors: u32,
    pub skip_n_vectors: u32,
    pub active_sessions: u32,
    pub next_table_index: u32,
    pub miss_next_index: u32,
    pub mask: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifyAddDelSession {
    pub is_add: bool,
    pub table_index: u32,
    pub hit_next_index: u32,
    pub opaque_index: u32,
    pub advance: i32,
    pub match_bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifySessionDetails {
    pub table_id: u32,
    pub hit_next_index: u32,
    pub opaque_index: u32,
    pub advance: i32,
    pub match_bytes: Vec<u8>,
}

/// Ask for the index of `next_name` among the next nodes of `node_name`, adding it if needed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetNextIndex {
    pub node_name: String,
    pub next_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GetNextIndexReply {
    pub next_index: u32,
}

pub trait ClassifyApi {
    fn classify_add_del_table(
        &self,
        request: &ClassifyAddDelTable,
    ) -> ApiResult<ClassifyAddDelTableReply>;

    fn classify_table_ids(&self) -> ApiResult<Vec<u32>>;

    fn classify_table_info(&self, table_id: u32) -> ApiResult<ClassifyTableInfoReply>;

    fn classify_add_del_session(&self, request: &ClassifyAddDelSession) -> ApiResult<()>;

    fn classify_session_dump(&self, table_id: u32) -> ApiResult<Vec<ClassifySessionDetails>>;

    /// The only node query the dataplane offers: name to relative index. There is no reverse.
    fn get_next_index(&self, request: &GetNextIndex) -> ApiResult<GetNextIndexReply>;
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use store::DumpKind;
use vppapi::{ClassifySessionDetails, ClassifyTableInfoReply};

/// `classify_table_ids`
pub struct ClassifyTableIds;

impl DumpKind for ClassifyTableIds {
    type Params = ();
    type Reply = Vec<u32>;
    const NAME: &'static str = "classify_table_ids";
}

/// `classify_table_info`, by table index.
pub struct ClassifyTableInfo;

impl DumpKind for ClassifyTableInfo {
    type Params = u32;
    type Reply = ClassifyTableInfoReply;
    const NAME: &'static str = "classify_table_info";
}

/// `classify_session_dump`, by table index. Tables can hold many sessions.
pub struct ClassifySessionDump;

impl DumpKind for ClassifySessionDump {
    type Params = u32;
    type Reply = Vec<ClassifySessionDetails>;
    const NAME: &'static str = "classify_session_dump";
}

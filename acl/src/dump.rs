// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The ACL dumps memoized per transaction.

use store::DumpKind;
use vppapi::{AclDetails, AclInterfaceListDetails, MacipAclDetails, MacipAclInterfaceGetReply};

/// `acl_dump`, by ACL index (`~0` for all).
pub struct AclDump;

impl DumpKind for AclDump {
    type Params = u32;
    type Reply = Vec<AclDetails>;
    const NAME: &'static str = "acl_dump";
}

/// `macip_acl_dump`, by ACL index (`~0` for all).
pub struct MacipAclDump;

impl DumpKind for MacipAclDump {
    type Params = u32;
    type Reply = Vec<MacipAclDetails>;
    const NAME: &'static str = "macip_acl_dump";
}

/// `acl_interface_list_dump`, by interface.
pub struct AclInterfaceListDump;

impl DumpKind for AclInterfaceListDump {
    type Params = u32;
    type Reply = Vec<AclInterfaceListDetails>;
    const NAME: &'static str = "acl_interface_list_dump";
}

/// `macip_acl_interface_get`: the MAC-IP ACL of every interface at once.
pub struct MacipAclInterfaceGet;

impl DumpKind for MacipAclInterfaceGet {
    type Params = ();
    type Reply = MacipAclInterfaceGetReply;
    const NAME: &'static str = "macip_acl_interface_get";
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use store::DumpKind;
use vppapi::IpsecSaDetails;

/// `ipsec_sa_dump`, by SA id (`~0` for all).
pub struct IpsecSaDump;

impl DumpKind for IpsecSaDump {
    type Params = u32;
    type Reply = Vec<IpsecSaDetails>;
    const NAME: &'static str = "ipsec_sa_dump";
}

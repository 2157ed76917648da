// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::collections::BTreeMap;
use store::DumpKind;
use vppapi::{SwInterfaceDetails, SwInterfaceDump};

/// `sw_interface_dump`, unfiltered or filtered by name.
pub struct SwInterfaces;

impl DumpKind for SwInterfaces {
    type Params = SwInterfaceDump;
    type Reply = Vec<SwInterfaceDetails>;
    const NAME: &'static str = "sw_interface_dump";
}

/// The full interface dump, indexed by the names the interfaces are mapped to.
pub struct InterfacesByName;

impl DumpKind for InterfacesByName {
    type Params = ();
    type Reply = BTreeMap<String, SwInterfaceDetails>;
    const NAME: &'static str = "interfaces by name";
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use olsr_utils::protocol::Protocol;
use olsr_utils::southbound::Nexthop;

/// A route as it is (or will be) installed in the kernel.
///
/// This is the payload carried by a [`crate::table::RoutingEntry`]'s
/// `route_new`/`route_current` fields, and the value handed to the
/// kernel facade when an install/remove operation is issued.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KernelRoute {
    pub nexthop: Option<Nexthop>,
    pub src_ip: Option<IpAddr>,
    pub table: u32,
    pub protocol: Protocol,
    pub metric: u32,
}

impl KernelRoute {
    /// Returns `true` if this route has a next-hop gateway address, as
    /// opposed to being directly attached behind an interface.
    pub fn has_gateway(&self) -> bool {
        matches!(self.nexthop, Some(Nexthop::Address { .. }))
    }
}

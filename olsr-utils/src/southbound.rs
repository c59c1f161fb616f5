//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

// The kernel-visible next hop of an installed route.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Nexthop {
    // Route whose destination sits on-link behind the given interface; no
    // separate gateway address is used.
    Interface { ifindex: u32 },
    // Route reached through a gateway address on the given interface.
    Address { ifindex: u32, addr: IpAddr },
}

impl Nexthop {
    // Compares two `Nexthop` instances for equality.
    pub fn matches(&self, other: &Nexthop) -> bool {
        self == other
    }

    pub fn ifindex(&self) -> u32 {
        match self {
            Nexthop::Interface { ifindex } | Nexthop::Address { ifindex, .. } => *ifindex,
        }
    }
}

impl std::fmt::Display for Nexthop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nexthop::Interface { ifindex } => write!(f, "on-link(if{ifindex})"),
            Nexthop::Address { ifindex, addr } => write!(f, "{addr}(if{ifindex})"),
        }
    }
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(
    feature = "testing",
    allow(dead_code, unused_variables, unused_imports)
)]

pub mod collaborators;
pub mod core;
pub mod debug;
pub mod domain;
pub mod error;
pub mod filter;
pub mod kernel;
pub mod route;
pub mod spf;
pub mod table;
pub mod trigger;

use std::net::IpAddr;

use ipnetwork::IpNetwork;

// Network prefix used as the routing table key.
pub type Prefix = IpNetwork;

// Cumulative path cost, and per-link metric, in RFC7181 units.
pub type Metric = u32;

// RFC7181 sentinel: any per-link metric at or above this value means "no
// link" (unusable).
pub const INFINITE_METRIC: Metric = 0xffff;

// Largest per-link metric that is still considered finite.
pub const METRIC_MAX: Metric = INFINITE_METRIC - 1;

// Cumulative-cost sentinel marking a target as unreachable.
pub const INFINITE_PATH: Metric = Metric::MAX;

// Compile-time cap on the number of concurrently active routing domains.
pub const MAX_DOMAINS: usize = 5;

// Default parameter-change rebuild delay (see domain::DomainStore::set).
pub const PARAMETER_CHANGE_DELAY_MS: u64 = 100;

// Returns the host prefix (/32 or /128) that represents a single address.
pub fn host_prefix(addr: IpAddr) -> Prefix {
    IpNetwork::from(addr)
}

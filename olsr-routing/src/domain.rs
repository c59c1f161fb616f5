//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;

use olsr_utils::protocol::Protocol;

use crate::MAX_DOMAINS;

/// Identifies one of the (at most [`MAX_DOMAINS`]) routing domains a
/// [`crate::core::RoutingCore`] manages.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DomainIndex(u8);

impl DomainIndex {
    pub fn new(index: usize) -> Option<DomainIndex> {
        if index < MAX_DOMAINS {
            Some(DomainIndex(index as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DomainIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-domain kernel route parameters.
///
/// These are the knobs an operator controls for how routes computed in one
/// domain get installed in the kernel: which table they land in, under which
/// protocol tag, with which administrative distance, and whether a preferred
/// source address should be attached to IPv4 routes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DomainParams {
    pub table: u32,
    pub protocol: Protocol,
    pub distance: u8,
    pub use_src_ip_in_routes: bool,
}

impl Default for DomainParams {
    fn default() -> DomainParams {
        DomainParams {
            table: 254,
            protocol: Protocol::Olsrv2,
            distance: 100,
            use_src_ip_in_routes: false,
        }
    }
}

/// Holds the current parameter set for each active domain.
#[derive(Debug, Default)]
pub struct DomainStore {
    params: [Option<DomainParams>; MAX_DOMAINS],
}

impl DomainStore {
    pub fn get(&self, domain: DomainIndex) -> Option<&DomainParams> {
        self.params[domain.get()].as_ref()
    }

    pub fn is_active(&self, domain: DomainIndex) -> bool {
        self.params[domain.get()].is_some()
    }

    /// Installs a new parameter set for `domain`, returning `true` if it
    /// differs from what was previously configured. A no-change update is
    /// reported to the caller as a no-op, not an error.
    pub fn set(&mut self, domain: DomainIndex, params: DomainParams) -> bool {
        let changed = self.params[domain.get()].as_ref() != Some(&params);
        self.params[domain.get()] = Some(params);
        changed
    }

    pub fn remove(&mut self, domain: DomainIndex) {
        self.params[domain.get()] = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = (DomainIndex, &DomainParams)> {
        self.params
            .iter()
            .enumerate()
            .filter_map(|(idx, params)| {
                params
                    .as_ref()
                    .map(|params| (DomainIndex::new(idx).unwrap(), params))
            })
    }
}

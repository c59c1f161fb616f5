//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use crate::domain::DomainIndex;
use crate::route::KernelRoute;
use crate::{INFINITE_PATH, Metric, Prefix};

/// The logical state of a routing entry's kernel presence, derived from
/// `state_current`/`state_new`/`in_processing` (see
/// [`RoutingEntry::fsm_state`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryState {
    // Selected by the Dijkstra engine but no kernel operation issued yet.
    Absent,
    // A kernel add is in flight; nothing installed yet.
    Installing,
    // Installed in the kernel and up to date.
    Installed,
    // Installed with a stale route; a remove followed by an add is in
    // flight.
    Replacing,
    // Installed but no longer wanted; a remove is in flight.
    Removing,
    // Not installed and not wanted; ready to be dropped from the table.
    Gone,
}

/// One destination's routing state within a single domain.
#[derive(Clone, Debug)]
pub struct RoutingEntry {
    pub domain_index: DomainIndex,
    pub destination: Prefix,
    // Cumulative SPF path cost of `route_new`, used to arbitrate between
    // competing first-hop updates for the same destination within one run.
    pub cost: Metric,
    pub route_new: KernelRoute,
    pub route_current: KernelRoute,
    // Whether the entry is wanted, per the run that most recently touched it.
    pub state_new: bool,
    // Whether the entry is currently believed to be installed in the kernel.
    pub state_current: bool,
    // Whether a kernel operation for this entry is in flight.
    pub in_processing: bool,
    // Set once `state_current` has been true at least once; distinguishes a
    // fresh `Absent` entry from one that briefly has `state_current == false`
    // while a remove is still completing.
    pub ever_installed: bool,
    // Set while the entry has an outstanding position in the kernel queue
    // so the reconcile step never double-enqueues it.
    pub queued: bool,
}

impl RoutingEntry {
    fn new(domain_index: DomainIndex, destination: Prefix) -> RoutingEntry {
        RoutingEntry {
            domain_index,
            destination,
            cost: INFINITE_PATH,
            route_new: KernelRoute::default(),
            route_current: KernelRoute::default(),
            state_new: false,
            state_current: false,
            in_processing: false,
            ever_installed: false,
            queued: false,
        }
    }

    /// Derives the entry's logical FSM state from its boolean fields.
    pub fn fsm_state(&self) -> EntryState {
        match (self.state_current, self.in_processing, self.state_new) {
            (false, false, false) => EntryState::Gone,
            (false, false, true) => EntryState::Absent,
            (false, true, _) => EntryState::Installing,
            (true, false, true) => EntryState::Installed,
            (true, true, true) => EntryState::Replacing,
            (true, true, false) => EntryState::Removing,
            (true, false, false) => {
                // Transient: a reconcile pass has cleared `state_new` but
                // hasn't enqueued a remove yet.
                EntryState::Installed
            }
        }
    }

    /// An entry may be dropped from the table once it carries no kernel
    /// presence, wants none, and has no operation in flight or queued.
    pub fn is_collectible(&self) -> bool {
        !self.state_current && !self.state_new && !self.in_processing && !self.queued
    }
}

/// The complete set of routing entries across all domains.
#[derive(Debug, Default)]
pub struct RoutingTable {
    entries: BTreeMap<(DomainIndex, Prefix), RoutingEntry>,
}

impl RoutingTable {
    pub fn new() -> RoutingTable {
        RoutingTable::default()
    }

    pub fn find(&self, domain: DomainIndex, destination: Prefix) -> Option<&RoutingEntry> {
        self.entries.get(&(domain, destination))
    }

    pub fn find_mut(
        &mut self,
        domain: DomainIndex,
        destination: Prefix,
    ) -> Option<&mut RoutingEntry> {
        self.entries.get_mut(&(domain, destination))
    }

    /// Returns the entry for `(domain, destination)`, creating an empty one
    /// if it doesn't exist yet.
    pub fn upsert(&mut self, domain: DomainIndex, destination: Prefix) -> &mut RoutingEntry {
        self.entries
            .entry((domain, destination))
            .or_insert_with(|| RoutingEntry::new(domain, destination))
    }

    pub fn remove(&mut self, domain: DomainIndex, destination: Prefix) -> Option<RoutingEntry> {
        self.entries.remove(&(domain, destination))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RoutingEntry> {
        self.entries.values_mut()
    }

    pub fn iter_domain(&self, domain: DomainIndex) -> impl Iterator<Item = &RoutingEntry> {
        self.entries
            .iter()
            .filter(move |((d, _), _)| *d == domain)
            .map(|(_, entry)| entry)
    }

    pub fn iter_domain_mut(
        &mut self,
        domain: DomainIndex,
    ) -> impl Iterator<Item = &mut RoutingEntry> {
        self.entries
            .iter_mut()
            .filter(move |((d, _), _)| *d == domain)
            .map(|(_, entry)| entry)
    }

    /// Clears `state_new` on every entry in `domain`, ahead of a fresh
    /// Dijkstra run. `cost` is left untouched: it persists across rounds so
    /// `update_routing_entry` can tell a cheaper already-installed path from
    /// a newly arriving, worse one.
    pub fn clear_state_new(&mut self, domain: DomainIndex) {
        for entry in self.iter_domain_mut(domain) {
            entry.state_new = false;
        }
    }

    /// Drops every collectible entry in `domain`: one with no current or
    /// wanted kernel presence, and nothing in flight, is removed rather than
    /// kept around.
    pub fn prune(&mut self, domain: DomainIndex) {
        self.entries
            .retain(|(d, _), entry| *d != domain || !entry.is_collectible());
    }

    pub fn remove_domain(&mut self, domain: DomainIndex) {
        self.entries.retain(|(d, _), _| *d != domain);
    }
}

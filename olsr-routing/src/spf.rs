//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};

use olsr_utils::southbound::Nexthop;
use tracing::debug_span;

use crate::collaborators::{NeighborDb, OpToken, Topology};
use crate::debug::Debug;
use crate::domain::{DomainIndex, DomainParams};
use crate::filter::FilterChain;
use crate::kernel::KernelQueue;
use crate::table::RoutingTable;
use crate::{INFINITE_METRIC, INFINITE_PATH, Metric, Prefix, host_prefix};

/// The first hop through which a target is (tentatively) reached during a
/// Dijkstra run: a one-hop neighbor's best link plus the neighbor's own
/// originator address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FirstHop {
    pub ifindex: u32,
    pub gateway: IpAddr,
    pub neighbor_addr: IpAddr,
}

/// Per-target scratch state held by the Dijkstra workspace.
#[derive(Clone, Copy, Debug)]
pub struct DijkstraNode {
    pub path_cost: Metric,
    pub first_hop: Option<FirstHop>,
    // Additional hop-count style distance reported for an attached network,
    // applied on top of the node's own path cost.
    pub distance: u16,
    pub single_hop: bool,
    pub local: bool,
    pub done: bool,
}

impl Default for DijkstraNode {
    fn default() -> DijkstraNode {
        DijkstraNode {
            path_cost: INFINITE_PATH,
            first_hop: None,
            distance: 0,
            single_hop: false,
            local: false,
            done: false,
        }
    }
}

/// Scratch space for a single Dijkstra run over a `Topology::TargetId`
/// arena.
///
/// The candidate/settled priority queue is realized as a `BTreeMap` keyed by
/// `(cost, id)`, accompanied by a `HashMap` of each currently-queued target's
/// best known cost; together they give O(log n) insert/remove/pop-min
/// without a pointer-based binary heap.
#[derive(Debug, Default)]
pub struct Workspace<Id: Copy + Eq + std::hash::Hash + Ord> {
    queue: BTreeMap<(Metric, Id), ()>,
    queued_cost: HashMap<Id, Metric>,
    nodes: HashMap<Id, DijkstraNode>,
}

impl<Id: Copy + Eq + std::hash::Hash + Ord> Workspace<Id> {
    pub fn new() -> Workspace<Id> {
        Workspace::default()
    }

    fn reset(&mut self, targets: impl Iterator<Item = Id>, locals: &HashSet<Id>) {
        self.queue.clear();
        self.queued_cost.clear();
        self.nodes.clear();
        for id in targets {
            self.nodes.insert(
                id,
                DijkstraNode {
                    local: locals.contains(&id),
                    ..Default::default()
                },
            );
        }
    }

    pub fn node(&self, id: Id) -> Option<&DijkstraNode> {
        self.nodes.get(&id)
    }

    fn insert(&mut self, id: Id, cost: Metric) {
        self.queue.insert((cost, id), ());
        self.queued_cost.insert(id, cost);
    }

    fn remove(&mut self, id: Id) {
        if let Some(cost) = self.queued_cost.remove(&id) {
            self.queue.remove(&(cost, id));
        }
    }

    fn pop_min(&mut self) -> Option<(Id, Metric)> {
        let (&(cost, id), ()) = self.queue.iter().next()?;
        self.queue.remove(&(cost, id));
        self.queued_cost.remove(&id);
        Some((id, cost))
    }
}

/// The Dijkstra engine: prepares a workspace, relaxes candidates in
/// increasing cost order, and reconciles the resulting routing entries
/// against the live table.
#[derive(Debug, Default)]
pub struct Engine<Id: Copy + Eq + std::hash::Hash + Ord> {
    workspace: Workspace<Id>,
}

impl<Id: Copy + Eq + std::hash::Hash + Ord + std::fmt::Debug> Engine<Id> {
    pub fn new() -> Engine<Id> {
        Engine::default()
    }

    /// Runs a complete SPF computation for `domain` and reconciles the
    /// result into `table`, enqueuing kernel operations on `queue`.
    #[allow(clippy::too_many_arguments)]
    pub fn run_domain<T, N>(
        &mut self,
        domain: DomainIndex,
        topology: &T,
        neighbors: &N,
        locals: &HashSet<IpAddr>,
        local_src_v4: Option<Ipv4Addr>,
        table: &mut RoutingTable,
        filters: &FilterChain,
        params: &DomainParams,
        queue: &mut KernelQueue,
    ) where
        T: Topology<TargetId = Id>,
        N: NeighborDb,
    {
        let _span = debug_span!("spf", domain = %domain).entered();
        Debug::SpfRunStarted(domain).log();

        table.clear_state_new(domain);
        self.prepare(domain, topology, neighbors, locals);
        self.relax_loop(domain, topology, table);
        self.single_hop_pass(domain, neighbors, table);
        self.reconcile(domain, table, filters, params, local_src_v4, queue);
        table.prune(domain);

        Debug::SpfRunFinished(domain).log();
    }

    fn prepare<T, N>(
        &mut self,
        domain: DomainIndex,
        topology: &T,
        neighbors: &N,
        locals: &HashSet<IpAddr>,
    ) where
        T: Topology<TargetId = Id>,
        N: NeighborDb,
    {
        let local_ids: HashSet<Id> = topology
            .nodes()
            .filter(|&id| {
                topology
                    .originator(id)
                    .is_some_and(|originator| locals.contains(&originator))
            })
            .collect();

        let targets = topology.nodes().chain(topology.endpoints());
        self.workspace.reset(targets, &local_ids);

        for nbr in neighbors.neighbors(domain).filter(|n| n.symmetric) {
            if nbr.metric_out >= INFINITE_METRIC || nbr.metric_in >= INFINITE_METRIC {
                continue;
            }
            let Some(node_id) = topology.node_by_originator(nbr.originator) else {
                continue;
            };
            let Some(node) = self.workspace.nodes.get_mut(&node_id) else {
                continue;
            };
            if node.local {
                continue;
            }
            let first_hop = FirstHop {
                ifindex: nbr.best_link_ifindex,
                gateway: nbr.best_link_addr,
                neighbor_addr: nbr.originator,
            };
            if nbr.metric_out < node.path_cost {
                node.path_cost = nbr.metric_out;
                node.first_hop = Some(first_hop);
                node.distance = 0;
                node.single_hop = true;
            }
            self.workspace.insert(node_id, node.path_cost);
        }
    }

    fn relax_loop<T>(&mut self, domain: DomainIndex, topology: &T, table: &mut RoutingTable)
    where
        T: Topology<TargetId = Id>,
    {
        while let Some((id, cost)) = self.workspace.pop_min() {
            let (first_hop, distance, single_hop) = {
                let Some(node) = self.workspace.nodes.get_mut(&id) else {
                    continue;
                };
                node.done = true;
                (node.first_hop, node.distance, node.single_hop)
            };

            if let Some(first_hop) = first_hop {
                let destination = topology.target_prefix(id);
                self.update_routing_entry(
                    domain, table, destination, first_hop, distance, cost, single_hop,
                );
            }

            if topology.is_endpoint(id) {
                continue;
            }

            for edge in topology.edges(id, domain) {
                if edge.virtual_link || edge.cost >= INFINITE_METRIC {
                    continue;
                }
                self.relax(edge.to, first_hop, edge.cost, cost, 0, false);
            }
            for endpoint in topology.attached_endpoints(id, domain) {
                if endpoint.cost >= INFINITE_METRIC {
                    continue;
                }
                self.relax(
                    endpoint.endpoint,
                    first_hop,
                    endpoint.cost,
                    cost,
                    endpoint.distance,
                    false,
                );
            }
        }
    }

    fn relax(
        &mut self,
        target: Id,
        first_hop: Option<FirstHop>,
        link_cost: Metric,
        base_cost: Metric,
        distance: u16,
        single_hop: bool,
    ) {
        let new_cost = base_cost.saturating_add(link_cost);

        let Some(node) = self.workspace.nodes.get(&target) else {
            return;
        };
        if node.done || node.local {
            return;
        }

        if let Some(&cur_cost) = self.workspace.queued_cost.get(&target) {
            if cur_cost <= new_cost {
                return;
            }
            self.workspace.remove(target);
        } else if node.path_cost <= new_cost {
            return;
        }

        let node = self.workspace.nodes.get_mut(&target).unwrap();
        node.path_cost = new_cost;
        node.first_hop = first_hop;
        node.distance = distance;
        node.single_hop = single_hop;
        self.workspace.insert(target, new_cost);
    }

    #[allow(clippy::too_many_arguments)]
    fn update_routing_entry(
        &self,
        domain: DomainIndex,
        table: &mut RoutingTable,
        destination: Prefix,
        first_hop: FirstHop,
        distance: u16,
        path_cost: Metric,
        single_hop: bool,
    ) {
        let entry = table.upsert(domain, destination);

        // The entry is currently installed with a cheaper route than the one
        // just computed; keep it rather than overwrite with something worse.
        // This is what keeps a TC announcement and an attached-network
        // announcement of the same prefix from clobbering each other.
        if entry.state_current && entry.cost < path_cost {
            return;
        }

        let on_link = single_hop && first_hop.neighbor_addr == destination.ip();
        entry.route_new.nexthop = Some(if on_link {
            Nexthop::Interface {
                ifindex: first_hop.ifindex,
            }
        } else {
            Nexthop::Address {
                ifindex: first_hop.ifindex,
                addr: first_hop.gateway,
            }
        });
        entry.route_new.metric = distance as u32;
        entry.cost = path_cost;
        entry.state_new = true;
    }

    fn single_hop_pass<N: NeighborDb>(
        &self,
        domain: DomainIndex,
        neighbors: &N,
        table: &mut RoutingTable,
    ) {
        for nbr in neighbors
            .neighbors(domain)
            .filter(|n| n.symmetric && n.metric_out < INFINITE_METRIC)
        {
            let first_hop = FirstHop {
                ifindex: nbr.best_link_ifindex,
                gateway: nbr.best_link_addr,
                neighbor_addr: nbr.originator,
            };

            for addr in nbr.addresses.iter().filter(|a| neighbors.is_routable(**a)) {
                self.update_routing_entry(
                    domain,
                    table,
                    host_prefix(*addr),
                    first_hop,
                    0,
                    nbr.metric_out,
                    true,
                );
            }

            for two_hop in neighbors
                .two_hop(nbr.originator, domain)
                .filter(|t| !t.lost && t.metric_out < INFINITE_METRIC)
            {
                let cost = nbr.metric_out.saturating_add(two_hop.metric_out);
                for addr in two_hop
                    .addresses
                    .iter()
                    .filter(|a| neighbors.is_routable(**a))
                {
                    self.update_routing_entry(
                        domain,
                        table,
                        host_prefix(*addr),
                        first_hop,
                        0,
                        cost,
                        false,
                    );
                }
            }
        }
    }

    fn reconcile(
        &self,
        domain: DomainIndex,
        table: &mut RoutingTable,
        filters: &FilterChain,
        params: &DomainParams,
        local_src_v4: Option<Ipv4Addr>,
        queue: &mut KernelQueue,
    ) {
        for entry in table.iter_domain_mut(domain) {
            if entry.state_new {
                entry.route_new.table = params.table;
                entry.route_new.protocol = params.protocol;
                entry.route_new.metric = params.distance as u32;
                if params.use_src_ip_in_routes && entry.destination.is_ipv4() {
                    entry.route_new.src_ip = local_src_v4.map(IpAddr::V4);
                } else {
                    entry.route_new.src_ip = None;
                }

                if !filters.accept(domain, entry.destination, &entry.route_new) {
                    entry.state_new = false;
                }
            }

            // Idempotent reconcile: a genuinely unchanged route is left
            // alone rather than re-issued to the kernel.
            if entry.state_new && entry.state_current && entry.route_new == entry.route_current {
                continue;
            }

            if entry.in_processing || entry.queued {
                continue;
            }
            if !entry.state_new && !entry.state_current {
                continue;
            }

            let token = OpToken {
                domain,
                prefix: entry.destination,
            };
            let gateway_specified = if entry.state_new {
                entry.route_new.has_gateway()
            } else {
                entry.route_current.has_gateway()
            };

            let head = matches!(
                (entry.state_new, gateway_specified),
                (true, false) | (false, true)
            );
            if head {
                queue.enqueue_head(token);
            } else {
                queue.enqueue_tail(token);
            }
            entry.queued = true;
            Debug::EntryEnqueued(token, head).log();
        }
    }
}

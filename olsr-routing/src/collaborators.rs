//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use crate::domain::DomainIndex;
use crate::route::KernelRoute;
use crate::{Metric, Prefix};

/// A neighboring router, or an attached network, reachable from a topology
/// node through a non-virtual link (`Topology::edges`).
#[derive(Clone, Copy, Debug)]
pub struct TopoEdge<Id> {
    pub to: Id,
    // Links reported by a neighbor that isn't itself symmetric with the
    // reporting router; kept in the graph for two-hop bookkeeping but never
    // traversed by the SPF relax step.
    pub virtual_link: bool,
    pub cost: Metric,
}

/// A network or address prefix attached to (originated by) a topology node.
#[derive(Clone, Copy, Debug)]
pub struct TopoEndpoint<Id> {
    pub endpoint: Id,
    pub cost: Metric,
    // Additional hop-count style distance contributed by this attachment on
    // top of the cost already paid to reach the originating node.
    pub distance: u16,
}

/// Read-only view over the OLSRv2 link-state topology graph.
///
/// `TargetId` is an opaque handle into whatever arena the collaborator uses
/// to store the graph; the SPF engine never looks inside it.
pub trait Topology {
    type TargetId: Copy + Eq + std::hash::Hash + Ord + std::fmt::Debug;

    fn nodes(&self) -> Box<dyn Iterator<Item = Self::TargetId> + '_>;
    fn endpoints(&self) -> Box<dyn Iterator<Item = Self::TargetId> + '_>;
    fn is_endpoint(&self, target: Self::TargetId) -> bool;

    fn node_by_originator(&self, originator: IpAddr) -> Option<Self::TargetId>;
    fn originator(&self, target: Self::TargetId) -> Option<IpAddr>;

    /// The routing table destination this target represents: a node's
    /// originator address as a host prefix, or an endpoint's own prefix.
    fn target_prefix(&self, target: Self::TargetId) -> Prefix;

    fn edges(
        &self,
        target: Self::TargetId,
        domain: DomainIndex,
    ) -> Box<dyn Iterator<Item = TopoEdge<Self::TargetId>> + '_>;

    fn attached_endpoints(
        &self,
        target: Self::TargetId,
        domain: DomainIndex,
    ) -> Box<dyn Iterator<Item = TopoEndpoint<Self::TargetId>> + '_>;
}

/// A one-hop neighbor as seen by NHDP.
#[derive(Clone, Debug)]
pub struct NeighborView {
    pub originator: IpAddr,
    pub symmetric: bool,
    // Routable addresses advertised by this neighbor that should themselves
    // become single-hop routing entries.
    pub addresses: Vec<IpAddr>,
    pub best_link_ifindex: u32,
    pub best_link_addr: IpAddr,
    pub metric_out: Metric,
    pub metric_in: Metric,
}

/// A two-hop neighbor reachable through a given one-hop neighbor.
#[derive(Clone, Debug)]
pub struct TwoHopView {
    pub addresses: Vec<IpAddr>,
    pub metric_out: Metric,
    // Set once the 1-2 hop link has been reported lost but not yet purged.
    pub lost: bool,
}

/// Read-only view over the NHDP neighbor database.
pub trait NeighborDb {
    fn neighbors(&self, domain: DomainIndex) -> Box<dyn Iterator<Item = NeighborView> + '_>;
    fn two_hop(
        &self,
        originator: IpAddr,
        domain: DomainIndex,
    ) -> Box<dyn Iterator<Item = TwoHopView> + '_>;
    fn is_routable(&self, addr: IpAddr) -> bool;
}

/// An opaque handle identifying one in-flight (or queued) kernel operation.
///
/// Rather than the facade holding a raw pointer back into a
/// [`crate::table::RoutingEntry`], it holds this token and the core looks
/// the entry back up in the routing table when the operation completes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OpToken {
    pub domain: DomainIndex,
    pub prefix: Prefix,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KernelOp {
    Add,
    Remove,
}

/// The raw outcome of a completed kernel operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KernelOpResult {
    Success,
    // A remove that failed because the route was already gone; treated as
    // success.
    Esrch,
    // The operation was interrupted by a parameter change mid-flight.
    Cancelled,
    Error(KernelError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KernelError(pub i32);

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

/// Whether a kernel operation finished inline or will complete later via a
/// [`crate::core::RoutingCoreMsg::KernelOpDone`] message.
pub enum KernelOpOutcome {
    Done(KernelOpResult),
    Pending,
}

/// The southbound interface to the OS routing table.
pub trait OsRouting {
    /// Issues an add or remove of `route` for `token`. Returns
    /// [`KernelOpOutcome::Done`] if the operation already completed
    /// synchronously, or [`KernelOpOutcome::Pending`] if completion will be
    /// reported asynchronously through the core's message channel.
    fn os_routing_set(&self, token: OpToken, kind: KernelOp, route: &KernelRoute) -> KernelOpOutcome;

    /// Requests cancellation of the in-flight operation identified by
    /// `token`, if any. Cancellation is best-effort: the operation may still
    /// complete normally.
    fn os_routing_interrupt(&self, token: OpToken);
}

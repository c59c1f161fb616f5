//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use olsr_routing::collaborators::{KernelError, KernelOp, KernelOpResult, OpToken};
use olsr_routing::filter::FilterChain;
use olsr_routing::kernel::KernelQueue;
use olsr_routing::table::RoutingTable;
use olsr_routing::Prefix;
use olsr_utils::southbound::Nexthop;

use crate::support::{domain0, v4, MockOsRouting};

// A single-hop insert (no gateway) must be enqueued ahead of a
// multi-hop insert (gateway present).
#[test]
fn kernel_queue_head_tail_policy() {
    let domain = domain0();
    let mut table = RoutingTable::new();
    let mut queue = KernelQueue::new();

    let single_hop: Prefix = "10.0.0.2/32".parse().unwrap();
    let entry = table.upsert(domain, single_hop);
    entry.route_new.nexthop = Some(Nexthop::Interface { ifindex: 1 });
    entry.state_new = true;

    let multi_hop: Prefix = "10.0.0.3/32".parse().unwrap();
    let entry = table.upsert(domain, multi_hop);
    entry.route_new.nexthop = Some(Nexthop::Address {
        ifindex: 1,
        addr: v4([10, 0, 0, 2]),
    });
    entry.state_new = true;

    // Reconcile manually (bypassing a full SPF run) the way `spf::Engine`
    // would for these two already-populated entries.
    let filters = FilterChain::new();
    for prefix in [multi_hop, single_hop] {
        let entry = table.find_mut(domain, prefix).unwrap();
        assert!(filters.accept(domain, prefix, &entry.route_new));
        let gateway_specified = entry.route_new.has_gateway();
        let token = OpToken { domain, prefix };
        if !gateway_specified {
            queue.enqueue_head(token);
        } else {
            queue.enqueue_tail(token);
        }
        entry.queued = true;
    }

    let facade = MockOsRouting::default();
    queue.drain(&mut table, &facade);

    let log = facade.log.borrow();
    assert_eq!(log[0].0.prefix, single_hop);
    assert_eq!(log[1].0.prefix, multi_hop);
}

// A remove that fails with ESRCH is treated like a successful remove: the
// entry becomes uninstalled with no warning and no follow-up add. Since
// nothing is current and nothing is wanted, the entry is destroyed the
// moment the remove completes, not left around for the next prune pass.
#[test]
fn kernel_remove_esrch_clears_installed_state_without_followup() {
    let domain = domain0();
    let destination: Prefix = "10.0.0.2/32".parse().unwrap();
    let mut table = RoutingTable::new();
    let facade = MockOsRouting::default();

    let entry = table.upsert(domain, destination);
    entry.route_current.nexthop = Some(Nexthop::Interface { ifindex: 1 });
    entry.state_current = true;
    entry.ever_installed = true;
    entry.in_processing = true;

    let mut queue = KernelQueue::new();
    let token = OpToken {
        domain,
        prefix: destination,
    };
    queue.complete(
        token,
        KernelOp::Remove,
        KernelOpResult::Esrch,
        &mut table,
        &facade,
    );

    assert!(table.find(domain, destination).is_none());
    assert!(queue.is_empty());
    assert!(facade.log.borrow().is_empty());
}

// An add that never reaches the kernel, for a destination with no prior
// installation, leaves nothing to retry: the entry is destroyed outright
// rather than kept around as a permanently-wanted ghost entry.
#[test]
fn kernel_add_failure_destroys_never_installed_entry() {
    let domain = domain0();
    let destination: Prefix = "10.0.0.2/32".parse().unwrap();
    let mut table = RoutingTable::new();
    let facade = MockOsRouting::default();

    let entry = table.upsert(domain, destination);
    entry.route_new.nexthop = Some(Nexthop::Interface { ifindex: 1 });
    entry.state_new = true;
    entry.in_processing = true;

    let mut queue = KernelQueue::new();
    let token = OpToken {
        domain,
        prefix: destination,
    };
    queue.complete(
        token,
        KernelOp::Add,
        KernelOpResult::Error(KernelError(1)),
        &mut table,
        &facade,
    );

    assert!(table.find(domain, destination).is_none());
}

// An add that fails while replacing a previously-installed route keeps the
// old installed state intact, so the next SPF run simply retries instead of
// losing the destination outright.
#[test]
fn kernel_add_failure_keeps_previously_installed_entry() {
    let domain = domain0();
    let destination: Prefix = "10.0.0.2/32".parse().unwrap();
    let mut table = RoutingTable::new();
    let facade = MockOsRouting::default();

    let entry = table.upsert(domain, destination);
    entry.route_current.nexthop = Some(Nexthop::Interface { ifindex: 1 });
    entry.route_new.nexthop = Some(Nexthop::Address {
        ifindex: 2,
        addr: v4([10, 0, 0, 9]),
    });
    entry.state_current = true;
    entry.state_new = true;
    entry.ever_installed = true;
    entry.in_processing = true;

    let mut queue = KernelQueue::new();
    let token = OpToken {
        domain,
        prefix: destination,
    };
    queue.complete(
        token,
        KernelOp::Add,
        KernelOpResult::Error(KernelError(1)),
        &mut table,
        &facade,
    );

    let entry = table.find(domain, destination).unwrap();
    assert!(!entry.in_processing);
    assert!(entry.state_current);
    assert_eq!(
        entry.route_current.nexthop,
        Some(Nexthop::Interface { ifindex: 1 })
    );
}

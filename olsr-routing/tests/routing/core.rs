//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use olsr_routing::collaborators::{KernelOp, KernelOpResult, NeighborView, OpToken};
use olsr_routing::core::{Config, RoutingCore};
use olsr_routing::domain::DomainParams;

use crate::support::{domain0, v4, AllowAll, MockNeighborDb, MockTopology, PendingOsRouting, SharedOsRouting};

// A domain parameter change must tear down every entry already installed
// under the old parameters (issuing a kernel remove for each) rather than
// mutate them in place.
#[tokio::test]
async fn domain_parameter_change_tears_down_installed_entries() {
    let a = v4([10, 0, 0, 1]);
    let b = v4([10, 0, 0, 2]);

    let mut topo = MockTopology::default();
    let na = topo.add_node(a);
    let nb = topo.add_node(b);
    topo.link(na, nb, 1);

    let mut neighbors = MockNeighborDb::default();
    neighbors.neighbors.push(NeighborView {
        originator: b,
        symmetric: true,
        addresses: vec![b],
        best_link_ifindex: 1,
        best_link_addr: b,
        metric_out: 1,
        metric_in: 1,
    });

    let facade = SharedOsRouting::default();
    let locals: HashSet<IpAddr> = [a].into_iter().collect();
    let (core, handle) = RoutingCore::new(
        Config::default(),
        topo,
        neighbors,
        facade.clone(),
        locals,
        None,
    );
    let join = tokio::spawn(core.run());

    let domain = domain0();
    handle.set_domain_parameter(domain, DomainParams::default());
    handle.add_filter(Arc::new(AllowAll));

    // Neither of the above forces a run by itself under the rate-limit
    // window; the test drives the timer directly instead of waiting on it.
    handle.advance_rate_limit();
    tokio::task::yield_now().await;

    let mut changed = DomainParams::default();
    changed.table = 200;
    handle.set_domain_parameter(domain, changed);
    handle.advance_rate_limit();
    tokio::task::yield_now().await;

    handle.initiate_shutdown();
    join.await.unwrap();

    let log = facade.log.lock().unwrap();
    assert!(log.iter().any(|(_, kind, _)| *kind == KernelOp::Add));
    assert!(log.iter().any(|(_, kind, _)| *kind == KernelOp::Remove));
}

// A shutdown must not force-interrupt an operation that has a genuine
// chance to complete on its own: the remove it issues is left to finish
// through the ordinary `KernelOpDone` path, and only once the table is
// fully drained does the core actually stop.
#[tokio::test]
async fn cleanup_lets_pending_removes_complete_before_destroying_the_table() {
    let a = v4([10, 0, 0, 1]);
    let b = v4([10, 0, 0, 2]);

    let mut topo = MockTopology::default();
    let na = topo.add_node(a);
    let nb = topo.add_node(b);
    topo.link(na, nb, 1);

    let mut neighbors = MockNeighborDb::default();
    neighbors.neighbors.push(NeighborView {
        originator: b,
        symmetric: true,
        addresses: vec![b],
        best_link_ifindex: 1,
        best_link_addr: b,
        metric_out: 1,
        metric_in: 1,
    });

    let facade = PendingOsRouting::default();
    let locals: HashSet<IpAddr> = [a].into_iter().collect();
    let (core, handle) = RoutingCore::new(
        Config::default(),
        topo,
        neighbors,
        facade.clone(),
        locals,
        None,
    );
    facade.set_sender(handle.sender());
    let join = tokio::spawn(core.run());

    let domain = domain0();
    handle.set_domain_parameter(domain, DomainParams::default());
    handle.advance_rate_limit();
    tokio::task::yield_now().await;

    // The add issued for `b` never completes synchronously; the test
    // stands in for whatever real asynchronous OS callback would normally
    // report it done.
    let add_token = {
        let log = facade.log.lock().unwrap();
        let (token, kind, _) = log.last().cloned().expect("an add was issued");
        assert_eq!(kind, KernelOp::Add);
        token
    };
    facade.complete(add_token, KernelOp::Add, KernelOpResult::Success);
    tokio::task::yield_now().await;

    handle.initiate_shutdown();
    tokio::task::yield_now().await;

    // The shutdown's remove is now in flight and, like the add above, is
    // still pending. Deliver its completion the same way a real facade
    // would, from outside the force-interrupt path.
    let remove_token = {
        let log = facade.log.lock().unwrap();
        let (token, kind, _) = log.last().cloned().expect("a remove was issued");
        assert_eq!(kind, KernelOp::Remove);
        token
    };
    facade.complete(remove_token, KernelOp::Remove, KernelOpResult::Success);

    assert_eq!(
        remove_token,
        OpToken {
            domain,
            prefix: olsr_routing::host_prefix(b),
        }
    );

    // The remove's completion is what empties the table; if cleanup had to
    // force-interrupt it instead, `run` would never see the table go empty
    // and this would hang instead of returning.
    tokio::time::timeout(std::time::Duration::from_secs(1), join)
        .await
        .expect("run() did not terminate after its last remove completed")
        .unwrap();
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use olsr_routing::trigger::Trigger;

// A burst of update requests inside one rate-limit window must coalesce
// into exactly one pending recomputation.
#[test]
fn rate_limit_coalesces_bursts() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut trigger = Trigger::new(Duration::from_millis(500));

    for _ in 0..100 {
        trigger.trigger_update(&tx);
    }

    // The initial near-zero timer fires once, draining the single coalesced
    // request from the whole burst.
    assert!(trigger.on_timer_expiry(&tx));
    // The window it re-armed for then expires with nothing new pending.
    assert!(!trigger.on_timer_expiry(&tx));
    drop(rx.try_recv());
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::VecDeque;

use tracing::debug_span;

use crate::collaborators::{KernelOp, KernelOpOutcome, KernelOpResult, OpToken, OsRouting};
use crate::debug::Debug;
use crate::table::RoutingTable;

/// FIFO of routing entries awaiting a kernel operation.
///
/// Ordering matters: an insert that needs no gateway (single-hop) is placed
/// ahead of inserts that do, and a remove that frees up a gateway-qualified
/// route is placed ahead of plain removes, so that a destination never
/// transiently loses reachability if it can be avoided.
#[derive(Debug, Default)]
pub struct KernelQueue {
    queue: VecDeque<OpToken>,
}

impl KernelQueue {
    pub fn new() -> KernelQueue {
        KernelQueue::default()
    }

    pub fn enqueue_head(&mut self, token: OpToken) {
        self.queue.push_front(token);
    }

    pub fn enqueue_tail(&mut self, token: OpToken) {
        self.queue.push_back(token);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Dequeues and dispatches as many entries as the facade accepts
    /// synchronously without blocking (real implementations of
    /// [`OsRouting`] are expected not to block the core task).
    pub fn drain(&mut self, table: &mut RoutingTable, facade: &impl OsRouting) {
        while let Some(token) = self.queue.pop_front() {
            self.dispatch(token, table, facade);
        }
    }

    fn dispatch(&mut self, token: OpToken, table: &mut RoutingTable, facade: &impl OsRouting) {
        let Some(entry) = table.find_mut(token.domain, token.prefix) else {
            return;
        };
        entry.queued = false;

        let (kind, route) = if entry.state_current {
            (KernelOp::Remove, entry.route_current.clone())
        } else if entry.state_new {
            (KernelOp::Add, entry.route_new.clone())
        } else {
            // Nothing wanted and nothing installed; drop silently.
            return;
        };

        entry.in_processing = true;
        Debug::KernelOpIssued(token, kind).log();

        match facade.os_routing_set(token, kind, &route) {
            KernelOpOutcome::Done(result) => self.complete(token, kind, result, table, facade),
            KernelOpOutcome::Pending => {}
        }
    }

    /// Called (directly, or from [`crate::core::RoutingCore`] on receipt of a
    /// `KernelOpDone` message) once a kernel operation has finished.
    pub fn complete(
        &mut self,
        token: OpToken,
        kind: KernelOp,
        result: KernelOpResult,
        table: &mut RoutingTable,
        facade: &impl OsRouting,
    ) {
        let _span = debug_span!("kernel", domain = %token.domain, destination = %token.prefix)
            .entered();
        Debug::KernelOpDone(token, kind, result).log();

        let Some(entry) = table.find_mut(token.domain, token.prefix) else {
            return;
        };
        entry.in_processing = false;

        let ok = matches!(result, KernelOpResult::Success | KernelOpResult::Esrch);
        if !ok {
            // A fresh install that never reached the kernel leaves nothing to
            // roll back to; destroy it outright rather than keep a
            // permanently-wanted ghost entry around. An install that
            // replaced a previously-installed route keeps its old
            // `route_current` and is simply retried on the next SPF run.
            let destroy_on_add_failure = kind == KernelOp::Add && !entry.ever_installed;
            if destroy_on_add_failure {
                table.remove(token.domain, token.prefix);
            }
            return;
        }

        match kind {
            KernelOp::Add => {
                entry.route_current = entry.route_new.clone();
                entry.state_current = true;
                entry.ever_installed = true;
                if !entry.state_new {
                    // Wanted route changed its mind while the add was in
                    // flight; immediately queue the follow-up remove.
                    self.enqueue_head(token);
                    entry.queued = true;
                }
            }
            KernelOp::Remove => {
                if entry.state_new {
                    // Replacing: the remove just completed, now add the new
                    // route.
                    entry.state_current = false;
                    self.enqueue_head(token);
                    entry.queued = true;
                } else {
                    // Removing -> Gone: nothing current, nothing wanted.
                    // The entry must not linger until the next prune.
                    table.remove(token.domain, token.prefix);
                }
            }
        }
    }
}

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use olsr_utils::task::TimeoutTask;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::RoutingCoreMsg;
use crate::debug::Debug;

/// Rate-limits SPF recomputation so a burst of topology/neighbor changes
/// collapses into a single run.
#[derive(Debug)]
pub struct Trigger {
    // A recomputation has been requested since the timer was last armed.
    pending: bool,
    armed: bool,
    timer: Option<TimeoutTask>,
    window: Duration,
}

impl Trigger {
    pub fn new(window: Duration) -> Trigger {
        Trigger {
            pending: false,
            armed: false,
            timer: None,
            window,
        }
    }

    /// Requests a recomputation. If no rate-limit window is currently open,
    /// one is opened immediately (with a near-zero initial delay) so the
    /// first request in a burst runs promptly; subsequent requests in the
    /// same window just set `pending`.
    pub fn trigger_update(&mut self, notify: &UnboundedSender<RoutingCoreMsg>) {
        if self.pending {
            Debug::TriggerCoalesced.log();
        }
        self.pending = true;
        if !self.armed {
            self.arm(Duration::from_millis(1), notify);
        }
    }

    /// Tears down the current window (if any) and arms a fresh one for
    /// exactly `delay`, guaranteeing a recomputation once it elapses
    /// regardless of whether anything is currently `pending`. Used by a
    /// domain parameter change, which needs its rebuild to land after a
    /// fixed delay rather than whenever the ambient rate-limit window next
    /// happens to open (see `domain::DomainStore::set`).
    pub fn schedule_rebuild(&mut self, delay: Duration, notify: &UnboundedSender<RoutingCoreMsg>) {
        self.pending = true;
        self.arm(delay, notify);
    }

    /// Forces a recomputation. Returns `true` if SPF should run right now.
    ///
    /// When `skip_wait` is `false` and a window is already open, the request
    /// is merged into it (the same coalescing behavior as
    /// [`Trigger::trigger_update`]). When `skip_wait` is `true`, any open
    /// window is torn down and a fresh one is opened immediately.
    pub fn force_update(&mut self, skip_wait: bool, notify: &UnboundedSender<RoutingCoreMsg>) -> bool {
        if self.armed && !skip_wait {
            self.pending = true;
            return false;
        }
        self.pending = false;
        self.arm(self.window, notify);
        true
    }

    /// Called when the rate-limit timer fires. Returns `true` if a
    /// coalesced request means SPF should run again now.
    pub fn on_timer_expiry(&mut self, notify: &UnboundedSender<RoutingCoreMsg>) -> bool {
        self.armed = false;
        self.timer = None;
        if self.pending {
            self.pending = false;
            self.arm(self.window, notify);
            Debug::TriggerFired.log();
            true
        } else {
            false
        }
    }

    fn arm(&mut self, delay: Duration, notify: &UnboundedSender<RoutingCoreMsg>) {
        self.armed = true;
        self.timer = Some(Self::spawn_timer(delay, notify.clone()));
    }

    #[cfg(not(feature = "testing"))]
    fn spawn_timer(delay: Duration, notify: UnboundedSender<RoutingCoreMsg>) -> TimeoutTask {
        TimeoutTask::new(delay, move || async move {
            let _ = notify.send(RoutingCoreMsg::RateLimitExpiry);
        })
    }

    #[cfg(feature = "testing")]
    fn spawn_timer(_delay: Duration, _notify: UnboundedSender<RoutingCoreMsg>) -> TimeoutTask {
        TimeoutTask {}
    }
}

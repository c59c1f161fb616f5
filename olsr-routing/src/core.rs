//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug_span;

use crate::collaborators::{KernelOp, KernelOpResult, NeighborDb, OpToken, OsRouting, Topology};
use crate::debug::Debug;
use crate::domain::{DomainIndex, DomainParams, DomainStore};
use crate::error::Error;
use crate::filter::{Filter, FilterChain};
use crate::kernel::KernelQueue;
use crate::spf::Engine;
use crate::table::RoutingTable;
use crate::{MAX_DOMAINS, PARAMETER_CHANGE_DELAY_MS};
use crate::trigger::Trigger;

/// Runtime configuration for a [`RoutingCore`].
#[derive(Clone, Debug)]
pub struct Config {
    // The coalescing window: once an SPF run starts, further update
    // requests are held back for at least this long before the next run.
    pub rate_limit_window: Duration,
    // Extra delay applied specifically to a parameter-change-triggered
    // rebuild, so a burst of configuration edits doesn't each cost a run.
    pub parameter_change_delay: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            rate_limit_window: Duration::from_millis(500),
            parameter_change_delay: Duration::from_millis(PARAMETER_CHANGE_DELAY_MS),
        }
    }
}

/// Messages processed, one at a time, by [`RoutingCore::run`].
pub enum RoutingCoreMsg {
    // NHDP or the topology collaborator reported a change relevant to one
    // or more domains; request a (rate-limited) recomputation.
    NhdpUpdate,
    // The rate-limit timer expired.
    RateLimitExpiry,
    // A previously-issued kernel operation has completed.
    KernelOpDone {
        token: OpToken,
        kind: KernelOp,
        result: KernelOpResult,
    },
    // An operator changed a domain's kernel route parameters.
    SetDomainParameter {
        domain: DomainIndex,
        params: DomainParams,
    },
    AddFilter(Arc<dyn Filter>),
    RemoveFilter(Arc<dyn Filter>),
    ClearFilters,
    Shutdown,
}

/// A cheaply-cloneable handle used by callers outside the core task to
/// request actions on it.
#[derive(Clone)]
pub struct RoutingCoreHandle {
    tx: UnboundedSender<RoutingCoreMsg>,
}

impl RoutingCoreHandle {
    pub fn trigger_update(&self) {
        let _ = self.tx.send(RoutingCoreMsg::NhdpUpdate);
    }

    pub fn set_domain_parameter(&self, domain: DomainIndex, params: DomainParams) {
        let _ = self
            .tx
            .send(RoutingCoreMsg::SetDomainParameter { domain, params });
    }

    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        let _ = self.tx.send(RoutingCoreMsg::AddFilter(filter));
    }

    pub fn remove_filter(&self, filter: Arc<dyn Filter>) {
        let _ = self.tx.send(RoutingCoreMsg::RemoveFilter(filter));
    }

    pub fn clear_filters(&self) {
        let _ = self.tx.send(RoutingCoreMsg::ClearFilters);
    }

    pub fn initiate_shutdown(&self) {
        let _ = self.tx.send(RoutingCoreMsg::Shutdown);
    }

    /// Test-only hook: fires the rate-limit timer immediately instead of
    /// waiting on real elapsed time, which the `testing` feature disables.
    #[cfg(feature = "testing")]
    pub fn advance_rate_limit(&self) {
        let _ = self.tx.send(RoutingCoreMsg::RateLimitExpiry);
    }

    /// Test-only hook: hands out a clone of the raw message sender, so a
    /// mock [`crate::collaborators::OsRouting`] facade that returned
    /// [`crate::collaborators::KernelOpOutcome::Pending`] can later deliver
    /// the matching `KernelOpDone` itself, the way a real facade would
    /// report back from its own completion callback.
    #[cfg(feature = "testing")]
    pub fn sender(&self) -> UnboundedSender<RoutingCoreMsg> {
        self.tx.clone()
    }
}

/// The single owner of all OLSRv2 routing-core state. Exactly one task
/// drives this struct through [`RoutingCore::run`], processing one
/// [`RoutingCoreMsg`] at a time.
pub struct RoutingCore<T, N, F>
where
    T: Topology,
    N: NeighborDb,
    F: OsRouting,
{
    config: Config,
    topology: T,
    neighbors: N,
    facade: F,
    domains: DomainStore,
    table: RoutingTable,
    filters: FilterChain,
    trigger: Trigger,
    kernel_queue: KernelQueue,
    engine: Engine<T::TargetId>,
    locals: HashSet<IpAddr>,
    local_src_v4: Option<Ipv4Addr>,
    rx: UnboundedReceiver<RoutingCoreMsg>,
    notify: UnboundedSender<RoutingCoreMsg>,
    // Set once a shutdown has been initiated; from then on no new SPF run is
    // ever started, and `run` keeps draining `KernelOpDone` completions for
    // the teardown removes it just issued instead of exiting immediately.
    shutting_down: bool,
}

impl<T, N, F> RoutingCore<T, N, F>
where
    T: Topology,
    N: NeighborDb,
    F: OsRouting,
{
    pub fn new(
        config: Config,
        topology: T,
        neighbors: N,
        facade: F,
        locals: HashSet<IpAddr>,
        local_src_v4: Option<Ipv4Addr>,
    ) -> (RoutingCore<T, N, F>, RoutingCoreHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let rate_limit_window = config.rate_limit_window;
        let core = RoutingCore {
            config,
            topology,
            neighbors,
            facade,
            domains: DomainStore::default(),
            table: RoutingTable::new(),
            filters: FilterChain::new(),
            trigger: Trigger::new(rate_limit_window),
            kernel_queue: KernelQueue::new(),
            engine: Engine::new(),
            locals,
            local_src_v4,
            rx,
            notify: tx.clone(),
            shutting_down: false,
        };
        (core, RoutingCoreHandle { tx })
    }

    /// Drives the core until a shutdown completes or the message channel is
    /// closed.
    ///
    /// A [`RoutingCoreMsg::Shutdown`] does not end the loop by itself: it
    /// issues the teardown removes and then lets them complete through the
    /// ordinary `KernelOpDone` path, the same as any other kernel operation.
    /// The loop only exits once nothing is left to wait for (the table has
    /// emptied out) or the channel closes because every handle was dropped,
    /// at which point [`RoutingCore::cleanup`] force-interrupts whatever
    /// never reported back and destroys what remains.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            self.process_msg(msg);
            if self.shutting_down && self.table.iter().next().is_none() {
                break;
            }
        }
        self.cleanup();
    }

    fn process_msg(&mut self, msg: RoutingCoreMsg) {
        match msg {
            RoutingCoreMsg::NhdpUpdate => {
                self.trigger.trigger_update(&self.notify);
            }
            RoutingCoreMsg::RateLimitExpiry => {
                if !self.shutting_down
                    && self.trigger.on_timer_expiry(&self.notify)
                {
                    self.run_all_domains();
                }
            }
            RoutingCoreMsg::KernelOpDone {
                token,
                kind,
                result,
            } => {
                if let Err(error) = self.handle_kernel_op_done(token, kind, result) {
                    error.log();
                }
            }
            RoutingCoreMsg::SetDomainParameter { domain, params } => {
                if self.domains.set(domain, params) {
                    Debug::DomainParameterChanged(domain).log();
                    self.teardown_domain(domain);
                    self.trigger
                        .schedule_rebuild(self.config.parameter_change_delay, &self.notify);
                }
            }
            RoutingCoreMsg::AddFilter(filter) => {
                self.filters.add(filter);
                self.trigger.trigger_update(&self.notify);
            }
            RoutingCoreMsg::RemoveFilter(filter) => {
                self.filters.remove(&filter);
                self.trigger.trigger_update(&self.notify);
            }
            RoutingCoreMsg::ClearFilters => {
                self.filters.clear();
                self.trigger.trigger_update(&self.notify);
            }
            RoutingCoreMsg::Shutdown => {
                if !self.shutting_down {
                    self.shutting_down = true;
                    self.begin_shutdown();
                }
            }
        }
    }

    fn handle_kernel_op_done(
        &mut self,
        token: OpToken,
        kind: KernelOp,
        result: KernelOpResult,
    ) -> Result<(), Error> {
        if self.table.find(token.domain, token.prefix).is_none() {
            return Err(Error::UnexpectedKernelOpDone(token.domain, token.prefix));
        }
        if let crate::collaborators::KernelOpResult::Error(kernel_error) = result {
            let _span = debug_span!("kernel", domain = %token.domain, destination = %token.prefix)
                .entered();
            let error = Error::KernelOpFailed(token.domain, token.prefix, kernel_error);
            error.log();
        }
        self.kernel_queue
            .complete(token, kind, result, &mut self.table, &self.facade);
        self.kernel_queue.drain(&mut self.table, &self.facade);
        Ok(())
    }

    /// A domain's kernel route identity (table/protocol/metric) just
    /// changed: every currently-installed entry in `domain` must be torn
    /// down explicitly rather than mutated in place, since the kernel has no
    /// "update in place" for those fields. Any kernel operation still in
    /// flight for such an entry is interrupted first, so a stale add issued
    /// under the old parameters can't land after this point; the fresh SPF
    /// run scheduled by the caller re-adds with the new parameters once the
    /// teardown (and any interrupted op) has settled.
    fn teardown_domain(&mut self, domain: DomainIndex) {
        let in_flight: Vec<OpToken> = self
            .table
            .iter_domain(domain)
            .filter(|entry| entry.in_processing)
            .map(|entry| OpToken {
                domain,
                prefix: entry.destination,
            })
            .collect();
        for token in in_flight {
            self.facade.os_routing_interrupt(token);
        }

        let tokens: Vec<OpToken> = self
            .table
            .iter_domain_mut(domain)
            .filter(|entry| entry.state_current)
            .map(|entry| {
                entry.state_new = false;
                OpToken {
                    domain,
                    prefix: entry.destination,
                }
            })
            .collect();
        for token in tokens {
            if self
                .table
                .find(token.domain, token.prefix)
                .is_some_and(|entry| !entry.in_processing && !entry.queued)
            {
                self.kernel_queue.enqueue_tail(token);
            }
        }
        self.kernel_queue.drain(&mut self.table, &self.facade);
    }

    fn run_all_domains(&mut self) {
        let domains: Vec<(DomainIndex, DomainParams)> = self
            .domains
            .iter()
            .map(|(domain, params)| (domain, params.clone()))
            .collect();
        for (domain, params) in domains {
            self.engine.run_domain(
                domain,
                &self.topology,
                &self.neighbors,
                &self.locals,
                self.local_src_v4,
                &mut self.table,
                &self.filters,
                &params,
                &mut self.kernel_queue,
            );
        }
        self.kernel_queue.drain(&mut self.table, &self.facade);
    }

    /// Marks every installed entry as no longer wanted, enqueues the
    /// resulting removes, and drains what the facade can dispatch
    /// synchronously. Entries whose remove doesn't complete inline stay
    /// `in_processing`; `run`'s message loop keeps draining their
    /// `KernelOpDone` completions the same way it would outside a shutdown.
    fn begin_shutdown(&mut self) {
        for entry in self.table.iter_mut() {
            entry.state_new = false;
        }

        let tokens: Vec<OpToken> = self
            .table
            .iter()
            .filter(|entry| entry.state_current && !entry.in_processing)
            .map(|entry| OpToken {
                domain: entry.domain_index,
                prefix: entry.destination,
            })
            .collect();
        for token in tokens {
            self.kernel_queue.enqueue_tail(token);
        }
        self.kernel_queue.drain(&mut self.table, &self.facade);
    }

    /// Interrupts whatever kernel operation is still in flight and destroys
    /// all entries and filters. Called once after [`RoutingCore::run`]'s
    /// message loop exits, whether that's because the shutdown drained
    /// cleanly or because the channel closed with work still outstanding.
    fn cleanup(&mut self) {
        let pending: Vec<OpToken> = self
            .table
            .iter()
            .filter(|entry| entry.in_processing)
            .map(|entry| OpToken {
                domain: entry.domain_index,
                prefix: entry.destination,
            })
            .collect();
        for token in pending {
            self.facade.os_routing_interrupt(token);
        }

        self.filters.clear();
        for domain in 0..MAX_DOMAINS {
            if let Some(domain) = DomainIndex::new(domain) {
                self.table.remove_domain(domain);
            }
        }
    }
}

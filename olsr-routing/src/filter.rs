//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use crate::domain::DomainIndex;
use crate::route::KernelRoute;
use crate::Prefix;

/// A single route-admission check.
///
/// Implementations decide whether a candidate route should ever reach the
/// kernel queue. A filter that returns `false` vetoes the candidate outright;
/// the corresponding [`crate::table::RoutingEntry`] is treated as though the
/// Dijkstra engine hadn't selected it at all for this run.
pub trait Filter: Send + Sync {
    fn accept(&self, domain: DomainIndex, destination: Prefix, route: &KernelRoute) -> bool;
}

/// An ordered chain of filters. A candidate is admitted only if every
/// filter in the chain accepts it.
///
/// Filters are held behind `Arc` rather than `Box` so that a caller can keep
/// its own clone of the handle it passed to [`FilterChain::add`] and later
/// hand that same clone to [`FilterChain::remove`]; the chain identifies the
/// entry to drop by pointer rather than by any content comparison.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> FilterChain {
        FilterChain::default()
    }

    pub fn add(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Removes the filter identified by `filter`, if it is still present.
    /// Returns `true` if a filter was actually removed.
    pub fn remove(&mut self, filter: &Arc<dyn Filter>) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| !Arc::ptr_eq(f, filter));
        self.filters.len() != before
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn accept(&self, domain: DomainIndex, destination: Prefix, route: &KernelRoute) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.accept(domain, destination, route))
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}

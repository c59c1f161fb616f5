//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace};

use crate::collaborators::{KernelOp, KernelOpResult, OpToken};
use crate::domain::DomainIndex;

// OLSRv2 routing core debugging messages.
pub enum Debug {
    // SPF
    SpfRunStarted(DomainIndex),
    SpfRunFinished(DomainIndex),

    // Kernel reconciliation queue
    EntryEnqueued(OpToken, bool),
    KernelOpIssued(OpToken, KernelOp),
    KernelOpDone(OpToken, KernelOp, KernelOpResult),

    // Rate limiter
    TriggerCoalesced,
    TriggerFired,

    // Domain parameters
    DomainParameterChanged(DomainIndex),
}

// ===== impl Debug =====

impl Debug {
    pub(crate) fn log(&self) {
        match self {
            Debug::SpfRunStarted(domain) | Debug::SpfRunFinished(domain) => {
                debug_span!("spf", %domain).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::EntryEnqueued(token, head) => {
                debug_span!("kernel", domain = %token.domain, destination = %token.prefix)
                    .in_scope(|| {
                        trace!(head, "{}", self);
                    })
            }
            Debug::KernelOpIssued(token, kind) => {
                debug_span!("kernel", domain = %token.domain, destination = %token.prefix)
                    .in_scope(|| {
                        debug!(?kind, "{}", self);
                    })
            }
            Debug::KernelOpDone(token, kind, result) => {
                debug_span!("kernel", domain = %token.domain, destination = %token.prefix)
                    .in_scope(|| {
                        debug!(?kind, ?result, "{}", self);
                    })
            }
            Debug::TriggerCoalesced | Debug::TriggerFired => {
                trace!("{}", self);
            }
            Debug::DomainParameterChanged(domain) => {
                debug!(%domain, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::SpfRunStarted(..) => write!(f, "SPF run started"),
            Debug::SpfRunFinished(..) => write!(f, "SPF run finished"),
            Debug::EntryEnqueued(..) => write!(f, "entry enqueued"),
            Debug::KernelOpIssued(..) => write!(f, "kernel operation issued"),
            Debug::KernelOpDone(..) => write!(f, "kernel operation done"),
            Debug::TriggerCoalesced => write!(f, "update coalesced"),
            Debug::TriggerFired => write!(f, "rate limit window expired"),
            Debug::DomainParameterChanged(..) => write!(f, "domain parameters changed"),
        }
    }
}

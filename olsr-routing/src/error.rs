//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{error, warn, warn_span};

use crate::Prefix;
use crate::collaborators::KernelError;
use crate::domain::DomainIndex;

// OLSRv2 routing core errors.
#[derive(Debug)]
pub enum Error {
    // A domain was addressed that has no parameters configured.
    UnknownDomain(DomainIndex),
    // `DomainIndex::new` was asked for a slot beyond `MAX_DOMAINS`.
    DomainLimitExceeded(usize),
    // A kernel operation completed for an entry that no longer exists, or
    // that wasn't expecting a completion of that kind.
    UnexpectedKernelOpDone(DomainIndex, Prefix),
    // The kernel facade reported a failure other than ESRCH.
    KernelOpFailed(DomainIndex, Prefix, KernelError),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::UnknownDomain(domain) => {
                warn!(%domain, "{}", self);
            }
            Error::DomainLimitExceeded(index) => {
                warn!(%index, "{}", self);
            }
            Error::UnexpectedKernelOpDone(domain, prefix) => {
                warn_span!("kernel", %domain, %prefix).in_scope(|| {
                    warn!("{}", self);
                });
            }
            Error::KernelOpFailed(domain, prefix, error) => {
                warn_span!("kernel", %domain, %prefix).in_scope(|| {
                    error!(%error, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownDomain(..) => {
                write!(f, "unknown domain")
            }
            Error::DomainLimitExceeded(..) => {
                write!(f, "domain limit exceeded")
            }
            Error::UnexpectedKernelOpDone(..) => {
                write!(f, "unexpected kernel operation completion")
            }
            Error::KernelOpFailed(..) => {
                write!(f, "kernel operation failed")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// Recursively chains `source()` errors into a single display string.
#[allow(dead_code)]
pub(crate) fn with_source<E: std::error::Error>(error: E) -> String {
    let mut msg = error.to_string();
    let mut source = error.source();
    while let Some(error) = source {
        msg.push_str(": ");
        msg.push_str(&error.to_string());
        source = error.source();
    }
    msg
}

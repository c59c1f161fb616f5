//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

// Kernel-visible routing protocol identity. Used to tag routes installed by
// a domain so they can be told apart from routes owned by other protocols
// sharing the same table.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Olsrv2,
    Static,
    Direct,
}

// ===== impl Protocol =====

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Olsrv2 => write!(f, "olsrv2"),
            Protocol::Static => write!(f, "static"),
            Protocol::Direct => write!(f, "direct"),
        }
    }
}

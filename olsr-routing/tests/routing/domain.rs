//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use olsr_routing::domain::{DomainIndex, DomainParams, DomainStore};

// Changing a domain's kernel parameters must be reported as a change
// exactly when the new value differs from the old one.
#[test]
fn domain_parameter_change_detects_no_change() {
    let mut domains = DomainStore::default();
    let domain = DomainIndex::new(0).unwrap();
    let params = DomainParams::default();

    assert!(domains.set(domain, params.clone()));
    assert!(!domains.set(domain, params.clone()));

    let mut changed = params;
    changed.table = 100;
    assert!(domains.set(domain, changed));
}

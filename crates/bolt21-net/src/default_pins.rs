//! Built-in certificate pins
//!
//! Pins for the Bolt21 backend API and the federated Lightning service
//! provider nodes the wallet talks to. These hosts are issued by Let's
//! Encrypt, so the pins are CA-level: ISRG Root X1 (RSA) and ISRG Root X2
//! (ECDSA), with GTS Root R1 as the off-CA backup for an emergency issuer
//! switch. Roots are never sent by servers; the verifier pins them through
//! the trust anchor the chain was verified against.

use crate::pin::PinnedDomain;
use crate::policy::{ExpiryPolicy, PinPolicy};
use crate::Result;
use chrono::NaiveDate;

/// ISRG Root X1 SPKI
pub const ISRG_ROOT_X1: &str = "C5+lpZ7tcVwmwQIMcRtPbsQtWLABXhQzejna0wHFr8M=";

/// ISRG Root X2 SPKI
pub const ISRG_ROOT_X2: &str = "diGVwiVYbubAI3RW4hB9xU8e/CH2GnkuvVFZE8zmgzI=";

/// GTS Root R1 SPKI
pub const GTS_ROOT_R1: &str = "hxqRlPTu1bMS/0DITB1SSu0vd4u/8l8TjPgfaAp63Gc=";

/// Wallet backend API
pub const API_HOST: &str = "api.bolt21.io";

/// Federated LSP node operators
pub const LSP_HOSTS: &[&str] = &["lsp.bolt21.io", "lsp-eu.bolt21.io"];

/// Review date for the built-in pins
pub fn default_expiration() -> NaiveDate {
    NaiveDate::from_ymd_opt(2027, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Built-in pinned domains
pub fn default_domains() -> Result<Vec<PinnedDomain>> {
    let pins = [ISRG_ROOT_X1, ISRG_ROOT_X2, GTS_ROOT_R1];

    let api = PinnedDomain::new(API_HOST, default_expiration(), pins)?.with_subdomains();
    let mut domains = vec![api];

    for host in LSP_HOSTS {
        domains.push(PinnedDomain::new(host, default_expiration(), pins)?);
    }

    Ok(domains)
}

/// Built-in policy, failing open on expiry
pub fn default_policy() -> Result<PinPolicy> {
    PinPolicy::builder()
        .domains(default_domains()?)
        .expiry_policy(ExpiryPolicy::FailOpen)
        .build()
}

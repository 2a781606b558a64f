//! Pinned domain records
//!
//! A pinned domain binds a host to a set of SHA-256 hashes of Subject
//! Public Key Info (SPKI), base64 encoded.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum pins per domain: the live key plus at least one backup
pub const MIN_PINS_PER_DOMAIN: usize = 2;

/// Length of a base64 SHA-256 digest
pub const PIN_LENGTH: usize = 44;

fn default_enforce() -> bool {
    true
}

/// Immutable pin configuration for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedDomain {
    host: String,
    #[serde(default)]
    include_subdomains: bool,
    #[serde(default = "default_enforce")]
    enforce: bool,
    expiration: NaiveDate,
    pin_hashes: BTreeSet<String>,
}

impl PinnedDomain {
    /// Create an enforced pin set for `host` that does not cover subdomains.
    pub fn new<I, S>(host: &str, expiration: NaiveDate, pins: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let domain = Self {
            host: normalize_host(host)?,
            include_subdomains: false,
            enforce: true,
            expiration,
            pin_hashes: pins.into_iter().map(Into::into).collect(),
        };
        domain.validate()?;
        Ok(domain)
    }

    /// Extend the pin to every subdomain of the host
    pub fn with_subdomains(mut self) -> Self {
        self.include_subdomains = true;
        self
    }

    /// Log mismatches instead of aborting the connection
    pub fn report_only(mut self) -> Self {
        self.enforce = false;
        self
    }

    /// Check the record invariants.
    ///
    /// Records built through [`PinnedDomain::new`] are always valid; this is
    /// re-run for records that arrive through deserialization.
    pub fn validate(&self) -> Result<()> {
        if self.host != normalize_host(&self.host)? {
            return Err(Error::InvalidPin(format!(
                "Host {} is not normalized",
                self.host
            )));
        }

        if self.pin_hashes.len() < MIN_PINS_PER_DOMAIN {
            return Err(Error::InvalidPin(format!(
                "{} has {} pin(s); at least {} are required so a backup key survives rotation",
                self.host,
                self.pin_hashes.len(),
                MIN_PINS_PER_DOMAIN
            )));
        }

        for pin in &self.pin_hashes {
            validate_pin(pin)?;
        }

        Ok(())
    }

    /// Pinned host (lowercase, no trailing dot)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether subdomains are covered
    pub fn include_subdomains(&self) -> bool {
        self.include_subdomains
    }

    /// Whether a mismatch aborts the connection
    pub fn enforce(&self) -> bool {
        self.enforce
    }

    /// Last day (UTC) on which the pins are considered current
    pub fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    /// Pinned SPKI hashes
    pub fn pin_hashes(&self) -> &BTreeSet<String> {
        &self.pin_hashes
    }

    /// Whether the pin set is past its expiration date
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.date_naive() > self.expiration
    }

    /// Whether this record applies to `host` (already normalized)
    pub fn covers(&self, host: &str) -> bool {
        if host == self.host {
            return true;
        }
        self.include_subdomains
            && host.len() > self.host.len() + 1
            && host.ends_with(self.host.as_str())
            && host.as_bytes()[host.len() - self.host.len() - 1] == b'.'
    }

    /// Whether any presented hash is in the pin set
    pub fn matches<'a, I>(&self, presented: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        presented
            .into_iter()
            .any(|hash| self.pin_hashes.contains(hash))
    }
}

/// Validate pin format (base64 SHA-256)
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() != PIN_LENGTH {
        return Err(Error::InvalidPin(format!(
            "Invalid pin format: expected {} chars, got {}",
            PIN_LENGTH,
            pin.len()
        )));
    }

    let decoded = STANDARD
        .decode(pin)
        .map_err(|e| Error::InvalidPin(format!("Pin is not valid base64: {}", e)))?;
    if decoded.len() != 32 {
        return Err(Error::InvalidPin(format!(
            "Pin decodes to {} bytes, expected 32",
            decoded.len()
        )));
    }

    Ok(())
}

/// Lowercase a host and strip the trailing root dot
pub fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();

    if host.is_empty() {
        return Err(Error::InvalidPin("Empty host".to_string()));
    }
    if host.contains(|c: char| c.is_whitespace() || matches!(c, '/' | '*' | '@')) {
        return Err(Error::InvalidPin(format!("Invalid host: {}", host)));
    }

    Ok(host)
}

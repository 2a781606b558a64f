//! Certificate pin policy
//!
//! Maps hosts to [`PinnedDomain`] records and decides, for a presented
//! certificate chain, whether a connection may proceed.

use crate::pin::{normalize_host, PinnedDomain};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Behavior for pin sets past their expiration date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Stop enforcing expired pins and log an error on every use
    #[default]
    FailOpen,
    /// Refuse connections to hosts whose pins have expired
    FailClosed,
}

/// Outcome of evaluating a certificate chain against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinVerdict {
    /// No pinned domain covers the host
    NotPinned,
    /// A presented key matched a pin
    Matched {
        /// Pinned domain that applied
        domain: String,
    },
    /// Mismatch on a report-only domain
    ReportOnlyMismatch {
        /// Pinned domain that applied
        domain: String,
    },
    /// Mismatch on an enforced domain
    Rejected {
        /// Pinned domain that applied
        domain: String,
    },
    /// Pins expired, connection allowed under [`ExpiryPolicy::FailOpen`]
    ExpiredBypassed {
        /// Pinned domain that applied
        domain: String,
    },
    /// Pins expired, connection refused under [`ExpiryPolicy::FailClosed`]
    ExpiredRejected {
        /// Pinned domain that applied
        domain: String,
    },
}

impl PinVerdict {
    /// Whether the network layer may continue with the connection
    pub fn allows_connection(&self) -> bool {
        !matches!(self, Self::Rejected { .. } | Self::ExpiredRejected { .. })
    }
}

/// Immutable host → pinned domain mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinPolicy {
    domains: BTreeMap<String, PinnedDomain>,
    expiry_policy: ExpiryPolicy,
}

impl PinPolicy {
    /// Start building a policy
    pub fn builder() -> PinPolicyBuilder {
        PinPolicyBuilder::default()
    }

    /// Number of pinned domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether no domains are pinned
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Configured expiry behavior
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry_policy
    }

    /// Pinned domains, ordered by host
    pub fn domains(&self) -> impl Iterator<Item = &PinnedDomain> {
        self.domains.values()
    }

    /// Record configured for exactly `host`
    pub fn get(&self, host: &str) -> Option<&PinnedDomain> {
        let host = normalize_host(host).ok()?;
        self.domains.get(&host)
    }

    /// Find the record that applies to `host`.
    ///
    /// An exact entry always wins. Otherwise the closest parent domain
    /// with `include_subdomains` set applies.
    pub fn lookup(&self, host: &str) -> Option<&PinnedDomain> {
        let host = normalize_host(host).ok()?;

        if let Some(domain) = self.domains.get(&host) {
            return Some(domain);
        }

        host.match_indices('.')
            .map(|(idx, _)| &host[idx + 1..])
            .filter_map(|parent| self.domains.get(parent))
            .find(|domain| domain.covers(&host))
    }

    /// Domains whose pins are past expiration at `now`
    pub fn expired_domains(&self, now: DateTime<Utc>) -> Vec<&PinnedDomain> {
        self.domains
            .values()
            .filter(|domain| domain.is_expired(now))
            .collect()
    }

    /// Evaluate the SPKI hashes of a presented chain for `host`
    pub fn evaluate<'a, I>(&self, host: &str, presented: I, now: DateTime<Utc>) -> PinVerdict
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(domain) = self.lookup(host) else {
            debug!("No pins configured for {}", host);
            return PinVerdict::NotPinned;
        };
        let name = domain.host().to_string();

        if domain.is_expired(now) {
            return match self.expiry_policy {
                ExpiryPolicy::FailOpen => {
                    error!(
                        event = "pin_policy_stale",
                        host = %host,
                        domain = %name,
                        expiration = %domain.expiration(),
                        "Pins expired; connection NOT pin-validated"
                    );
                    PinVerdict::ExpiredBypassed { domain: name }
                }
                ExpiryPolicy::FailClosed => {
                    error!(
                        event = "pin_policy_stale",
                        host = %host,
                        domain = %name,
                        expiration = %domain.expiration(),
                        "Pins expired; refusing connection"
                    );
                    PinVerdict::ExpiredRejected { domain: name }
                }
            };
        }

        if domain.matches(presented) {
            debug!("Certificate pin verified for {}", host);
            return PinVerdict::Matched { domain: name };
        }

        if domain.enforce() {
            error!(
                event = "pin_mismatch",
                host = %host,
                domain = %name,
                enforced = true,
                "Certificate pin mismatch; aborting connection"
            );
            PinVerdict::Rejected { domain: name }
        } else {
            warn!(
                event = "pin_mismatch",
                host = %host,
                domain = %name,
                enforced = false,
                "Certificate pin mismatch (not enforced)"
            );
            PinVerdict::ReportOnlyMismatch { domain: name }
        }
    }

    /// Export pinned domains as JSON
    pub fn export(&self) -> Result<String> {
        let all: Vec<&PinnedDomain> = self.domains.values().collect();
        serde_json::to_string_pretty(&all)
            .map_err(|e| Error::Config(format!("Failed to export pins: {}", e)))
    }
}

/// Builder for [`PinPolicy`]
#[derive(Debug, Default)]
pub struct PinPolicyBuilder {
    domains: Vec<PinnedDomain>,
    expiry_policy: ExpiryPolicy,
}

impl PinPolicyBuilder {
    /// Add one pinned domain
    pub fn domain(mut self, domain: PinnedDomain) -> Self {
        self.domains.push(domain);
        self
    }

    /// Add several pinned domains
    pub fn domains<I>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = PinnedDomain>,
    {
        self.domains.extend(domains);
        self
    }

    /// Choose the behavior for expired pins
    pub fn expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    /// Validate every record and freeze the mapping
    pub fn build(self) -> Result<PinPolicy> {
        let mut domains = BTreeMap::new();

        for domain in self.domains {
            domain.validate()?;
            let host = domain.host().to_string();
            if domains.insert(host.clone(), domain).is_some() {
                return Err(Error::DuplicateDomain(host));
            }
        }

        Ok(PinPolicy {
            domains,
            expiry_policy: self.expiry_policy,
        })
    }
}

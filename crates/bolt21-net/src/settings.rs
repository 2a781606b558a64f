//! Pinning configuration
//!
//! Serializable form of the pin policy, embedded in the app shell config.

use crate::default_pins::default_domains;
use crate::pin::PinnedDomain;
use crate::policy::{ExpiryPolicy, PinPolicy};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Pinning settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinningSettings {
    /// Behavior once a domain's pins expire
    #[serde(default)]
    pub expiry_policy: ExpiryPolicy,
    /// Pinned domains; omitted means the built-in set
    #[serde(default = "builtin_domains")]
    pub domains: Vec<PinnedDomain>,
}

fn builtin_domains() -> Vec<PinnedDomain> {
    default_domains().unwrap_or_default()
}

impl Default for PinningSettings {
    fn default() -> Self {
        Self {
            expiry_policy: ExpiryPolicy::default(),
            domains: builtin_domains(),
        }
    }
}

impl PinningSettings {
    /// Validate and freeze into a policy
    pub fn into_policy(self) -> Result<PinPolicy> {
        PinPolicy::builder()
            .domains(self.domains)
            .expiry_policy(self.expiry_policy)
            .build()
    }
}

//! Pinning policy bootstrap
//!
//! The policy is registered once, before the first request. After that,
//! every [`rustls::ClientConfig`] handed out carries the pinning verifier,
//! so callers get pin validation without any further integration.

use crate::policy::PinPolicy;
use crate::verifier::PinningVerifier;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{error, info, warn};

static GLOBAL: PinningBootstrap = PinningBootstrap::new();

/// Write-once holder for the process pin policy
#[derive(Debug, Default)]
pub struct PinningBootstrap {
    policy: OnceCell<Arc<PinPolicy>>,
}

impl PinningBootstrap {
    /// Create an uninitialized bootstrap
    pub const fn new() -> Self {
        Self {
            policy: OnceCell::new(),
        }
    }

    /// Process-wide bootstrap used by the app shell
    pub fn global() -> &'static PinningBootstrap {
        &GLOBAL
    }

    /// Register the policy.
    ///
    /// Only the first call takes effect. Later calls leave the installed
    /// policy untouched and return [`Error::AlreadyInitialized`].
    pub fn initialize(&self, policy: PinPolicy) -> Result<Arc<PinPolicy>> {
        self.initialize_at(policy, Utc::now())
    }

    pub(crate) fn initialize_at(
        &self,
        policy: PinPolicy,
        now: DateTime<Utc>,
    ) -> Result<Arc<PinPolicy>> {
        let policy = Arc::new(policy);
        if self.policy.set(Arc::clone(&policy)).is_err() {
            warn!("Pinning policy already initialized; ignoring second registration");
            return Err(Error::AlreadyInitialized);
        }

        for domain in policy.expired_domains(now) {
            error!(
                event = "pin_policy_stale",
                host = %domain.host(),
                expiration = %domain.expiration(),
                expiry_policy = ?policy.expiry_policy(),
                "Pinned domain is past its expiration date; update the pin configuration"
            );
        }

        info!(
            event = "pin_policy_installed",
            domains = policy.len(),
            expiry_policy = ?policy.expiry_policy(),
            "Certificate pinning policy installed"
        );

        Ok(policy)
    }

    /// Whether a policy has been registered
    pub fn is_initialized(&self) -> bool {
        self.policy.get().is_some()
    }

    /// Installed policy
    pub fn policy(&self) -> Result<Arc<PinPolicy>> {
        self.policy.get().cloned().ok_or(Error::NotInitialized)
    }

    /// Pinning verifier over WebPKI roots for the installed policy
    pub fn verifier(&self) -> Result<Arc<PinningVerifier>> {
        Ok(Arc::new(PinningVerifier::with_webpki_roots(self.policy()?)?))
    }

    /// TLS client configuration for the network layer
    pub fn client_config(&self) -> Result<rustls::ClientConfig> {
        let verifier = self.verifier()?;
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(format!("Failed to select protocol versions: {}", e)))?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();

        Ok(config)
    }
}

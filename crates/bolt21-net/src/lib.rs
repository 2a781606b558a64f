//! Transport trust for the Bolt21 wallet
//!
//! Builds the per-domain certificate pin policy and registers it once at
//! startup. The network layer picks it up through the rustls
//! [`ClientConfig`](rustls::ClientConfig) returned by
//! [`PinningBootstrap::client_config`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod default_pins;
pub mod error;
pub mod pin;
pub mod policy;
pub mod settings;
pub mod spki;
pub mod verifier;

// Re-export main types
pub use bootstrap::PinningBootstrap;
pub use default_pins::default_policy;
pub use error::{Error, Result};
pub use pin::{PinnedDomain, MIN_PINS_PER_DOMAIN};
pub use policy::{ExpiryPolicy, PinPolicy, PinPolicyBuilder, PinVerdict};
pub use settings::PinningSettings;
pub use spki::{extract_spki_from_cert_der, spki_sha256_base64, trust_anchor_pin};
pub use verifier::PinningVerifier;

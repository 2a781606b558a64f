//! rustls trust hook
//!
//! [`PinningVerifier`] runs the normal WebPKI chain and hostname checks
//! first, then checks pins against the verified path: end entity, the
//! intermediates actually used, and the trust anchor the path ends at.
//! Certificates the server sent but the path does not use never count. An
//! enforced mismatch fails the handshake, so no application data is ever
//! exchanged with the peer.

use crate::pin::PinnedDomain;
use crate::policy::PinPolicy;
use crate::spki::{extract_spki_from_cert_der, spki_sha256_base64, trust_anchor_pin};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::{CertificateError, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, TrustAnchor, UnixTime};
use std::cell::RefCell;
use std::sync::Arc;
use tracing::{debug, warn};
use webpki::{EndEntityCert, KeyUsage, VerifiedPath};

/// Certificate verifier enforcing a [`PinPolicy`]
#[derive(Debug)]
pub struct PinningVerifier {
    inner: Arc<dyn ServerCertVerifier>,
    anchors: Vec<TrustAnchor<'static>>,
    algorithms: WebPkiSupportedAlgorithms,
    policy: Arc<PinPolicy>,
}

impl PinningVerifier {
    /// Wrap an existing verifier
    ///
    /// Without trust anchors only the presented certificates can be
    /// pinned, so root pins never match. Prefer [`Self::with_roots`].
    pub fn new(inner: Arc<dyn ServerCertVerifier>, policy: Arc<PinPolicy>) -> Self {
        Self {
            inner,
            anchors: Vec::new(),
            algorithms: rustls::crypto::ring::default_provider().signature_verification_algorithms,
            policy,
        }
    }

    /// Layer pinning over WebPKI validation against `roots`
    pub fn with_roots(roots: RootCertStore, policy: Arc<PinPolicy>) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let algorithms = provider.signature_verification_algorithms;
        let anchors = roots.roots.clone();

        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| Error::Tls(format!("Failed to build WebPKI verifier: {}", e)))?;

        Ok(Self {
            inner,
            anchors,
            algorithms,
            policy,
        })
    }

    /// Layer pinning over WebPKI validation against the Mozilla root set
    pub fn with_webpki_roots(policy: Arc<PinPolicy>) -> Result<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_roots(roots, policy)
    }

    /// Policy this verifier enforces
    pub fn policy(&self) -> &Arc<PinPolicy> {
        &self.policy
    }

    /// Pins of every verified path, stopping at the first one that matches
    fn verified_path_pins(
        &self,
        host: &str,
        domain: &PinnedDomain,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Vec<String> {
        let cert = match EndEntityCert::try_from(end_entity) {
            Ok(cert) => cert,
            Err(e) => {
                warn!("Unparsable end entity for {}: {}", host, e);
                return Vec::new();
            }
        };

        let seen = RefCell::new(Vec::new());
        let check_path: &dyn Fn(&VerifiedPath<'_>) -> std::result::Result<(), webpki::Error> =
            &|path| {
                let pins = path_pins(path);
                let matched = domain.matches(pins.iter().map(String::as_str));
                seen.borrow_mut().extend(pins);
                if matched {
                    Ok(())
                } else {
                    // Keep building: another path may end at a pinned anchor
                    Err(webpki::Error::UnknownIssuer)
                }
            };

        if let Err(e) = cert.verify_for_usage(
            self.algorithms.all,
            &self.anchors,
            intermediates,
            now,
            KeyUsage::server_auth(),
            None,
            Some(check_path),
        ) {
            debug!("No verified path to {} carries a pinned key: {}", host, e);
        }

        seen.into_inner()
    }

    fn presented_pins(
        host: &str,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
    ) -> Vec<String> {
        std::iter::once(end_entity)
            .chain(intermediates.iter())
            .filter_map(|cert| match extract_spki_from_cert_der(cert) {
                Ok(pin) => Some(pin),
                Err(e) => {
                    warn!("Skipping unparsable certificate for {}: {}", host, e);
                    None
                }
            })
            .collect()
    }

    fn check_pins(
        &self,
        host: &str,
        domain: &PinnedDomain,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> std::result::Result<(), rustls::Error> {
        let pins = if self.anchors.is_empty() {
            Self::presented_pins(host, end_entity, intermediates)
        } else {
            self.verified_path_pins(host, domain, end_entity, intermediates, now)
        };

        let now = DateTime::<Utc>::from_timestamp(now.as_secs() as i64, 0)
            .unwrap_or_else(Utc::now);
        let verdict = self
            .policy
            .evaluate(host, pins.iter().map(String::as_str), now);

        if verdict.allows_connection() {
            Ok(())
        } else {
            Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ))
        }
    }
}

fn path_pins(path: &VerifiedPath<'_>) -> Vec<String> {
    let mut pins = vec![spki_sha256_base64(
        path.end_entity().subject_public_key_info().as_ref(),
    )];
    pins.extend(
        path.intermediate_certificates()
            .map(|cert| spki_sha256_base64(cert.subject_public_key_info().as_ref())),
    );
    pins.push(trust_anchor_pin(path.anchor()));
    pins
}

fn host_of(server_name: &ServerName<'_>) -> Option<String> {
    match server_name {
        ServerName::DnsName(name) => Some(name.as_ref().to_ascii_lowercase()),
        ServerName::IpAddress(ip) => Some(std::net::IpAddr::from(*ip).to_string()),
        _ => None,
    }
}

impl ServerCertVerifier for PinningVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let verified = self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        )?;

        let Some(host) = host_of(server_name) else {
            return Ok(verified);
        };
        let Some(domain) = self.policy.lookup(&host) else {
            debug!("No pins configured for {}", host);
            return Ok(verified);
        };

        self.check_pins(&host, domain, end_entity, intermediates, now)?;
        Ok(verified)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

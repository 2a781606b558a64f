//! SPKI hashing
//!
//! Pins are the base64 SHA-256 of a certificate's DER-encoded
//! SubjectPublicKeyInfo, the same value produced by:
//!
//! ```bash
//! openssl x509 -in cert.pem -pubkey -noout | \
//!   openssl pkey -pubin -outform der | \
//!   openssl dgst -sha256 -binary | \
//!   base64
//! ```
//!
//! Servers never send their root, so root pins are computed from the
//! [`TrustAnchor`] the chain was verified against.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rustls_pki_types::{CertificateDer, TrustAnchor};
use sha2::{Digest, Sha256};

/// Hash DER-encoded SPKI bytes into pin form
pub fn spki_sha256_base64(spki_der: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(spki_der))
}

/// Extract the SPKI pin from a DER certificate
pub fn extract_spki_from_cert_der(cert: &CertificateDer<'_>) -> Result<String> {
    let parsed = webpki::EndEntityCert::try_from(cert)
        .map_err(|e| Error::Tls(format!("Failed to parse certificate: {}", e)))?;
    let spki = parsed.subject_public_key_info();
    Ok(spki_sha256_base64(spki.as_ref()))
}

/// Pin of a trust anchor's key
///
/// Trust anchors store the SPKI contents without the outer `SEQUENCE`, so
/// it is re-wrapped before hashing to match the certificate form.
pub fn trust_anchor_pin(anchor: &TrustAnchor<'_>) -> String {
    spki_sha256_base64(&der_sequence(anchor.subject_public_key_info.as_ref()))
}

fn der_sequence(contents: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(contents.len() + 6);
    out.push(0x30);

    let len = contents.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }

    out.extend_from_slice(contents);
    out
}

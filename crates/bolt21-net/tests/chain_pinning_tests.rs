//! Verifier tests over generated certificate chains
//!
//! Servers present leaf + intermediate and never the root, so these chains
//! are served the same way.

use bolt21_net::{extract_spki_from_cert_der, PinPolicy, PinnedDomain, PinningVerifier};
use chrono::NaiveDate;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
};
use rustls::client::danger::ServerCertVerifier;
use rustls::{CertificateError, RootCertStore};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::Arc;

const HOST: &str = "api.example.com";

struct Chain {
    root: Certificate,
    intermediate: Certificate,
    leaf: Certificate,
}

impl Chain {
    fn generate() -> Self {
        let root_key = KeyPair::generate().unwrap();
        let root = ca_params("Test Root CA").self_signed(&root_key).unwrap();

        let intermediate_key = KeyPair::generate().unwrap();
        let intermediate = ca_params("Test Issuing CA")
            .signed_by(&intermediate_key, &root, &root_key)
            .unwrap();

        let leaf_key = KeyPair::generate().unwrap();
        let mut leaf_params = CertificateParams::new(vec![HOST.to_string()]).unwrap();
        leaf_params.distinguished_name = DistinguishedName::new();
        leaf_params.distinguished_name.push(DnType::CommonName, HOST);
        let leaf = leaf_params
            .signed_by(&leaf_key, &intermediate, &intermediate_key)
            .unwrap();

        Self {
            root,
            intermediate,
            leaf,
        }
    }

    fn roots(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();
        roots.add(self.root.der().clone()).unwrap();
        roots
    }

    fn root_pin(&self) -> String {
        extract_spki_from_cert_der(self.root.der()).unwrap()
    }

    fn intermediate_pin(&self) -> String {
        extract_spki_from_cert_der(self.intermediate.der()).unwrap()
    }

    fn leaf_pin(&self) -> String {
        extract_spki_from_cert_der(self.leaf.der()).unwrap()
    }
}

fn ca_params(name: &str) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, name);
    params
}

fn backup_pin() -> String {
    bolt21_net::default_pins::ISRG_ROOT_X2.to_string()
}

fn verifier_for(chain: &Chain, domain: PinnedDomain) -> PinningVerifier {
    let policy = PinPolicy::builder().domain(domain).build().unwrap();
    PinningVerifier::with_roots(chain.roots(), Arc::new(policy)).unwrap()
}

fn pinned(pins: Vec<String>) -> PinnedDomain {
    PinnedDomain::new(HOST, NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(), pins).unwrap()
}

fn serve(
    verifier: &PinningVerifier,
    end_entity: &CertificateDer<'_>,
    intermediates: &[CertificateDer<'_>],
) -> Result<(), rustls::Error> {
    let name = ServerName::try_from(HOST.to_string()).unwrap();
    verifier
        .verify_server_cert(end_entity, intermediates, &name, &[], UnixTime::now())
        .map(|_| ())
}

fn serve_chain(verifier: &PinningVerifier, chain: &Chain) -> Result<(), rustls::Error> {
    serve(verifier, chain.leaf.der(), &[chain.intermediate.der().clone()])
}

fn rejected() -> rustls::Error {
    rustls::Error::InvalidCertificate(CertificateError::ApplicationVerificationFailure)
}

#[test]
fn test_root_pin_matches_chain_without_root() {
    let chain = Chain::generate();
    let verifier = verifier_for(&chain, pinned(vec![chain.root_pin(), backup_pin()]));

    assert!(serve_chain(&verifier, &chain).is_ok());
}

#[test]
fn test_leaf_pin_accepted() {
    let chain = Chain::generate();
    let verifier = verifier_for(&chain, pinned(vec![chain.leaf_pin(), backup_pin()]));

    assert!(serve_chain(&verifier, &chain).is_ok());
}

#[test]
fn test_intermediate_pin_accepted() {
    let chain = Chain::generate();
    let verifier = verifier_for(&chain, pinned(vec![chain.intermediate_pin(), backup_pin()]));

    assert!(serve_chain(&verifier, &chain).is_ok());
}

#[test]
fn test_valid_chain_with_unpinned_keys_rejected() {
    let chain = Chain::generate();
    let other = Chain::generate();
    let verifier = verifier_for(&chain, pinned(vec![other.root_pin(), backup_pin()]));

    assert_eq!(serve_chain(&verifier, &chain).unwrap_err(), rejected());
}

#[test]
fn test_report_only_mismatch_connects() {
    let chain = Chain::generate();
    let other = Chain::generate();
    let domain = pinned(vec![other.root_pin(), backup_pin()]).report_only();
    let verifier = verifier_for(&chain, domain);

    assert!(serve_chain(&verifier, &chain).is_ok());
}

#[test]
fn test_unused_certificate_with_pinned_key_ignored() {
    // Pinned keys are public; appending a certificate that carries one
    // must not satisfy the pin when the path does not use it.
    let chain = Chain::generate();
    let legit = Chain::generate();
    let verifier = verifier_for(&chain, pinned(vec![legit.leaf_pin(), backup_pin()]));

    let result = serve(
        &verifier,
        chain.leaf.der(),
        &[chain.intermediate.der().clone(), legit.leaf.der().clone()],
    );
    assert_eq!(result.unwrap_err(), rejected());
}

#[test]
fn test_untrusted_chain_fails_before_pinning() {
    let chain = Chain::generate();
    let stranger = Chain::generate();
    let verifier = verifier_for(&chain, pinned(vec![stranger.root_pin(), backup_pin()]));

    let err = serve_chain(&verifier, &stranger).unwrap_err();
    assert_ne!(err, rejected());
}

#[test]
fn test_unpinned_host_only_needs_valid_chain() {
    let chain = Chain::generate();
    let domain = PinnedDomain::new(
        "other.example.com",
        NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        vec![backup_pin(), bolt21_net::default_pins::ISRG_ROOT_X1.to_string()],
    )
    .unwrap();
    let verifier = verifier_for(&chain, domain);

    assert!(serve_chain(&verifier, &chain).is_ok());
}

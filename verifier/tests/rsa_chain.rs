// Copyright (c) 2023 The MobileCoin Foundation

//! Verification of a real world RSA chain signed with SHA-1.

mod common;

use common::{der_from_pem, flip_signature_bit, CODE_SIGNING_CA, VERISIGN_G5_CA};
use mc_x509_verifier::x509::{RustCryptoVerifier, SignatureVerifier};
use mc_x509_verifier::{
    verify_der, Certificate, FixedClock, Outcome, TrustAnchors, VerificationPolicy,
    VerificationStatus,
};
use yare::parameterized;

/// 2019-03-29T04:54:34Z, while the code signing CA is valid
const FUZZING_CLOCK: FixedClock = FixedClock::from_unix_seconds(1553835274);

/// 2023-06-01T00:00:00Z, after the code signing CA expired
const CURRENT_CLOCK: FixedClock = FixedClock::from_unix_seconds(1685577600);

/// sha1WithRSAEncryption
const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";

fn certificate(pem: &str) -> Certificate {
    Certificate::from_der(&der_from_pem(pem)).expect("Failed building certificate")
}

fn root_anchor() -> TrustAnchors {
    TrustAnchors::from_der_list([der_from_pem(VERISIGN_G5_CA)]).expect("Failed building anchors")
}

#[test]
fn code_signing_ca_loads_as_anchor() {
    let der = der_from_pem(CODE_SIGNING_CA);
    assert_eq!(der.len(), 1510);

    let anchors = TrustAnchors::from_der_list([&der]).expect("Failed building anchors");
    assert_eq!(anchors.len(), 1);
    assert!(anchors.contains(&certificate(CODE_SIGNING_CA)));
}

#[parameterized(
    root = { VERISIGN_G5_CA },
    code_signing = { CODE_SIGNING_CA },
)]
fn signed_with_sha1_and_rsa(pem: &str) {
    let cert = certificate(pem);
    assert_eq!(cert.signature_algorithm().oid.to_string(), SHA1_WITH_RSA);
    assert_eq!(cert.signature_algorithm(), cert.tbs_signature_algorithm());
}

#[test]
fn root_signature_verifies() {
    let root = certificate(VERISIGN_G5_CA);
    assert!(root.is_self_issued());
    assert!(RustCryptoVerifier.verify_signature(
        root.signature_algorithm(),
        root.subject_public_key_info(),
        root.tbs_bytes(),
        root.signature(),
    ));
}

#[test]
fn code_signing_ca_signature_verifies_with_root_key() {
    let root = certificate(VERISIGN_G5_CA);
    let code_signing = certificate(CODE_SIGNING_CA);
    let verifier = RustCryptoVerifier;

    assert!(verifier.verify_signature(
        code_signing.signature_algorithm(),
        root.subject_public_key_info(),
        code_signing.tbs_bytes(),
        code_signing.signature(),
    ));
    // Its own key did not sign it
    assert!(!verifier.verify_signature(
        code_signing.signature_algorithm(),
        code_signing.subject_public_key_info(),
        code_signing.tbs_bytes(),
        code_signing.signature(),
    ));
}

#[parameterized(
    default = { VerificationPolicy::default() },
    fuzzing = { VerificationPolicy::fuzzing() },
)]
fn code_signing_ca_chains_to_root(policy: VerificationPolicy) {
    let verification = verify_der(
        &[der_from_pem(CODE_SIGNING_CA)],
        &root_anchor(),
        &policy,
        &FUZZING_CLOCK,
    )
    .expect("Failed decoding chain");

    assert_eq!(verification.outcome, Outcome::Valid);
    assert_eq!(verification.status, VerificationStatus::empty());
}

#[test]
fn expired_code_signing_ca() {
    let ders = [der_from_pem(CODE_SIGNING_CA)];

    let verification = verify_der(
        &ders,
        &root_anchor(),
        &VerificationPolicy::default(),
        &CURRENT_CLOCK,
    )
    .expect("Failed decoding chain");
    assert_eq!(verification.outcome, Outcome::Invalid);
    assert_eq!(verification.status, VerificationStatus::EXPIRED);

    let verification = verify_der(
        &ders,
        &root_anchor(),
        &VerificationPolicy::fuzzing(),
        &CURRENT_CLOCK,
    )
    .expect("Failed decoding chain");
    assert_eq!(verification.outcome, Outcome::Valid);
}

#[test]
fn code_signing_ca_with_flipped_signature() {
    let mut der = der_from_pem(CODE_SIGNING_CA);
    flip_signature_bit(&mut der);

    let verification = verify_der(
        &[der],
        &root_anchor(),
        &VerificationPolicy::fuzzing(),
        &FUZZING_CLOCK,
    )
    .expect("Failed decoding chain");
    assert_eq!(verification.outcome, Outcome::Invalid);
    assert_eq!(verification.status, VerificationStatus::SIGNATURE_INVALID);
}

// Copyright (c) 2023 The MobileCoin Foundation

//! Support for verifying certificate chains

extern crate alloc;

use super::algorithm::{RustCryptoVerifier, SignatureVerifier};
use super::certs::Certificate;
use super::extensions::KeyUsage;
use super::policy::VerificationPolicy;
use super::status::{Verification, VerificationStatus};
use super::time::Timestamp;
use super::trust_anchor::TrustAnchors;
use crate::clock::TimeSource;
use alloc::vec;
use alloc::vec::Vec;

/// Where the issuer of a certificate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Position in the provided certificates
    Provided(usize),
    /// One of the trust anchors
    Anchor,
}

#[derive(Debug)]
struct Issuer<'a> {
    certificate: &'a Certificate,
    source: Source,
    signature_valid: bool,
}

/// Verifies certificate chains, leaf first, against trust anchors.
///
/// Verification does not stop at the first problem. Every problem found is
/// reported in the [`VerificationStatus`] of the returned [`Verification`].
#[derive(Debug, Default, Clone)]
pub struct ChainVerifier<S = RustCryptoVerifier> {
    backend: S,
}

impl ChainVerifier {
    /// A verifier using [`RustCryptoVerifier`] for signatures
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: SignatureVerifier> ChainVerifier<S> {
    /// A verifier using `backend` for signatures
    pub fn with_backend(backend: S) -> Self {
        Self { backend }
    }

    /// The signature backend
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Decode the DER encoded `certificates` and verify them.
    ///
    /// Any certificate that fails to decode or build fails the whole call.
    pub fn verify_der<B: AsRef<[u8]>>(
        &self,
        certificates: &[B],
        anchors: &TrustAnchors,
        policy: &VerificationPolicy,
        time: &dyn TimeSource,
    ) -> crate::Result<Verification> {
        let certificates = certificates
            .iter()
            .map(|der| Certificate::from_der(der.as_ref()))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(self.verify(&certificates, anchors, policy, time))
    }

    /// Verify `certificates` lead to one of the `anchors`.
    ///
    /// The first certificate is the leaf. The others are intermediates which
    /// may be in any order unless the `policy` says otherwise.
    pub fn verify(
        &self,
        certificates: &[Certificate],
        anchors: &TrustAnchors,
        policy: &VerificationPolicy,
        time: &dyn TimeSource,
    ) -> Verification {
        let mut status = VerificationStatus::empty();
        let Some(leaf) = certificates.first() else {
            log::debug!("No certificates to verify");
            status |= VerificationStatus::ISSUER_NOT_FOUND;
            return Verification::from_status(status, policy.strict_ordering);
        };

        let (path, anchored) = self.build_path(leaf, certificates, anchors, policy, &mut status);

        if path.len() > policy.max_chain_length {
            log::debug!(
                "Chain of {} certificates exceeds the limit of {}",
                path.len(),
                policy.max_chain_length
            );
            status |= VerificationStatus::CHAIN_TOO_LONG;
        }

        let now = time.now();
        let anchor_position = anchored.then(|| path.len() - 1);
        for (position, certificate) in path.iter().enumerate() {
            if Some(position) == anchor_position && !policy.check_anchor_validity {
                log::trace!("Trusting anchor {} as given", certificate.subject());
                continue;
            }
            status |= check_certificate(certificate, policy, now);
            if position > 0 {
                status |= check_issuer(certificate, position - 1, policy);
            }
        }

        let verification = Verification::from_status(status, policy.strict_ordering);
        log::debug!(
            "Verified chain for {}: {:?} {}",
            leaf.subject(),
            verification.outcome,
            verification.status
        );
        verification
    }

    /// Walk from `leaf` towards an anchor.
    ///
    /// Returns the path, leaf first, and whether it ends in an anchor.
    fn build_path<'a>(
        &self,
        leaf: &'a Certificate,
        certificates: &'a [Certificate],
        anchors: &'a TrustAnchors,
        policy: &VerificationPolicy,
        status: &mut VerificationStatus,
    ) -> (Vec<&'a Certificate>, bool) {
        let mut used = vec![false; certificates.len()];
        if let Some(first) = used.first_mut() {
            *first = true;
        }
        let mut path = vec![leaf];
        let mut previous = 0;
        let mut current = leaf;

        loop {
            if anchors.contains(current) {
                log::debug!("Reached trust anchor {}", current.subject());
                return (path, true);
            }

            let Some(issuer) =
                self.find_issuer(current, certificates, &used, previous, anchors, policy)
            else {
                log::debug!("No issuer found for {}", current.subject());
                *status |= VerificationStatus::ISSUER_NOT_FOUND;
                return (path, false);
            };

            if !issuer.signature_valid {
                log::debug!(
                    "Signature of {} does not verify with the key of {}",
                    current.subject(),
                    issuer.certificate.subject()
                );
                *status |= VerificationStatus::SIGNATURE_INVALID;
            }
            path.push(issuer.certificate);

            match issuer.source {
                Source::Anchor => {
                    log::debug!("Reached trust anchor {}", issuer.certificate.subject());
                    return (path, true);
                }
                Source::Provided(index) => {
                    log::trace!(
                        "Issuer of {} is certificate {index}",
                        current.subject()
                    );
                    if index != previous + 1 && !policy.allow_unsorted_chain {
                        *status |= VerificationStatus::UNSORTED_CHAIN;
                    }
                    if let Some(flag) = used.get_mut(index) {
                        *flag = true;
                    }
                    previous = index;
                    current = issuer.certificate;
                }
            }

            if path.len() > policy.max_chain_length {
                return (path, false);
            }
        }
    }

    /// Find the best issuer for `child`.
    ///
    /// In order of preference:
    /// 1. A provided certificate that is also an anchor and signed `child`
    /// 2. An anchor that signed `child`
    /// 3. A provided certificate that signed `child`
    /// 4. Any certificate named as the issuer of `child`
    fn find_issuer<'a>(
        &self,
        child: &Certificate,
        certificates: &'a [Certificate],
        used: &[bool],
        previous: usize,
        anchors: &'a TrustAnchors,
        policy: &VerificationPolicy,
    ) -> Option<Issuer<'a>> {
        let provided = certificates
            .iter()
            .enumerate()
            .zip(used)
            .filter(|(_, used)| !**used)
            .map(|((index, certificate), _)| (index, certificate))
            .filter(|(index, _)| !policy.require_sorted_chain || *index == previous + 1)
            .filter(|(_, certificate)| certificate.subject() == child.issuer())
            .collect::<Vec<_>>();

        let named_anchors = || anchors.issuers_of(child);
        let signed = |issuer: &Certificate| self.signed_by(child, issuer);
        let found = |certificate, source, signature_valid| Issuer {
            certificate,
            source,
            signature_valid,
        };

        provided
            .iter()
            .find(|(_, certificate)| anchors.contains(certificate) && signed(*certificate))
            .map(|(index, certificate)| found(*certificate, Source::Provided(*index), true))
            .or_else(|| {
                named_anchors()
                    .find(|anchor| signed(*anchor))
                    .map(|anchor| found(anchor, Source::Anchor, true))
            })
            .or_else(|| {
                provided
                    .iter()
                    .find(|(_, certificate)| signed(*certificate))
                    .map(|(index, certificate)| found(*certificate, Source::Provided(*index), true))
            })
            .or_else(|| {
                provided
                    .first()
                    .map(|(index, certificate)| found(*certificate, Source::Provided(*index), false))
            })
            .or_else(|| {
                named_anchors()
                    .next()
                    .map(|anchor| found(anchor, Source::Anchor, false))
            })
    }

    fn signed_by(&self, child: &Certificate, issuer: &Certificate) -> bool {
        self.backend.verify_signature(
            child.signature_algorithm(),
            issuer.subject_public_key_info(),
            child.tbs_bytes(),
            child.signature(),
        )
    }
}

/// Checks which only concern the certificate itself.
fn check_certificate(
    certificate: &Certificate,
    policy: &VerificationPolicy,
    now: Timestamp,
) -> VerificationStatus {
    let mut status = VerificationStatus::empty();

    if certificate.signature_algorithm() != certificate.tbs_signature_algorithm() {
        status |= VerificationStatus::SIGNATURE_ALGORITHM_MISMATCH;
    }

    if !policy.ignore_unsupported_critical_extensions {
        if let Some(extension) = certificate.extensions().unsupported_critical().next() {
            log::trace!(
                "Unsupported critical extension {} in {}",
                extension.oid,
                certificate.subject()
            );
            status |= VerificationStatus::UNSUPPORTED_CRITICAL_EXTENSION;
        }
    }

    if !policy.disable_time_checks {
        let validity = certificate.validity();
        if !validity.is_well_formed() {
            status |= VerificationStatus::INVALID_VALIDITY_PERIOD;
        }
        if now < validity.not_before {
            status |= VerificationStatus::NOT_YET_VALID;
        }
        if now > validity.not_after {
            status |= VerificationStatus::EXPIRED;
        }
    }

    if !status.is_empty() {
        log::trace!("{} has problems: {status}", certificate.subject());
    }
    status
}

/// Checks for a certificate acting as an issuer with `intermediates`
/// certificates between it and the leaf.
fn check_issuer(
    certificate: &Certificate,
    intermediates: usize,
    policy: &VerificationPolicy,
) -> VerificationStatus {
    let mut status = VerificationStatus::empty();
    if policy.allow_broken {
        return status;
    }

    let extensions = certificate.extensions();
    match extensions.basic_constraints() {
        Some(constraints) if constraints.ca => {
            let exceeded = constraints
                .path_len_constraint
                .map_or(false, |limit| intermediates > limit as usize);
            if exceeded {
                log::trace!(
                    "{} has {intermediates} intermediates below it",
                    certificate.subject()
                );
                status |= VerificationStatus::PATH_LENGTH_EXCEEDED;
            }
        }
        _ => status |= VerificationStatus::CA_FLAG_MISSING,
    }

    let can_sign = extensions
        .key_usage()
        .map_or(true, |usage| usage.contains(KeyUsage::KEY_CERT_SIGN));
    if !can_sign {
        status |= VerificationStatus::KEY_USAGE_VIOLATION;
    }

    status
}

// Copyright (c) 2023 The MobileCoin Foundation

//! Algorithm data types used in x509 certificate logic
//!
//! Signature checks go through the [`SignatureVerifier`] trait so the
//! cryptography can be swapped out. [`RustCryptoVerifier`] is the default
//! and supports ECDSA P-256 with SHA-256, ECDSA P-384 with SHA-384 and RSA
//! PKCS#1 v1.5 with SHA-1, SHA-256, SHA-384 and SHA-512.

extern crate alloc;

use super::primitive::{expect_end, expect_tag, object_identifier, octet_aligned_bit_string};
use super::{Error, Result};
use crate::tlv::{self, TlvNode};
use alloc::vec::Vec;
use const_oid::{AssociatedOid, ObjectIdentifier};
use der::Tag;
use p256::ecdsa;
use p256::ecdsa::signature::Verifier;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::sha2::{Digest, Sha256, Sha384, Sha512};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;

const OID_PKCS1_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_PKCS1_SHA1_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const OID_PKCS1_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const OID_PKCS1_SHA384_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const OID_PKCS1_SHA512_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const OID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const OID_SIG_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
const OID_SIG_ECDSA_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");

/// Identifies an algorithm and its parameters.
///
/// ```ignore
///     AlgorithmIdentifier  ::=  SEQUENCE  {
///         algorithm               OBJECT IDENTIFIER,
///         parameters              ANY DEFINED BY algorithm OPTIONAL  }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    /// The algorithm
    pub oid: ObjectIdentifier,
    /// The encoded parameters, tag and length included
    pub parameters: Option<Vec<u8>>,
}

impl AlgorithmIdentifier {
    pub(crate) fn from_node(node: Option<&TlvNode<'_>>, field: &'static str) -> Result<Self> {
        let node = expect_tag(node, Tag::Sequence, field)?;
        let mut fields = node.children().iter();
        let oid = object_identifier(fields.next(), field)?;
        let parameters = fields.next().map(|parameters| parameters.as_bytes().to_vec());
        expect_end(fields, field)?;
        Ok(Self { oid, parameters })
    }
}

/// The public key of a certificate's subject.
///
/// ```ignore
///     SubjectPublicKeyInfo  ::=  SEQUENCE  {
///         algorithm            AlgorithmIdentifier,
///         subjectPublicKey     BIT STRING  }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPublicKeyInfo {
    /// The key algorithm
    pub algorithm: AlgorithmIdentifier,
    /// The key bytes from the BIT STRING
    pub subject_public_key: Vec<u8>,
}

impl SubjectPublicKeyInfo {
    pub(crate) fn from_node(node: Option<&TlvNode<'_>>) -> Result<Self> {
        let node = expect_tag(node, Tag::Sequence, "subjectPublicKeyInfo")?;
        let mut fields = node.children().iter();
        let algorithm = AlgorithmIdentifier::from_node(fields.next(), "algorithm")?;
        let subject_public_key =
            octet_aligned_bit_string(fields.next(), "subjectPublicKey")?.to_vec();
        expect_end(fields, "subjectPublicKeyInfo")?;
        Ok(Self {
            algorithm,
            subject_public_key,
        })
    }
}

/// Checks that a signature was made by a key.
///
/// Implementations are expected to be deterministic and to answer `false`
/// for anything they do not support.
pub trait SignatureVerifier {
    /// Whether `signature` over `message` was produced by `public_key` using
    /// `algorithm`
    fn verify_signature(
        &self,
        algorithm: &AlgorithmIdentifier,
        public_key: &SubjectPublicKeyInfo,
        message: &[u8],
        signature: &[u8],
    ) -> bool;
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for &T {
    fn verify_signature(
        &self,
        algorithm: &AlgorithmIdentifier,
        public_key: &SubjectPublicKeyInfo,
        message: &[u8],
        signature: &[u8],
    ) -> bool {
        (**self).verify_signature(algorithm, public_key, message, signature)
    }
}

/// [`SignatureVerifier`] backed by the `p256`, `p384` and `rsa` crates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RustCryptoVerifier;

impl SignatureVerifier for RustCryptoVerifier {
    fn verify_signature(
        &self,
        algorithm: &AlgorithmIdentifier,
        public_key: &SubjectPublicKeyInfo,
        message: &[u8],
        signature: &[u8],
    ) -> bool {
        let result = PublicKey::try_from(public_key).and_then(|key| {
            let signature = Signature::try_from_algorithm_and_signature(algorithm, signature)?;
            key.verify(message, &signature)
        });
        match result {
            Ok(()) => true,
            Err(error) => {
                log::trace!("Signature check with {} failed: {error}", algorithm.oid);
                false
            }
        }
    }
}

/// Public key used in PKI signature verification
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PublicKey {
    /// Elliptic curve P-256 public key
    EcdsaP256(ecdsa::VerifyingKey),
    /// Elliptic curve P-384 public key
    EcdsaP384(p384::ecdsa::VerifyingKey),
    /// RSA public key
    Rsa(RsaPublicKey),
}

impl PublicKey {
    /// Verify the `message` and `signature` match this [`PublicKey`]
    ///
    /// ECDSA keys only verify signatures using the digest of their curve's
    /// size.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        match (self, signature) {
            (PublicKey::EcdsaP256(key), Signature::EcdsaP256(sig)) => key
                .verify(message, sig)
                .map_err(|_| Error::SignatureVerification),
            (PublicKey::EcdsaP384(key), Signature::EcdsaP384(sig)) => key
                .verify(message, sig)
                .map_err(|_| Error::SignatureVerification),
            (PublicKey::Rsa(key), Signature::RsaSha1(sig)) => {
                verify_pkcs1v15::<Sha1>(key, message, sig)
            }
            (PublicKey::Rsa(key), Signature::RsaSha256(sig)) => {
                verify_pkcs1v15::<Sha256>(key, message, sig)
            }
            (PublicKey::Rsa(key), Signature::RsaSha384(sig)) => {
                verify_pkcs1v15::<Sha384>(key, message, sig)
            }
            (PublicKey::Rsa(key), Signature::RsaSha512(sig)) => {
                verify_pkcs1v15::<Sha512>(key, message, sig)
            }
            _ => Err(Error::SignatureVerification),
        }
    }
}

fn verify_pkcs1v15<D: Digest + AssociatedOid>(
    key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let hashed = D::digest(message);
    key.verify(Pkcs1v15Sign::new::<D>(), &hashed, signature)
        .map_err(|_| Error::SignatureVerification)
}

/// The named curve in the parameters of an elliptic curve key
fn named_curve(parameters: Option<&[u8]>) -> Result<ObjectIdentifier> {
    let parameters = parameters.ok_or(Error::KeyDecoding)?;
    let node = tlv::decode(parameters).map_err(|_| Error::KeyDecoding)?;
    object_identifier(Some(&node), "namedCurve")
}

/// Create a [`PublicKey`] from a [`SubjectPublicKeyInfo`]
impl TryFrom<&SubjectPublicKeyInfo> for PublicKey {
    type Error = Error;

    fn try_from(value: &SubjectPublicKeyInfo) -> core::result::Result<Self, Self::Error> {
        let bytes = value.subject_public_key.as_slice();
        match value.algorithm.oid {
            OID_EC_PUBLIC_KEY => match named_curve(value.algorithm.parameters.as_deref())? {
                OID_SECP256R1 => {
                    let key = ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                        .map_err(|_| Error::KeyDecoding)?;
                    Ok(PublicKey::EcdsaP256(key))
                }
                OID_SECP384R1 => {
                    let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                        .map_err(|_| Error::KeyDecoding)?;
                    Ok(PublicKey::EcdsaP384(key))
                }
                curve => Err(Error::UnsupportedAlgorithm(curve)),
            },
            OID_PKCS1_RSA_ENCRYPTION => {
                let key = RsaPublicKey::from_pkcs1_der(bytes).map_err(|_| Error::KeyDecoding)?;
                Ok(PublicKey::Rsa(key))
            }
            oid => Err(Error::UnsupportedAlgorithm(oid)),
        }
    }
}

/// Signature used in PKI verification
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Signature {
    /// Elliptic curve P-256 signature with SHA-256
    EcdsaP256(ecdsa::Signature),
    /// Elliptic curve P-384 signature with SHA-384
    EcdsaP384(p384::ecdsa::Signature),
    /// RSA PKCS#1 v1.5 signature with SHA-1
    RsaSha1(Vec<u8>),
    /// RSA PKCS#1 v1.5 signature with SHA-256
    RsaSha256(Vec<u8>),
    /// RSA PKCS#1 v1.5 signature with SHA-384
    RsaSha384(Vec<u8>),
    /// RSA PKCS#1 v1.5 signature with SHA-512
    RsaSha512(Vec<u8>),
}

impl Signature {
    /// Create a [`Signature`] from the `algorithm` and `signature` bytes
    pub fn try_from_algorithm_and_signature(
        algorithm: &AlgorithmIdentifier,
        signature: &[u8],
    ) -> Result<Self> {
        match algorithm.oid {
            OID_SIG_ECDSA_WITH_SHA256 => {
                let sig =
                    ecdsa::Signature::from_der(signature).map_err(|_| Error::SignatureDecoding)?;
                Ok(Signature::EcdsaP256(sig))
            }
            OID_SIG_ECDSA_WITH_SHA384 => {
                let sig = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::SignatureDecoding)?;
                Ok(Signature::EcdsaP384(sig))
            }
            OID_PKCS1_SHA1_WITH_RSA => Ok(Signature::RsaSha1(signature.to_vec())),
            OID_PKCS1_SHA256_WITH_RSA => Ok(Signature::RsaSha256(signature.to_vec())),
            OID_PKCS1_SHA384_WITH_RSA => Ok(Signature::RsaSha384(signature.to_vec())),
            OID_PKCS1_SHA512_WITH_RSA => Ok(Signature::RsaSha512(signature.to_vec())),
            oid => Err(Error::UnsupportedAlgorithm(oid)),
        }
    }
}

// Copyright (c) 2023 The MobileCoin Foundation

//! Certificates built from decoded DER
//!
//! ```ignore
//!     Certificate  ::=  SEQUENCE  {
//!         tbsCertificate       TBSCertificate,
//!         signatureAlgorithm   AlgorithmIdentifier,
//!         signatureValue       BIT STRING  }
//!
//!     TBSCertificate  ::=  SEQUENCE  {
//!         version         [0]  EXPLICIT Version DEFAULT v1,
//!         serialNumber         CertificateSerialNumber,
//!         signature            AlgorithmIdentifier,
//!         issuer               Name,
//!         validity             Validity,
//!         subject              Name,
//!         subjectPublicKeyInfo SubjectPublicKeyInfo,
//!         issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
//!         subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
//!         extensions      [3]  EXPLICIT Extensions OPTIONAL }
//! ```

extern crate alloc;

use super::algorithm::{AlgorithmIdentifier, SubjectPublicKeyInfo};
use super::extensions::Extensions;
use super::name::DistinguishedName;
use super::primitive::{expect_end, expect_tag, octet_aligned_bit_string, unsigned_integer};
use super::time::Validity;
use super::{Error, Result};
use crate::tlv::{DecodeLimits, Decoder, TlvNode};
use alloc::vec::Vec;
use core::ops::Range;
use der::{Tag, TagNumber};
use serde::{Deserialize, Serialize};

const VERSION_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};
const ISSUER_UNIQUE_ID_TAG: Tag = Tag::ContextSpecific {
    constructed: false,
    number: TagNumber::N1,
};
const SUBJECT_UNIQUE_ID_TAG: Tag = Tag::ContextSpecific {
    constructed: false,
    number: TagNumber::N2,
};
const EXTENSIONS_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N3,
};

/// Certificate format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    /// Version 1, the default when no version is encoded
    V1,
    /// Version 2
    V2,
    /// Version 3
    V3,
}

impl Version {
    fn from_node(node: Option<&TlvNode<'_>>) -> Result<Self> {
        let node = node.ok_or(Error::MissingField("version"))?;
        match unsigned_integer(node, "version")? {
            0 => Ok(Version::V1),
            1 => Ok(Version::V2),
            2 => Ok(Version::V3),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

/// Options for building a [`Certificate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Limits for decoding the certificate and its extension values
    pub limits: DecodeLimits,
    /// The longest serial number, in octets, that will be accepted
    ///
    /// A leading zero octet which only keeps the value positive is not
    /// counted.
    pub max_serial_len: usize,
}

impl ParseOptions {
    /// Default for [`ParseOptions::max_serial_len`]
    pub const DEFAULT_MAX_SERIAL_LEN: usize = 20;

    /// Set the decoding limits
    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the maximum serial number length
    pub fn with_max_serial_len(mut self, max_serial_len: usize) -> Self {
        self.max_serial_len = max_serial_len;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            limits: DecodeLimits::default(),
            max_serial_len: Self::DEFAULT_MAX_SERIAL_LEN,
        }
    }
}

/// An X.509 certificate.
///
/// Building a certificate only checks its structure. Nothing about the
/// signature, the validity period or the extensions is checked, that is the
/// job of [`ChainVerifier`](super::ChainVerifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    // Offsets of the TBS certificate within `der`
    tbs: Range<usize>,
    version: Version,
    serial_number: Vec<u8>,
    tbs_signature_algorithm: AlgorithmIdentifier,
    issuer: DistinguishedName,
    validity: Validity,
    subject: DistinguishedName,
    subject_public_key_info: SubjectPublicKeyInfo,
    issuer_unique_id: Option<Vec<u8>>,
    subject_unique_id: Option<Vec<u8>>,
    extensions: Extensions,
    signature_algorithm: AlgorithmIdentifier,
    signature: Vec<u8>,
}

impl Certificate {
    /// Decode and build a certificate from `der` with the default
    /// [`ParseOptions`].
    pub fn from_der(der: &[u8]) -> crate::Result<Self> {
        Self::from_der_with_options(der, &ParseOptions::default())
    }

    /// Decode and build a certificate from `der`.
    pub fn from_der_with_options(der: &[u8], options: &ParseOptions) -> crate::Result<Self> {
        let root = Decoder::new(options.limits).decode(der)?;
        Ok(Self::build(&root, options)?)
    }

    /// Build a certificate from an already decoded element.
    pub fn build(node: &TlvNode<'_>, options: &ParseOptions) -> Result<Self> {
        let root = expect_tag(Some(node), Tag::Sequence, "certificate")?;
        let mut fields = root.children().iter();
        let tbs = expect_tag(fields.next(), Tag::Sequence, "tbsCertificate")?;
        let signature_algorithm =
            AlgorithmIdentifier::from_node(fields.next(), "signatureAlgorithm")?;
        let signature = octet_aligned_bit_string(fields.next(), "signatureValue")?.to_vec();
        expect_end(fields, "certificate")?;

        let base = root.element_range().start;
        let tbs_range = tbs.element_range();
        let tbs_range = tbs_range.start.saturating_sub(base)..tbs_range.end.saturating_sub(base);

        let mut fields = tbs.children().iter().peekable();
        let version = match fields.next_if(|field| field.tag() == VERSION_TAG) {
            Some(explicit) => {
                let mut inner = explicit.children().iter();
                let version = Version::from_node(inner.next())?;
                expect_end(inner, "version")?;
                version
            }
            None => Version::V1,
        };
        let serial_number = serial_number(fields.next(), options.max_serial_len)?;
        let tbs_signature_algorithm = AlgorithmIdentifier::from_node(fields.next(), "signature")?;
        let issuer = DistinguishedName::from_node(fields.next(), "issuer")?;
        let validity = Validity::from_node(fields.next())?;
        let subject = DistinguishedName::from_node(fields.next(), "subject")?;
        let subject_public_key_info = SubjectPublicKeyInfo::from_node(fields.next())?;
        let issuer_unique_id = fields
            .next_if(|field| field.tag() == ISSUER_UNIQUE_ID_TAG)
            .map(|field| field.content().to_vec());
        let subject_unique_id = fields
            .next_if(|field| field.tag() == SUBJECT_UNIQUE_ID_TAG)
            .map(|field| field.content().to_vec());
        let extensions = match fields.next_if(|field| field.tag() == EXTENSIONS_TAG) {
            Some(explicit) => {
                let mut inner = explicit.children().iter();
                let extensions = Extensions::from_node(inner.next(), &options.limits)?;
                expect_end(inner, "extensions")?;
                extensions
            }
            None => Extensions::default(),
        };
        expect_end(fields, "tbsCertificate")?;

        Ok(Self {
            der: root.as_bytes().to_vec(),
            tbs: tbs_range,
            version,
            serial_number,
            tbs_signature_algorithm,
            issuer,
            validity,
            subject,
            subject_public_key_info,
            issuer_unique_id,
            subject_unique_id,
            extensions,
            signature_algorithm,
            signature,
        })
    }

    /// The DER encoding of the whole certificate
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// The DER encoding of the TBS certificate, the bytes the issuer signed
    pub fn tbs_bytes(&self) -> &[u8] {
        self.der.get(self.tbs.clone()).unwrap_or_default()
    }

    /// The certificate version
    pub fn version(&self) -> Version {
        self.version
    }

    /// The content octets of the serial number INTEGER
    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    /// The signature algorithm from inside the TBS certificate
    pub fn tbs_signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.tbs_signature_algorithm
    }

    /// The issuer name
    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    /// The validity period
    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    /// The subject name
    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    /// The subject's public key
    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfo {
        &self.subject_public_key_info
    }

    /// The content octets of the issuer unique identifier
    pub fn issuer_unique_id(&self) -> Option<&[u8]> {
        self.issuer_unique_id.as_deref()
    }

    /// The content octets of the subject unique identifier
    pub fn subject_unique_id(&self) -> Option<&[u8]> {
        self.subject_unique_id.as_deref()
    }

    /// The extensions, empty when none are encoded
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// The signature algorithm from outside the TBS certificate
    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    /// The signature over [`Certificate::tbs_bytes`]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Whether the issuer and subject are the same name
    pub fn is_self_issued(&self) -> bool {
        self.issuer == self.subject
    }
}

/// Read the serial number, keeping the INTEGER content octets as is.
fn serial_number(node: Option<&TlvNode<'_>>, max_len: usize) -> Result<Vec<u8>> {
    let node = expect_tag(node, Tag::Integer, "serialNumber")?;
    let magnitude = match node.content() {
        [] => return Err(Error::EmptySerialNumber),
        [0x00, rest @ ..] if !rest.is_empty() => rest,
        bytes => bytes,
    };
    if magnitude.len() > max_len {
        return Err(Error::SerialNumberTooLong {
            len: magnitude.len(),
            max: max_len,
        });
    }
    Ok(node.content().to_vec())
}

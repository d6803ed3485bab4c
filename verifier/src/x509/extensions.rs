// Copyright (c) 2023 The MobileCoin Foundation

//! Certificate extensions as defined in section
//! [4.2](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2) of
//! [RFC5280](https://datatracker.ietf.org/doc/html/rfc5280)
//!
//! ```ignore
//!     Extensions  ::=  SEQUENCE SIZE (1..MAX) OF Extension
//!
//!     Extension  ::=  SEQUENCE  {
//!         extnID      OBJECT IDENTIFIER,
//!         critical    BOOLEAN DEFAULT FALSE,
//!         extnValue   OCTET STRING }
//! ```
//!
//! Basic constraints and key usage are parsed into [`BasicConstraints`] and
//! [`KeyUsage`]. The other recognized extensions only have their outer
//! structure checked. A malformed recognized extension fails the certificate
//! when it is critical and is ignored otherwise.

extern crate alloc;

use super::primitive::{
    bit_string, boolean, expect_end, expect_tag, object_identifier, unsigned_integer,
};
use super::{Error, Result};
use crate::tlv::{DecodeLimits, Decoder, TlvNode};
use alloc::vec::Vec;
use const_oid::ObjectIdentifier;
use core::fmt::{Display, Formatter};
use der::Tag;

/// Subject key identifier extension OID
pub const SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");
/// Key usage extension OID
pub const KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.15");
/// Subject alternative name extension OID
pub const SUBJECT_ALT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.17");
/// Basic constraints extension OID
pub const BASIC_CONSTRAINTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.19");
/// Certificate policies extension OID
pub const CERTIFICATE_POLICIES: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.32");
/// Authority key identifier extension OID
pub const AUTHORITY_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.35");
/// Extended key usage extension OID
pub const EXTENDED_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37");

/// The extension types this crate understands, with the outer tag of their
/// value.
const RECOGNIZED: [(ObjectIdentifier, Tag); 7] = [
    (SUBJECT_KEY_IDENTIFIER, Tag::OctetString),
    (KEY_USAGE, Tag::BitString),
    (SUBJECT_ALT_NAME, Tag::Sequence),
    (BASIC_CONSTRAINTS, Tag::Sequence),
    (CERTIFICATE_POLICIES, Tag::Sequence),
    (AUTHORITY_KEY_IDENTIFIER, Tag::Sequence),
    (EXTENDED_KEY_USAGE, Tag::Sequence),
];

/// Basic constraints extension
///
/// ```ignore
///     BasicConstraints ::= SEQUENCE {
///         cA                      BOOLEAN DEFAULT FALSE,
///         pathLenConstraint       INTEGER (0..MAX) OPTIONAL }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    /// Whether the subject is a certificate authority
    pub ca: bool,
    /// The maximum number of intermediate CA certificates that may follow
    /// this certificate in a path
    pub path_len_constraint: Option<u32>,
}

impl BasicConstraints {
    fn from_node(node: &TlvNode<'_>) -> Result<Self> {
        let node = expect_tag(Some(node), Tag::Sequence, "basicConstraints")?;
        let mut fields = node.children().iter().peekable();
        let ca = match fields.next_if(|field| field.tag() == Tag::Boolean) {
            Some(field) => boolean(field, "cA")?,
            None => false,
        };
        let path_len_constraint = match fields.next_if(|field| field.tag() == Tag::Integer) {
            Some(field) => {
                let value = unsigned_integer(field, "pathLenConstraint")?;
                Some(u32::try_from(value).map_err(|_| Error::InvalidValue("pathLenConstraint"))?)
            }
            None => None,
        };
        expect_end(fields, "basicConstraints")?;
        Ok(Self {
            ca,
            path_len_constraint,
        })
    }
}

/// Key usage extension
///
/// ```ignore
///     KeyUsage ::= BIT STRING {
///         digitalSignature        (0),
///         nonRepudiation          (1),
///         keyEncipherment         (2),
///         dataEncipherment        (3),
///         keyAgreement            (4),
///         keyCertSign             (5),
///         cRLSign                 (6),
///         encipherOnly            (7),
///         decipherOnly            (8) }
/// ```
///
/// Bit 0 of the BIT STRING is the most significant bit of the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyUsage(u16);

impl KeyUsage {
    /// digitalSignature
    pub const DIGITAL_SIGNATURE: u16 = 1 << 15;
    /// nonRepudiation, also known as contentCommitment
    pub const NON_REPUDIATION: u16 = 1 << 14;
    /// keyEncipherment
    pub const KEY_ENCIPHERMENT: u16 = 1 << 13;
    /// dataEncipherment
    pub const DATA_ENCIPHERMENT: u16 = 1 << 12;
    /// keyAgreement
    pub const KEY_AGREEMENT: u16 = 1 << 11;
    /// keyCertSign
    pub const KEY_CERT_SIGN: u16 = 1 << 10;
    /// cRLSign
    pub const CRL_SIGN: u16 = 1 << 9;
    /// encipherOnly
    pub const ENCIPHER_ONLY: u16 = 1 << 8;
    /// decipherOnly
    pub const DECIPHER_ONLY: u16 = 1 << 7;

    const NAMES: [(u16, &'static str); 9] = [
        (Self::DIGITAL_SIGNATURE, "digitalSignature"),
        (Self::NON_REPUDIATION, "nonRepudiation"),
        (Self::KEY_ENCIPHERMENT, "keyEncipherment"),
        (Self::DATA_ENCIPHERMENT, "dataEncipherment"),
        (Self::KEY_AGREEMENT, "keyAgreement"),
        (Self::KEY_CERT_SIGN, "keyCertSign"),
        (Self::CRL_SIGN, "cRLSign"),
        (Self::ENCIPHER_ONLY, "encipherOnly"),
        (Self::DECIPHER_ONLY, "decipherOnly"),
    ];

    /// Key usage with the given bits set
    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    /// The raw bits
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Whether all of `usage` is allowed
    pub const fn contains(&self, usage: u16) -> bool {
        self.0 & usage == usage
    }

    fn from_node(node: &TlvNode<'_>) -> Result<Self> {
        let bits = bit_string(Some(node), "keyUsage")?;
        let (first, second) = match bits.bytes {
            [] => (0, 0),
            [first] => (*first, 0),
            [first, second] => (*first, *second),
            _ => return Err(Error::InvalidValue("keyUsage")),
        };
        // Only decipherOnly may be set in the second byte
        Ok(Self(u16::from_be_bytes([first, second & 0x80])))
    }
}

/// Formats the set usages, separated by `|`
impl Display for KeyUsage {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut names = Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| name);
        if let Some(name) = names.next() {
            write!(f, "{name}")?;
        }
        for name in names {
            write!(f, "|{name}")?;
        }
        Ok(())
    }
}

/// A single extension, as encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// The extension type
    pub oid: ObjectIdentifier,
    /// Whether the extension must be understood to use the certificate
    pub critical: bool,
    /// The content of the `extnValue` OCTET STRING
    pub value: Vec<u8>,
}

impl Extension {
    /// Whether this crate understands the extension type
    pub fn is_recognized(&self) -> bool {
        recognized_tag(&self.oid).is_some()
    }

    fn from_node(node: &TlvNode<'_>) -> Result<Self> {
        let node = expect_tag(Some(node), Tag::Sequence, "extension")?;
        let mut fields = node.children().iter().peekable();
        let oid = object_identifier(fields.next(), "extnID")?;
        let critical = match fields.next_if(|field| field.tag() == Tag::Boolean) {
            Some(field) => boolean(field, "critical")?,
            None => false,
        };
        let value = expect_tag(fields.next(), Tag::OctetString, "extnValue")?;
        expect_end(fields, "extension")?;
        Ok(Self {
            oid,
            critical,
            value: value.content().to_vec(),
        })
    }
}

fn recognized_tag(oid: &ObjectIdentifier) -> Option<Tag> {
    RECOGNIZED
        .iter()
        .find(|(recognized, _)| recognized == oid)
        .map(|(_, tag)| *tag)
}

/// The extensions of a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    entries: Vec<Extension>,
    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<KeyUsage>,
}

impl Extensions {
    /// Parse the `Extensions` SEQUENCE.
    ///
    /// Extension values are decoded with `limits`.
    pub(crate) fn from_node(node: Option<&TlvNode<'_>>, limits: &DecodeLimits) -> Result<Self> {
        let node = expect_tag(node, Tag::Sequence, "extensions")?;
        let mut extensions = Self::default();
        for child in node.children() {
            let extension = Extension::from_node(child)?;
            if extensions.get(&extension.oid).is_some() {
                return Err(Error::DuplicateExtension(extension.oid));
            }
            extensions.interpret(&extension, limits)?;
            extensions.entries.push(extension);
        }
        Ok(extensions)
    }

    fn interpret(&mut self, extension: &Extension, limits: &DecodeLimits) -> Result<()> {
        let Some(tag) = recognized_tag(&extension.oid) else {
            return Ok(());
        };

        let parsed = Decoder::new(*limits)
            .decode(&extension.value)
            .map_err(|_| Error::InvalidValue("extnValue"))
            .and_then(|node| {
                expect_tag(Some(&node), tag, "extnValue")?;
                match extension.oid {
                    BASIC_CONSTRAINTS => {
                        self.basic_constraints = Some(BasicConstraints::from_node(&node)?)
                    }
                    KEY_USAGE => self.key_usage = Some(KeyUsage::from_node(&node)?),
                    _ => {}
                }
                Ok(())
            });

        match parsed {
            Err(_) if extension.critical => {
                Err(Error::MalformedCriticalExtension(extension.oid))
            }
            Err(error) => {
                log::warn!(
                    "Ignoring malformed non-critical extension {}: {error}",
                    extension.oid
                );
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// The basic constraints, if present and well formed
    pub fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.basic_constraints
    }

    /// The key usage, if present and well formed
    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.key_usage
    }

    /// The extension of type `oid`
    pub fn get(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.entries.iter().find(|extension| &extension.oid == oid)
    }

    /// All extensions in encoded order
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.entries.iter()
    }

    /// Critical extensions this crate does not understand
    pub fn unsupported_critical(&self) -> impl Iterator<Item = &Extension> {
        self.entries
            .iter()
            .filter(|extension| extension.critical && !extension.is_recognized())
    }

    /// Number of extensions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no extensions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Copyright (c) 2023 The MobileCoin Foundation

//! X509 distinguished name as defined in sections
//! [4.1.2.4](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.4) and
//! [4.1.2.6](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.6) of
//! [RFC5280](https://datatracker.ietf.org/doc/html/rfc5280)
//!
//! ```ignore
//!     Name ::= RDNSequence
//!     RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
//!     RelativeDistinguishedName ::= SET OF AttributeTypeAndValue
//!     AttributeTypeAndValue ::= SEQUENCE {
//!         AttributeType,
//!         AttributeValue
//!     }
//!     AttributeType ::= OBJECT IDENTIFIER
//!     AttributeValue ::= ANY
//! ```
//!
//! Issuer to subject matching is exact. Two names match when they carry the
//! same attributes, with the same string type and the same value bytes. The
//! position of an attribute within the name is not significant, there is no
//! case folding and no whitespace normalization.

extern crate alloc;

use super::primitive::{expect_end, expect_tag, object_identifier};
use super::{Error, Result};
use crate::tlv::{TlvNode, TlvTag};
use alloc::string::String;
use alloc::vec::Vec;
use const_oid::ObjectIdentifier;
use core::fmt::{Display, Formatter};
use der::Tag;

const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const STATE_OR_PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const DOMAIN_COMPONENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25");

/// Identifier octet of a UniversalString, big endian UCS-4 code points
const UNIVERSAL_STRING: u8 = 0x1C;

/// A single attribute of a name, like the common name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    /// The attribute type
    pub oid: ObjectIdentifier,
    /// The tag of the value, usually one of the string types
    pub tag: TlvTag,
    /// The content bytes of the value
    pub value: Vec<u8>,
}

impl AttributeTypeAndValue {
    fn from_node(node: &TlvNode<'_>) -> Result<Self> {
        let node = expect_tag(Some(node), Tag::Sequence, "attributeTypeAndValue")?;
        let mut fields = node.children().iter();
        let oid = object_identifier(fields.next(), "attributeType")?;
        let value = fields
            .next()
            .ok_or(Error::MissingField("attributeValue"))?;
        expect_end(fields, "attributeTypeAndValue")?;
        Ok(Self {
            oid,
            tag: value.tag(),
            value: value.content().to_vec(),
        })
    }

    fn sort_key(&self) -> (&[u8], u8, &[u8]) {
        (self.oid.as_bytes(), self.tag.octet(), &self.value)
    }
}

impl Display for AttributeTypeAndValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match short_name(&self.oid) {
            Some(name) => write!(f, "{name}=")?,
            None => write!(f, "{}=", self.oid)?,
        }
        let text = match self.tag.as_tag() {
            Some(Tag::Utf8String | Tag::PrintableString | Tag::Ia5String) => {
                core::str::from_utf8(&self.value).ok().map(String::from)
            }
            None if self.tag.octet() == UNIVERSAL_STRING => ucs4_text(&self.value),
            _ => None,
        };
        match text {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "#{}", hex::encode(&self.value)),
        }
    }
}

fn ucs4_text(value: &[u8]) -> Option<String> {
    if value.len() % 4 != 0 {
        return None;
    }
    value
        .chunks_exact(4)
        .map(|chunk| {
            <[u8; 4]>::try_from(chunk)
                .ok()
                .map(u32::from_be_bytes)
                .and_then(char::from_u32)
        })
        .collect()
}

fn short_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    match *oid {
        COMMON_NAME => Some("CN"),
        COUNTRY => Some("C"),
        LOCALITY => Some("L"),
        STATE_OR_PROVINCE => Some("ST"),
        ORGANIZATION => Some("O"),
        ORGANIZATIONAL_UNIT => Some("OU"),
        DOMAIN_COMPONENT => Some("DC"),
        _ => None,
    }
}

/// The issuer or subject of a certificate.
#[derive(Debug, Clone)]
pub struct DistinguishedName {
    der: Vec<u8>,
    rdns: Vec<Vec<AttributeTypeAndValue>>,
}

impl DistinguishedName {
    pub(crate) fn from_node(node: Option<&TlvNode<'_>>, field: &'static str) -> Result<Self> {
        let node = expect_tag(node, Tag::Sequence, field)?;
        let rdns = node
            .children()
            .iter()
            .map(|rdn| {
                let rdn = expect_tag(Some(rdn), Tag::Set, field)?;
                if rdn.children().is_empty() {
                    return Err(Error::InvalidValue(field));
                }
                rdn.children()
                    .iter()
                    .map(AttributeTypeAndValue::from_node)
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            der: node.as_bytes().to_vec(),
            rdns,
        })
    }

    /// The DER encoding of the name
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// The relative distinguished names, in encoded order
    pub fn rdns(&self) -> &[Vec<AttributeTypeAndValue>] {
        &self.rdns
    }

    /// All attributes of the name, in encoded order
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeTypeAndValue> {
        self.rdns.iter().flatten()
    }

    /// Whether the name has no attributes
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    fn sorted_attributes(&self) -> Vec<&AttributeTypeAndValue> {
        let mut attributes = self.attributes().collect::<Vec<_>>();
        attributes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        attributes
    }
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        if self.der == other.der {
            return true;
        }
        self.sorted_attributes() == other.sorted_attributes()
    }
}

impl Eq for DistinguishedName {}

/// Formats as `CN=...,O=...`, with values that aren't text shown as hex.
impl Display for DistinguishedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for (index, rdn) in self.rdns.iter().enumerate() {
            if index != 0 {
                write!(f, ",")?;
            }
            for (position, attribute) in rdn.iter().enumerate() {
                if position != 0 {
                    write!(f, "+")?;
                }
                write!(f, "{attribute}")?;
            }
        }
        Ok(())
    }
}

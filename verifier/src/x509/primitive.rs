// Copyright (c) 2023 The MobileCoin Foundation

//! Readers for the ASN.1 primitive values used by certificate fields.

use super::{Error, Result};
use crate::tlv::TlvNode;
use const_oid::ObjectIdentifier;
use der::Tag;

/// Ensure `node` is present and has `tag`.
pub(crate) fn expect_tag<'n, 'a>(
    node: Option<&'n TlvNode<'a>>,
    tag: Tag,
    field: &'static str,
) -> Result<&'n TlvNode<'a>> {
    let node = node.ok_or(Error::MissingField(field))?;
    if node.tag() != tag {
        return Err(Error::UnexpectedTag {
            field,
            expected: tag,
            actual: node.tag(),
        });
    }
    Ok(node)
}

/// Ensure there is nothing left in `fields`.
pub(crate) fn expect_end<'n, 'a: 'n>(
    mut fields: impl Iterator<Item = &'n TlvNode<'a>>,
    field: &'static str,
) -> Result<()> {
    match fields.next() {
        Some(extra) => Err(Error::UnexpectedElement {
            field,
            actual: extra.tag(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn object_identifier(
    node: Option<&TlvNode<'_>>,
    field: &'static str,
) -> Result<ObjectIdentifier> {
    let node = expect_tag(node, Tag::ObjectIdentifier, field)?;
    ObjectIdentifier::from_bytes(node.content()).map_err(|_| Error::InvalidObjectIdentifier(field))
}

/// A DER BOOLEAN, only 0x00 and 0xFF are allowed.
pub(crate) fn boolean(node: &TlvNode<'_>, field: &'static str) -> Result<bool> {
    let node = expect_tag(Some(node), Tag::Boolean, field)?;
    match node.content() {
        [0x00] => Ok(false),
        [0xFF] => Ok(true),
        _ => Err(Error::InvalidValue(field)),
    }
}

/// A minimally encoded non-negative INTEGER that fits in a `u64`.
pub(crate) fn unsigned_integer(node: &TlvNode<'_>, field: &'static str) -> Result<u64> {
    let node = expect_tag(Some(node), Tag::Integer, field)?;
    let bytes = match node.content() {
        [] => return Err(Error::InvalidValue(field)),
        [first, ..] if first & 0x80 != 0 => return Err(Error::InvalidValue(field)),
        [0x00, second, ..] if second & 0x80 == 0 => return Err(Error::InvalidValue(field)),
        [0x00, rest @ ..] if !rest.is_empty() => rest,
        bytes => bytes,
    };
    if bytes.len() > core::mem::size_of::<u64>() {
        return Err(Error::InvalidValue(field));
    }
    Ok(bytes
        .iter()
        .fold(0u64, |value, byte| (value << 8) | u64::from(*byte)))
}

/// The bytes of a BIT STRING along with the count of unused trailing bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BitString<'a> {
    pub unused_bits: u8,
    pub bytes: &'a [u8],
}

pub(crate) fn bit_string<'a>(
    node: Option<&TlvNode<'a>>,
    field: &'static str,
) -> Result<BitString<'a>> {
    let node = expect_tag(node, Tag::BitString, field)?;
    let (unused_bits, bytes) = node
        .content()
        .split_first()
        .ok_or(Error::InvalidBitString(field))?;
    let unused_bits = *unused_bits;
    if unused_bits > 7 {
        return Err(Error::InvalidBitString(field));
    }
    match bytes.last() {
        None if unused_bits != 0 => return Err(Error::InvalidBitString(field)),
        Some(last) if last & ((1u8 << unused_bits) - 1) != 0 => {
            return Err(Error::InvalidBitString(field))
        }
        _ => {}
    }
    Ok(BitString { unused_bits, bytes })
}

/// A BIT STRING holding whole octets, like keys and signatures.
pub(crate) fn octet_aligned_bit_string<'a>(
    node: Option<&TlvNode<'a>>,
    field: &'static str,
) -> Result<&'a [u8]> {
    let bits = bit_string(node, field)?;
    if bits.unused_bits != 0 {
        return Err(Error::InvalidBitString(field));
    }
    Ok(bits.bytes)
}

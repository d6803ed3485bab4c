// Copyright (c) 2023 The MobileCoin Foundation

//! DER tag-length-value decoding.
//!
//! [`Decoder::decode`] turns a byte buffer into a tree of [`TlvNode`]s. Only
//! the definite length form is accepted, and each length is checked against
//! the enclosing element before any of its content is looked at. No meaning
//! is given to the values; that is left to the [`x509`](crate::x509) module.
//!
//! Tags and lengths are read with [`der::Header`], so the canonical encoding
//! rules `der` enforces (minimal lengths, low tag numbers) apply here as
//! well. Primitive universal tags `der` has no variant for, like
//! UniversalString, are read by hand and only their length goes through
//! `der`.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use core::ops::Range;
use der::{Decode, Encode, Header, Length, Reader, SliceReader, Tag};
use serde::{Deserialize, Serialize};

/// Length octet of the BER indefinite length form.
const INDEFINITE_LENGTH: u8 = 0x80;

/// Low bits of an identifier octet signaling a multi-byte tag number.
const HIGH_TAG_NUMBER_FORM: u8 = 0x1F;

/// Class bits of an identifier octet.
const CLASS_MASK: u8 = 0xC0;

/// Bit of an identifier octet marking a constructed element.
const CONSTRUCTED: u8 = 0x20;

/// The tag of a decoded element.
///
/// This is the single identifier octet: class, constructed bit and tag
/// number. It compares equal to the [`Tag`] with the same octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TlvTag(u8);

impl TlvTag {
    /// The identifier octet
    pub fn octet(self) -> u8 {
        self.0
    }

    /// The tag number, without class and constructed bits
    pub fn number(self) -> u8 {
        self.0 & HIGH_TAG_NUMBER_FORM
    }

    /// Whether the element holds other elements
    pub fn is_constructed(self) -> bool {
        self.0 & CONSTRUCTED != 0
    }

    /// The [`Tag`] for this octet, `None` for universal tags `der` does not
    /// know, like UniversalString
    pub fn as_tag(self) -> Option<Tag> {
        Tag::try_from(self.0).ok()
    }

    /// A primitive universal tag that `der` does not decode.
    fn unlisted_universal(octet: u8) -> Option<Self> {
        let number = octet & HIGH_TAG_NUMBER_FORM;
        let universal_primitive = octet & (CLASS_MASK | CONSTRUCTED) == 0;
        (universal_primitive
            && number != 0
            && number != HIGH_TAG_NUMBER_FORM
            && Tag::try_from(octet).is_err())
        .then_some(Self(octet))
    }
}

impl From<Tag> for TlvTag {
    fn from(tag: Tag) -> Self {
        Self(tag.octet())
    }
}

impl PartialEq<Tag> for TlvTag {
    fn eq(&self, other: &Tag) -> bool {
        self.0 == other.octet()
    }
}

impl Display for TlvTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.as_tag() {
            Some(tag) => write!(f, "{tag}"),
            None => write!(f, "UNIVERSAL {}", self.number()),
        }
    }
}

/// Result type for this module
pub type Result<T> = core::result::Result<T, Error>;

/// Error decoding a DER encoded buffer
#[derive(Debug, displaydoc::Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The input ended before the element at offset {offset} was complete
    #[allow(missing_docs)]
    Truncated { offset: usize },
    /// Indefinite length encoding at offset {offset}
    #[allow(missing_docs)]
    IndefiniteLength { offset: usize },
    /// Nesting exceeds the maximum depth of {limit}
    #[allow(missing_docs)]
    DepthExceeded { limit: usize },
    /// Unexpected data after the element ending at offset {offset}
    #[allow(missing_docs)]
    TrailingData { offset: usize },
    /// Input of {len} bytes exceeds the maximum of {limit} bytes
    #[allow(missing_docs)]
    InputTooLarge { len: usize, limit: usize },
    /// Invalid tag or length at offset {offset}: {kind}
    #[allow(missing_docs)]
    InvalidHeader { offset: usize, kind: der::ErrorKind },
}

/// Bounds applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// The deepest an element may be nested, the outermost element is at
    /// depth 1.
    pub max_depth: usize,
    /// The largest input, in bytes, that will be decoded.
    pub max_input_len: usize,
}

impl DecodeLimits {
    /// Default for [`DecodeLimits::max_depth`]
    pub const DEFAULT_MAX_DEPTH: usize = 32;
    /// Default for [`DecodeLimits::max_input_len`]
    pub const DEFAULT_MAX_INPUT_LEN: usize = 1 << 20;

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum input length
    pub fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len;
        self
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_input_len: Self::DEFAULT_MAX_INPUT_LEN,
        }
    }
}

/// A decoded element.
///
/// The node borrows the buffer it was decoded from. Ranges are offsets into
/// that buffer; a child's ranges always lie within its parent's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvNode<'a> {
    input: &'a [u8],
    tag: TlvTag,
    element: Range<usize>,
    content: Range<usize>,
    children: Vec<TlvNode<'a>>,
}

impl<'a> TlvNode<'a> {
    /// The tag of the element
    pub fn tag(&self) -> TlvTag {
        self.tag
    }

    /// Whether the element holds other elements
    pub fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    /// Range of the whole element, header included, in the decoded buffer
    pub fn element_range(&self) -> Range<usize> {
        self.element.clone()
    }

    /// Range of the content in the decoded buffer
    pub fn content_range(&self) -> Range<usize> {
        self.content.clone()
    }

    /// Number of bytes used by the tag and length
    pub fn header_len(&self) -> usize {
        self.content.start - self.element.start
    }

    /// Number of content bytes
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// The whole encoded element
    pub fn as_bytes(&self) -> &'a [u8] {
        self.input.get(self.element.clone()).unwrap_or_default()
    }

    /// The content bytes of the element
    pub fn content(&self) -> &'a [u8] {
        self.input.get(self.content.clone()).unwrap_or_default()
    }

    /// The elements contained in a constructed element, empty for primitive
    /// elements
    pub fn children(&self) -> &[TlvNode<'a>] {
        &self.children
    }

    /// Encode the tree again.
    ///
    /// For a tree from [`Decoder::decode`] this reproduces the decoded bytes.
    pub fn to_der(&self) -> der::Result<Vec<u8>> {
        let mut encoded = Vec::with_capacity(self.element.len());
        self.encode_to(&mut encoded)?;
        Ok(encoded)
    }

    fn encode_to(&self, encoded: &mut Vec<u8>) -> der::Result<()> {
        encoded.push(self.tag.octet());
        Length::try_from(self.content.len())?.encode_to_vec(encoded)?;
        if self.is_constructed() {
            for child in &self.children {
                child.encode_to(encoded)?;
            }
        } else {
            encoded.extend_from_slice(self.content());
        }
        Ok(())
    }
}

/// Decodes a buffer into a tree of [`TlvNode`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoder {
    limits: DecodeLimits,
}

impl Decoder {
    /// Create a decoder which enforces `limits`
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    /// The limits of this decoder
    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Decode `input`, which must hold exactly one element.
    pub fn decode<'a>(&self, input: &'a [u8]) -> Result<TlvNode<'a>> {
        if input.len() > self.limits.max_input_len {
            return Err(Error::InputTooLarge {
                len: input.len(),
                limit: self.limits.max_input_len,
            });
        }

        let root = self.decode_element(input, 0, input.len(), 1)?;
        if root.element.end != input.len() {
            return Err(Error::TrailingData {
                offset: root.element.end,
            });
        }
        Ok(root)
    }

    /// Decode the element starting at `offset` which must end by `end`.
    fn decode_element<'a>(
        &self,
        input: &'a [u8],
        offset: usize,
        end: usize,
        depth: usize,
    ) -> Result<TlvNode<'a>> {
        if depth > self.limits.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.limits.max_depth,
            });
        }

        let window = input.get(offset..end).ok_or(Error::Truncated { offset })?;
        if let [identifier, INDEFINITE_LENGTH, ..] = window {
            if identifier & HIGH_TAG_NUMBER_FORM != HIGH_TAG_NUMBER_FORM {
                return Err(Error::IndefiniteLength { offset });
            }
        }

        let mut reader = SliceReader::new(window).map_err(|e| header_error(e, offset))?;
        let (tag, length) = match window.first().copied().and_then(TlvTag::unlisted_universal) {
            Some(tag) => {
                reader.read_byte().map_err(|e| header_error(e, offset))?;
                let length = Length::decode(&mut reader).map_err(|e| header_error(e, offset))?;
                (tag, length)
            }
            None => {
                let header = Header::decode(&mut reader).map_err(|e| header_error(e, offset))?;
                (TlvTag::from(header.tag), header.length)
            }
        };
        let header_len = usize::try_from(reader.position()).map_err(|e| header_error(e, offset))?;
        let content_len = usize::try_from(length).map_err(|e| header_error(e, offset))?;

        let content_start = offset
            .checked_add(header_len)
            .ok_or(Error::Truncated { offset })?;
        let content_end = content_start
            .checked_add(content_len)
            .filter(|content_end| *content_end <= end)
            .ok_or(Error::Truncated { offset })?;

        let children = if tag.is_constructed() {
            self.decode_children(input, content_start..content_end, depth + 1)?
        } else {
            Vec::new()
        };

        Ok(TlvNode {
            input,
            tag,
            element: offset..content_end,
            content: content_start..content_end,
            children,
        })
    }

    /// Decode elements until `content` is used up.
    fn decode_children<'a>(
        &self,
        input: &'a [u8],
        content: Range<usize>,
        depth: usize,
    ) -> Result<Vec<TlvNode<'a>>> {
        let mut children = Vec::new();
        let mut position = content.start;
        while position < content.end {
            let child = self.decode_element(input, position, content.end, depth)?;
            position = child.element.end;
            children.push(child);
        }
        Ok(children)
    }
}

/// Decode `input` with the default [`DecodeLimits`].
pub fn decode(input: &[u8]) -> Result<TlvNode<'_>> {
    Decoder::default().decode(input)
}

fn header_error(error: der::Error, offset: usize) -> Error {
    match error.kind() {
        der::ErrorKind::Incomplete { .. } => Error::Truncated { offset },
        kind => Error::InvalidHeader { offset, kind },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use assert_matches::assert_matches;
    use yare::parameterized;

    // SEQUENCE { INTEGER 1, SEQUENCE { OCTET STRING "ab" }, [0] { NULL }, NULL }
    const NESTED: &[u8] = &[
        0x30, 0x0F, 0x02, 0x01, 0x01, 0x30, 0x04, 0x04, 0x02, b'a', b'b', 0xA0, 0x02, 0x05, 0x00,
        0x05, 0x00,
    ];

    #[test]
    fn decode_nested_structure() {
        let root = decode(NESTED).expect("Failed to decode");

        assert_eq!(root.tag(), Tag::Sequence);
        assert_eq!(root.element_range(), 0..17);
        assert_eq!(root.content_range(), 2..17);
        assert_eq!(root.children().len(), 4);

        let integer = &root.children()[0];
        assert_eq!(integer.tag(), Tag::Integer);
        assert_eq!(integer.content(), &[0x01]);
        assert!(integer.children().is_empty());

        let inner = &root.children()[1];
        assert_eq!(inner.element_range(), 5..11);
        assert_eq!(inner.children()[0].content(), b"ab");

        let explicit = &root.children()[2];
        assert!(explicit.is_constructed());
        assert_eq!(explicit.children()[0].tag(), Tag::Null);
        assert_eq!(explicit.children()[0].content_len(), 0);
    }

    #[test]
    fn primitive_content_is_not_descended() {
        // OCTET STRING whose content happens to be a valid SEQUENCE
        let input = [0x04, 0x04, 0x30, 0x02, 0x05, 0x00];
        let root = decode(&input).expect("Failed to decode");
        assert!(root.children().is_empty());
        assert_eq!(root.content(), &input[2..]);
    }

    #[test]
    fn long_form_length() {
        let mut input = vec![0x04, 0x81, 0x80];
        input.extend_from_slice(&[0xAB; 0x80]);
        let root = decode(&input).expect("Failed to decode");
        assert_eq!(root.header_len(), 3);
        assert_eq!(root.content_len(), 0x80);
    }

    #[test]
    fn empty_input_is_truncated() {
        assert_eq!(decode(&[]), Err(Error::Truncated { offset: 0 }));
    }

    #[parameterized(
        tag_only = { &[0x30] },
        long_length_missing_octets = { &[0x04, 0x82, 0x01] },
        content_short = { &[0x30, 0x05, 0x02, 0x01] },
    )]
    fn truncated_root(input: &[u8]) {
        assert_eq!(decode(input), Err(Error::Truncated { offset: 0 }));
    }

    #[test]
    fn child_overflowing_parent_is_truncated() {
        let input = [0x30, 0x03, 0x02, 0x05, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(decode(&input), Err(Error::Truncated { offset: 2 }));
    }

    #[test]
    fn indefinite_length_rejected() {
        let input = [0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00];
        assert_eq!(decode(&input), Err(Error::IndefiniteLength { offset: 0 }));
    }

    #[test]
    fn nested_indefinite_length_rejected() {
        let input = [0x30, 0x04, 0x30, 0x80, 0x00, 0x00];
        assert_eq!(decode(&input), Err(Error::IndefiniteLength { offset: 2 }));
    }

    #[test]
    fn trailing_data_rejected() {
        let input = [0x05, 0x00, 0x00];
        assert_eq!(decode(&input), Err(Error::TrailingData { offset: 2 }));
    }

    #[parameterized(
        non_minimal_long_form = { &[0x04, 0x81, 0x01, 0xAA] },
        leading_zero_length = { &[0x04, 0x82, 0x00, 0x01, 0xAA] },
        high_tag_number = { &[0x1F, 0x81, 0x00, 0x00] },
    )]
    fn invalid_header(input: &[u8]) {
        assert_matches!(decode(input), Err(Error::InvalidHeader { offset: 0, .. }));
    }

    #[test]
    fn depth_at_limit_is_accepted() {
        let decoder = Decoder::new(DecodeLimits::default().with_max_depth(2));
        let input = [0x30, 0x02, 0x05, 0x00];
        assert!(decoder.decode(&input).is_ok());
    }

    #[test]
    fn depth_over_limit_is_rejected() {
        let decoder = Decoder::new(DecodeLimits::default().with_max_depth(2));
        let input = [0x30, 0x04, 0x30, 0x02, 0x05, 0x00];
        assert_eq!(
            decoder.decode(&input),
            Err(Error::DepthExceeded { limit: 2 })
        );
    }

    #[test]
    fn deeply_nested_input_does_not_exhaust_the_stack() {
        let mut input = vec![0x05, 0x00];
        for _ in 0..10_000 {
            let mut wrapped = Vec::new();
            Header::new(Tag::Sequence, input.len())
                .expect("Failed to create header")
                .encode_to_vec(&mut wrapped)
                .expect("Failed to encode header");
            wrapped.extend_from_slice(&input);
            input = wrapped;
        }

        assert_eq!(
            decode(&input),
            Err(Error::DepthExceeded {
                limit: DecodeLimits::DEFAULT_MAX_DEPTH
            })
        );
    }

    #[test]
    fn input_too_large() {
        let decoder = Decoder::new(DecodeLimits::default().with_max_input_len(3));
        let input = [0x04, 0x02, 0x00, 0x00];
        assert_eq!(
            decoder.decode(&input),
            Err(Error::InputTooLarge { len: 4, limit: 3 })
        );
    }

    #[test]
    fn re_encoding_reproduces_input() {
        let root = decode(NESTED).expect("Failed to decode");
        assert_eq!(root.to_der().expect("Failed to encode"), NESTED);

        for child in root.children() {
            assert_eq!(
                child.to_der().expect("Failed to encode"),
                &NESTED[child.element_range()]
            );
            assert_eq!(child.as_bytes(), &NESTED[child.element_range()]);
        }
    }

    #[test]
    fn universal_string_is_decoded() {
        // UniversalString "Te" in UCS-4
        let input = [0x1C, 0x08, 0x00, 0x00, 0x00, b'T', 0x00, 0x00, 0x00, b'e'];
        let root = decode(&input).expect("Failed to decode");

        assert_eq!(root.tag().octet(), 0x1C);
        assert_eq!(root.tag().number(), 28);
        assert_eq!(root.tag().as_tag(), None);
        assert_eq!(root.tag().to_string(), "UNIVERSAL 28");
        assert!(!root.is_constructed());
        assert_eq!(root.content(), &input[2..]);
        assert_eq!(root.to_der().expect("Failed to encode"), input);
    }

    #[test]
    fn unlisted_string_types_inside_sequence() {
        // SEQUENCE { GraphicString "a", GeneralString "b", UTF8String "c" }
        let input = [
            0x30, 0x09, 0x19, 0x01, b'a', 0x1B, 0x01, b'b', 0x0C, 0x01, b'c',
        ];
        let root = decode(&input).expect("Failed to decode");

        let tags = root
            .children()
            .iter()
            .map(|child| child.tag().octet())
            .collect::<Vec<_>>();
        assert_eq!(tags, vec![0x19, 0x1B, 0x0C]);
        assert_eq!(root.children()[2].tag(), Tag::Utf8String);
        assert_eq!(root.children()[1].content_range(), 7..8);
        assert_eq!(root.to_der().expect("Failed to encode"), input);
    }

    #[parameterized(
        constructed_universal_string = { &[0x3C, 0x00] },
        non_minimal_length = { &[0x1C, 0x81, 0x01, 0x00] },
        end_of_contents = { &[0x00, 0x00] },
    )]
    fn unlisted_universal_invalid_header(input: &[u8]) {
        assert_matches!(decode(input), Err(Error::InvalidHeader { offset: 0, .. }));
    }

    #[test]
    fn unlisted_universal_truncated_length() {
        assert_eq!(
            decode(&[0x1C, 0x82, 0x01]),
            Err(Error::Truncated { offset: 0 })
        );
    }

    #[test]
    fn unlisted_universal_indefinite_length() {
        assert_eq!(
            decode(&[0x1C, 0x80, 0x00, 0x00]),
            Err(Error::IndefiniteLength { offset: 0 })
        );
    }

    /// Check the ranges and the re-encoding of `node` and everything below it.
    fn check_ranges(node: &TlvNode<'_>, input: &[u8]) {
        let element = node.element_range();
        let content = node.content_range();
        assert_eq!(element.end, content.end);
        assert_eq!(element.start + node.header_len(), content.start);
        assert_eq!(node.as_bytes(), &input[element.clone()]);
        assert_eq!(node.content(), &input[content.clone()]);

        let mut header = vec![node.tag().octet()];
        Length::try_from(node.content_len())
            .expect("Failed to create length")
            .encode_to_vec(&mut header)
            .expect("Failed to encode length");
        assert_eq!(&input[element.start..content.start], header.as_slice());
        assert_eq!(
            node.to_der().expect("Failed to encode"),
            &input[element.clone()]
        );

        if node.is_constructed() {
            let mut position = content.start;
            for child in node.children() {
                assert_eq!(child.element_range().start, position);
                check_ranges(child, input);
                position = child.element_range().end;
            }
            assert_eq!(position, content.end);
        } else {
            assert!(node.children().is_empty());
        }
    }

    #[parameterized(
        nested = { NESTED.to_vec() },
        root_ca = { der_from_pem(include_str!("../data/tests/root_ca.pem")) },
        processor_ca = { der_from_pem(include_str!("../data/tests/processor_ca.pem")) },
        leaf = { der_from_pem(include_str!("../data/tests/leaf_cert.pem")) },
    )]
    fn every_node_slices_and_re_encodes_its_input(input: Vec<u8>) {
        let root = decode(&input).expect("Failed to decode");
        assert_eq!(root.element_range(), 0..input.len());
        assert_eq!(root.to_der().expect("Failed to encode"), input);
        check_ranges(&root, &input);
    }

    fn der_from_pem(pem: &str) -> Vec<u8> {
        let (_, der) = pem_rfc7468::decode_vec(pem.trim().as_bytes()).expect("Failed decoding PEM");
        der
    }

    #[test]
    fn limits_from_partial_json() {
        let limits: DecodeLimits =
            serde_json::from_str(r#"{"max_depth": 8}"#).expect("Failed to parse limits");
        assert_eq!(
            limits,
            DecodeLimits {
                max_depth: 8,
                max_input_len: DecodeLimits::DEFAULT_MAX_INPUT_LEN,
            }
        );
    }
}

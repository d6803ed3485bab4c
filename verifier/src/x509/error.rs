// Copyright (c) 2023 The MobileCoin Foundation

use const_oid::ObjectIdentifier;
use crate::tlv::TlvTag;
use der::Tag;

/// Error type for building certificates and checking their signatures.
#[derive(Debug, displaydoc::Display, Clone, PartialEq, Eq)]
pub enum Error {
    /// The {0} field is missing
    MissingField(&'static str),
    /// Unexpected tag for {field}, expected {expected} but found {actual}
    #[allow(missing_docs)]
    UnexpectedTag {
        field: &'static str,
        expected: Tag,
        actual: TlvTag,
    },
    /// Unexpected element with tag {actual} in {field}
    #[allow(missing_docs)]
    UnexpectedElement { field: &'static str, actual: TlvTag },
    /// Unsupported certificate version {0}
    UnsupportedVersion(u64),
    /// The serial number is empty
    EmptySerialNumber,
    /// The serial number is {len} bytes, the maximum is {max}
    #[allow(missing_docs)]
    SerialNumberTooLong { len: usize, max: usize },
    /// Malformed object identifier in {0}
    InvalidObjectIdentifier(&'static str),
    /// Malformed {0} value
    InvalidValue(&'static str),
    /// Malformed time in {0}
    InvalidTime(&'static str),
    /// Malformed bit string in {0}
    InvalidBitString(&'static str),
    /// The extension {0} occurs more than once
    DuplicateExtension(ObjectIdentifier),
    /// The critical extension {0} is malformed
    MalformedCriticalExtension(ObjectIdentifier),
    /// An error occurred decoding the key from a certificate
    KeyDecoding,
    /// An error occurred decoding the signature from a certificate
    SignatureDecoding,
    /// The certification signature does not match with the verifying key
    SignatureVerification,
    /// Unsupported algorithm {0}
    UnsupportedAlgorithm(ObjectIdentifier),
}

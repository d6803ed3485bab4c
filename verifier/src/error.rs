// Copyright (c) 2023 The MobileCoin Foundation

//! Errors that can occur decoding certificates

use crate::{tlv, x509};

/// Result type for decoding certificates
pub type Result<T> = core::result::Result<T, Error>;

/// Error decoding certificates or trust anchors
///
/// A chain which decodes but does not verify is not an error, see
/// [`Verification`](crate::Verification).
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed DER encoding: {0}
    MalformedEncoding(tlv::Error),
    /// Invalid certificate structure: {0}
    InvalidCertificateStructure(x509::Error),
    /// Malformed DER encoding in trust anchor {index}: {error}
    #[allow(missing_docs)]
    TrustAnchorEncoding { index: usize, error: tlv::Error },
    /// Invalid certificate structure in trust anchor {index}: {error}
    #[allow(missing_docs)]
    TrustAnchorStructure { index: usize, error: x509::Error },
}

impl From<tlv::Error> for Error {
    fn from(e: tlv::Error) -> Self {
        Error::MalformedEncoding(e)
    }
}

impl From<x509::Error> for Error {
    fn from(e: x509::Error) -> Self {
        Error::InvalidCertificateStructure(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

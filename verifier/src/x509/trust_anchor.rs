// Copyright (c) 2023 The MobileCoin Foundation

//! The certificates a chain must lead to

extern crate alloc;

use super::certs::{Certificate, ParseOptions};
use crate::tlv::Decoder;
use crate::Error;
use alloc::vec::Vec;

/// A set of pre-trusted certificates.
///
/// Anchors are trusted as given; how they were obtained is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustAnchors {
    anchors: Vec<Certificate>,
}

impl TrustAnchors {
    /// An empty set of anchors
    pub fn new() -> Self {
        Self::default()
    }

    /// Build anchors from DER encoded certificates.
    ///
    /// The error identifies the position of the first anchor that could not
    /// be built.
    pub fn from_der_list<I, B>(ders: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self::from_der_list_with_options(ders, &ParseOptions::default())
    }

    /// Build anchors from DER encoded certificates with `options`.
    pub fn from_der_list_with_options<I, B>(ders: I, options: &ParseOptions) -> crate::Result<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let decoder = Decoder::new(options.limits);
        let anchors = ders
            .into_iter()
            .enumerate()
            .map(|(index, der)| {
                let node = decoder
                    .decode(der.as_ref())
                    .map_err(|error| Error::TrustAnchorEncoding { index, error })?;
                Certificate::build(&node, options)
                    .map_err(|error| Error::TrustAnchorStructure { index, error })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self { anchors })
    }

    /// Add `anchor` to the set
    pub fn push(&mut self, anchor: Certificate) {
        self.anchors.push(anchor);
    }

    /// Whether `certificate` is one of the anchors, byte for byte
    pub fn contains(&self, certificate: &Certificate) -> bool {
        self.anchors
            .iter()
            .any(|anchor| anchor.as_der() == certificate.as_der())
    }

    /// The anchors whose subject is the issuer of `certificate`
    pub fn issuers_of<'a, 'c>(
        &'a self,
        certificate: &'c Certificate,
    ) -> impl Iterator<Item = &'a Certificate> + 'c
    where
        'a: 'c,
    {
        self.anchors
            .iter()
            .filter(move |anchor| anchor.subject() == certificate.issuer())
    }

    /// All anchors
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.anchors.iter()
    }

    /// Number of anchors
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether there are no anchors
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl FromIterator<Certificate> for TrustAnchors {
    fn from_iter<T: IntoIterator<Item = Certificate>>(iter: T) -> Self {
        Self {
            anchors: iter.into_iter().collect(),
        }
    }
}

// Copyright (c) 2023 The MobileCoin Foundation

//! X.509 certificates and chain verification as described in
//! [RFC5280](https://datatracker.ietf.org/doc/html/rfc5280)

mod algorithm;
mod certs;
mod chain;
mod error;
mod extensions;
mod name;
mod policy;
mod primitive;
mod status;
mod time;
mod trust_anchor;

pub use algorithm::{
    AlgorithmIdentifier, PublicKey, RustCryptoVerifier, Signature, SignatureVerifier,
    SubjectPublicKeyInfo,
};
pub use certs::{Certificate, ParseOptions, Version};
pub use chain::ChainVerifier;
pub use error::Error;
pub use extensions::{
    BasicConstraints, Extension, Extensions, KeyUsage, AUTHORITY_KEY_IDENTIFIER,
    BASIC_CONSTRAINTS, CERTIFICATE_POLICIES, EXTENDED_KEY_USAGE, KEY_USAGE, SUBJECT_ALT_NAME,
    SUBJECT_KEY_IDENTIFIER,
};
pub use name::{AttributeTypeAndValue, DistinguishedName};
pub use policy::VerificationPolicy;
pub use status::{Outcome, Verification, VerificationStatus};
pub use time::{Timestamp, Validity};
pub use trust_anchor::TrustAnchors;

/// Result type for this module
pub type Result<T> = core::result::Result<T, Error>;

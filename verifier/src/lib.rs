// Copyright (c) 2023 The MobileCoin Foundation

#![doc = include_str!("../README.md")]
#![deny(missing_docs, missing_debug_implementations, unsafe_code)]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod clock;
mod error;
pub mod tlv;
pub mod x509;

pub use clock::{FixedClock, TimeSource};
pub use error::{Error, Result};
pub use tlv::{DecodeLimits, Error as DecodeError};
pub use x509::{
    Certificate, ChainVerifier, Error as StructureError, Outcome, ParseOptions, Timestamp,
    TrustAnchors, Verification, VerificationPolicy, VerificationStatus,
};

#[cfg(feature = "std")]
pub use clock::SystemClock;

/// Decode `certificates`, leaf first, and verify them against `anchors`.
///
/// Signatures are checked with [`x509::RustCryptoVerifier`]. A certificate
/// which can't be decoded fails the call; problems with a well formed chain
/// are reported in the returned [`Verification`].
pub fn verify_der<B: AsRef<[u8]>>(
    certificates: &[B],
    anchors: &TrustAnchors,
    policy: &VerificationPolicy,
    time: &dyn TimeSource,
) -> Result<Verification> {
    ChainVerifier::new().verify_der(certificates, anchors, policy, time)
}

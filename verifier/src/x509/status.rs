// Copyright (c) 2023 The MobileCoin Foundation

//! The result of verifying a certificate chain

use core::fmt::{Display, Formatter};
use core::ops::{BitOr, BitOrAssign};
use serde::{Deserialize, Serialize};

/// Every problem found while verifying a chain.
///
/// An empty status means nothing was found.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationStatus(u32);

impl VerificationStatus {
    /// A signature did not verify with its issuer's key
    pub const SIGNATURE_INVALID: Self = Self(1 << 0);
    /// A certificate's notAfter is before the current time
    pub const EXPIRED: Self = Self(1 << 1);
    /// A certificate's notBefore is after the current time
    pub const NOT_YET_VALID: Self = Self(1 << 2);
    /// No issuer could be found to complete the chain
    pub const ISSUER_NOT_FOUND: Self = Self(1 << 3);
    /// An issuing certificate is not a CA
    pub const CA_FLAG_MISSING: Self = Self(1 << 4);
    /// A CA's path length constraint is exceeded
    pub const PATH_LENGTH_EXCEEDED: Self = Self(1 << 5);
    /// The certificates were not provided leaf first in issuing order
    pub const UNSORTED_CHAIN: Self = Self(1 << 6);
    /// A certificate's notBefore is after its notAfter
    pub const INVALID_VALIDITY_PERIOD: Self = Self(1 << 7);
    /// A certificate has a critical extension that isn't understood
    pub const UNSUPPORTED_CRITICAL_EXTENSION: Self = Self(1 << 8);
    /// An issuing certificate's key usage does not permit signing certificates
    pub const KEY_USAGE_VIOLATION: Self = Self(1 << 9);
    /// A certificate's inner and outer signature algorithms differ
    pub const SIGNATURE_ALGORITHM_MISMATCH: Self = Self(1 << 10);
    /// The chain has more certificates than allowed
    pub const CHAIN_TOO_LONG: Self = Self(1 << 11);

    const NAMES: [(Self, &'static str); 12] = [
        (Self::SIGNATURE_INVALID, "SIGNATURE_INVALID"),
        (Self::EXPIRED, "EXPIRED"),
        (Self::NOT_YET_VALID, "NOT_YET_VALID"),
        (Self::ISSUER_NOT_FOUND, "ISSUER_NOT_FOUND"),
        (Self::CA_FLAG_MISSING, "CA_FLAG_MISSING"),
        (Self::PATH_LENGTH_EXCEEDED, "PATH_LENGTH_EXCEEDED"),
        (Self::UNSORTED_CHAIN, "UNSORTED_CHAIN"),
        (Self::INVALID_VALIDITY_PERIOD, "INVALID_VALIDITY_PERIOD"),
        (
            Self::UNSUPPORTED_CRITICAL_EXTENSION,
            "UNSUPPORTED_CRITICAL_EXTENSION",
        ),
        (Self::KEY_USAGE_VIOLATION, "KEY_USAGE_VIOLATION"),
        (
            Self::SIGNATURE_ALGORITHM_MISMATCH,
            "SIGNATURE_ALGORITHM_MISMATCH",
        ),
        (Self::CHAIN_TOO_LONG, "CHAIN_TOO_LONG"),
    ];

    /// A status with no flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The raw bit mask
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// A status from a raw bit mask, unknown bits are dropped
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::all().0)
    }

    /// Every known flag
    pub const fn all() -> Self {
        Self((1 << 12) - 1)
    }

    /// Whether every flag of `other` is set in `self`
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag of `other` is set in `self`
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Set the flags of `other`
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the flags of `other`
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Whether no flags are set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for VerificationStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for VerificationStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs)
    }
}

/// Formats the set flag names joined with `|`, or `OK` when empty.
impl Display for VerificationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return write!(f, "OK");
        }
        let mut names = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name);
        if let Some(first) = names.next() {
            write!(f, "{first}")?;
        }
        for name in names {
            write!(f, "|{name}")?;
        }
        Ok(())
    }
}

/// Whether a chain is acceptable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The chain is acceptable
    Valid,
    /// The chain is not acceptable
    Invalid,
}

/// The outcome of verifying a chain along with every problem found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the chain is acceptable
    pub outcome: Outcome,
    /// The problems found
    pub status: VerificationStatus,
}

impl Verification {
    /// Derive the outcome from `status`.
    ///
    /// [`VerificationStatus::UNSORTED_CHAIN`] only makes the chain invalid
    /// when `strict_ordering` is set.
    pub fn from_status(status: VerificationStatus, strict_ordering: bool) -> Self {
        let mut fatal = status;
        if !strict_ordering {
            fatal.remove(VerificationStatus::UNSORTED_CHAIN);
        }
        let outcome = if fatal.is_empty() {
            Outcome::Valid
        } else {
            Outcome::Invalid
        };
        Self { outcome, status }
    }

    /// Whether the outcome is [`Outcome::Valid`]
    pub fn is_valid(&self) -> bool {
        self.outcome == Outcome::Valid
    }
}

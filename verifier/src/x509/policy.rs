// Copyright (c) 2023 The MobileCoin Foundation

//! Knobs for how strict chain verification is

use serde::{Deserialize, Serialize};

/// Controls which checks [`ChainVerifier`](super::ChainVerifier) performs.
///
/// The default checks everything except the trust anchors themselves.
/// Relaxing a check never lets malformed input through; building
/// certificates is not affected by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationPolicy {
    /// Don't report certificates provided out of issuing order
    pub allow_unsorted_chain: bool,
    /// Don't report issuers missing the CA flag, exceeding their path length
    /// or lacking the key usage for signing certificates
    pub allow_broken: bool,
    /// Skip all validity period checks
    pub disable_time_checks: bool,
    /// Only look for an issuer in the certificate that follows in the input
    pub require_sorted_chain: bool,
    /// Treat an unsorted chain as invalid
    pub strict_ordering: bool,
    /// Don't report critical extensions that aren't understood
    pub ignore_unsupported_critical_extensions: bool,
    /// Apply the validity, CA and path length checks to the trust anchor
    /// which ends the chain
    pub check_anchor_validity: bool,
    /// The most certificates a chain may have, anchor included
    pub max_chain_length: usize,
}

impl VerificationPolicy {
    /// Default for [`VerificationPolicy::max_chain_length`]
    pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 16;

    /// A policy which only checks signatures and issuer linkage.
    ///
    /// Useful for exercising the chain logic with certificates whose dates,
    /// order and constraints can't be relied on.
    pub fn fuzzing() -> Self {
        Self::default()
            .with_allow_unsorted_chain(true)
            .with_allow_broken(true)
            .with_disable_time_checks(true)
    }

    /// Set [`VerificationPolicy::allow_unsorted_chain`]
    pub fn with_allow_unsorted_chain(mut self, allow: bool) -> Self {
        self.allow_unsorted_chain = allow;
        self
    }

    /// Set [`VerificationPolicy::allow_broken`]
    pub fn with_allow_broken(mut self, allow: bool) -> Self {
        self.allow_broken = allow;
        self
    }

    /// Set [`VerificationPolicy::disable_time_checks`]
    pub fn with_disable_time_checks(mut self, disable: bool) -> Self {
        self.disable_time_checks = disable;
        self
    }

    /// Set [`VerificationPolicy::require_sorted_chain`]
    pub fn with_require_sorted_chain(mut self, require: bool) -> Self {
        self.require_sorted_chain = require;
        self
    }

    /// Set [`VerificationPolicy::strict_ordering`]
    pub fn with_strict_ordering(mut self, strict: bool) -> Self {
        self.strict_ordering = strict;
        self
    }

    /// Set [`VerificationPolicy::ignore_unsupported_critical_extensions`]
    pub fn with_ignore_unsupported_critical_extensions(mut self, ignore: bool) -> Self {
        self.ignore_unsupported_critical_extensions = ignore;
        self
    }

    /// Set [`VerificationPolicy::check_anchor_validity`]
    pub fn with_check_anchor_validity(mut self, check: bool) -> Self {
        self.check_anchor_validity = check;
        self
    }

    /// Set [`VerificationPolicy::max_chain_length`]
    pub fn with_max_chain_length(mut self, max_chain_length: usize) -> Self {
        self.max_chain_length = max_chain_length;
        self
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            allow_unsorted_chain: false,
            allow_broken: false,
            disable_time_checks: false,
            require_sorted_chain: false,
            strict_ordering: false,
            ignore_unsupported_critical_extensions: false,
            check_anchor_validity: false,
            max_chain_length: Self::DEFAULT_MAX_CHAIN_LENGTH,
        }
    }
}

// Copyright (c) 2023 The MobileCoin Foundation

//! Sources of the current time for verification
//!
//! Verification never reads the wall clock on its own; every call is given
//! a [`TimeSource`].

use crate::x509::Timestamp;

/// Provides the time certificates are checked against.
pub trait TimeSource {
    /// The current time
    fn now(&self) -> Timestamp;
}

/// Closures returning a [`Timestamp`] are time sources.
impl<F: Fn() -> Timestamp> TimeSource for F {
    fn now(&self) -> Timestamp {
        self()
    }
}

/// Always reports the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    /// A clock stopped at `time`
    pub const fn new(time: Timestamp) -> Self {
        Self(time)
    }

    /// A clock stopped at `seconds` since the Unix epoch
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(Timestamp::from_unix_seconds(seconds))
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Reads the system's wall clock.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => Timestamp::from_unix_duration(since),
            Err(before) => {
                let seconds = i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX);
                Timestamp::from_unix_seconds(-seconds)
            }
        }
    }
}

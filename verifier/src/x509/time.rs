// Copyright (c) 2023 The MobileCoin Foundation

//! Certificate times as defined in section
//! [4.1.2.5](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.5) of
//! [RFC5280](https://datatracker.ietf.org/doc/html/rfc5280)
//!
//! ```ignore
//!     Validity ::= SEQUENCE {
//!         notBefore      Time,
//!         notAfter       Time }
//!
//!     Time ::= CHOICE {
//!         utcTime        UTCTime,
//!         generalTime    GeneralizedTime }
//! ```
//!
//! Both forms must be in UTC, `Z` terminated and include seconds. A two digit
//! UTCTime year of 50 or more is in the 1900s, anything less is in the 2000s.

use super::primitive::{expect_end, expect_tag};
use super::{Error, Result};
use crate::tlv::TlvNode;
use core::fmt::{Display, Formatter};
use core::time::Duration;
use der::Tag;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;
const UTC_TIME_LEN: usize = 13;
const GENERALIZED_TIME_LEN: usize = 15;
const UTC_TIME_PIVOT: u32 = 50;

/// A point in time, as whole seconds since the Unix epoch.
///
/// Negative values are before 1970, which older certificates can use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 1970-01-01T00:00:00Z
    pub const UNIX_EPOCH: Self = Self(0);

    /// A timestamp `seconds` after (or before when negative) the Unix epoch
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Seconds since the Unix epoch
    pub const fn unix_seconds(self) -> i64 {
        self.0
    }

    /// A timestamp `duration` after the Unix epoch, sub-second precision is
    /// dropped.
    pub fn from_unix_duration(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }

    /// A timestamp from calendar values in UTC.
    ///
    /// Returns `None` for a year outside of 0-9999 or an invalid date or
    /// time.
    pub fn from_ymd_hms(
        year: i64,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        if !(0..=9999).contains(&year)
            || !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }
        let days = days_from_civil(year, month, day);
        let seconds = i64::from(hour * 3600 + minute * 60 + second);
        Some(Self(days * SECONDS_PER_DAY + seconds))
    }

    /// Parse the content of a UTCTime, `YYMMDDHHMMSSZ`
    pub fn from_utc_time(text: &[u8]) -> Option<Self> {
        if text.len() != UTC_TIME_LEN || text.last() != Some(&b'Z') {
            return None;
        }
        let short_year = digits(text.get(0..2)?)?;
        let year = if short_year >= UTC_TIME_PIVOT {
            1900 + short_year
        } else {
            2000 + short_year
        };
        Self::from_digits(i64::from(year), text.get(2..12)?)
    }

    /// Parse the content of a GeneralizedTime, `YYYYMMDDHHMMSSZ`
    pub fn from_generalized_time(text: &[u8]) -> Option<Self> {
        if text.len() != GENERALIZED_TIME_LEN || text.last() != Some(&b'Z') {
            return None;
        }
        let year = digits(text.get(0..4)?)?;
        Self::from_digits(i64::from(year), text.get(4..14)?)
    }

    /// Parse `MMDDHHMMSS` for `year`
    fn from_digits(year: i64, text: &[u8]) -> Option<Self> {
        Self::from_ymd_hms(
            year,
            digits(text.get(0..2)?)?,
            digits(text.get(2..4)?)?,
            digits(text.get(4..6)?)?,
            digits(text.get(6..8)?)?,
            digits(text.get(8..10)?)?,
        )
    }
}

/// Formats as RFC 3339, `YYYY-MM-DDTHH:MM:SSZ`
impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let days = self.0.div_euclid(SECONDS_PER_DAY);
        let seconds = self.0.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    }
}

/// The period a certificate is valid for, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Validity {
    /// The time before which the certificate is not valid.
    pub not_before: Timestamp,
    /// The time after which the certificate is not valid.
    pub not_after: Timestamp,
}

impl Validity {
    /// Create a new validity period
    pub const fn new(not_before: Timestamp, not_after: Timestamp) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    /// Whether `not_before` is no later than `not_after`
    pub fn is_well_formed(&self) -> bool {
        self.not_before <= self.not_after
    }

    /// Whether `time` is within the period
    pub fn contains(&self, time: Timestamp) -> bool {
        self.not_before <= time && time <= self.not_after
    }

    pub(crate) fn from_node(node: Option<&TlvNode<'_>>) -> Result<Self> {
        let node = expect_tag(node, Tag::Sequence, "validity")?;
        let mut fields = node.children().iter();
        let not_before = time_from_node(fields.next(), "notBefore")?;
        let not_after = time_from_node(fields.next(), "notAfter")?;
        expect_end(fields, "validity")?;
        Ok(Self::new(not_before, not_after))
    }
}

fn time_from_node(node: Option<&TlvNode<'_>>, field: &'static str) -> Result<Timestamp> {
    let node = node.ok_or(Error::MissingField(field))?;
    let parsed = match node.tag().as_tag() {
        Some(Tag::UtcTime) => Timestamp::from_utc_time(node.content()),
        Some(Tag::GeneralizedTime) => Timestamp::from_generalized_time(node.content()),
        _ => {
            return Err(Error::UnexpectedTag {
                field,
                expected: Tag::UtcTime,
                actual: node.tag(),
            })
        }
    };
    parsed.ok_or(Error::InvalidTime(field))
}

fn digits(text: &[u8]) -> Option<u32> {
    text.iter().try_fold(0u32, |value, c| {
        c.is_ascii_digit()
            .then(|| value * 10 + u32::from(c - b'0'))
    })
}

fn is_leap_year(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// Civil calendar conversions from
// https://howardhinnant.github.io/date_algorithms.html
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let year_of_era = year.rem_euclid(400);
    let month = i64::from(month);
    let shifted_month = if month > 2 { month - 3 } else { month + 9 };
    let day_of_year = (153 * shifted_month + 2) / 5 + i64::from(day) - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let days = days + 719_468;
    let era = days.div_euclid(146_097);
    let day_of_era = days.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month = if shifted_month < 10 {
        shifted_month + 3
    } else {
        shifted_month - 9
    };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    // Month and day are bounded to 1-12 and 1-31 above
    (year, month as u32, day as u32)
}

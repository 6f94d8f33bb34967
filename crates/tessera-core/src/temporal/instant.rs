//! Packed UTC instants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

use super::{PackedDate, PackedDateTime, PackedTime, TimeUnit};
use crate::column::ColumnType;
use crate::error::{Error, Result};

/// A point on the UTC timeline, packed with the [`PackedDateTime`] layout.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedInstant(i64);

impl PackedInstant {
    /// The missing instant.
    pub const MISSING: PackedInstant = PackedInstant(i64::MIN);

    /// Pack a UTC date and time.
    pub fn pack(date: PackedDate, time: PackedTime) -> Self {
        PackedInstant(PackedDateTime::pack(date, time).raw())
    }

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        PackedInstant(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == i64::MIN
    }

    /// The same fields read as a local date-time in UTC.
    #[inline]
    pub fn as_datetime(self) -> PackedDateTime {
        PackedDateTime::from_raw(self.0)
    }

    pub fn unpack(self) -> Option<(PackedDate, PackedTime)> {
        self.as_datetime().unpack()
    }

    pub fn date(self) -> PackedDate {
        self.as_datetime().date()
    }

    pub fn time(self) -> PackedTime {
        self.as_datetime().time()
    }

    /// Pack a chrono timestamp in any zone, truncating to milliseconds.
    pub fn from_datetime<Tz: TimeZone>(value: &DateTime<Tz>) -> Result<Self> {
        let utc = value.naive_utc();
        Ok(PackedInstant(PackedDateTime::from_naive(utc)?.raw()))
    }

    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        self.as_datetime()
            .to_naive()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    /// Milliseconds since the Unix epoch.
    pub fn to_epoch_millis(self) -> Option<i64> {
        self.as_datetime().to_epoch_millis()
    }

    pub fn from_epoch_millis(millis: i64) -> Result<Self> {
        Ok(PackedInstant(PackedDateTime::from_epoch_millis(millis)?.raw()))
    }

    /// Add an amount of any unit on the UTC timeline.
    pub fn plus(self, amount: i64, unit: TimeUnit) -> Result<Self> {
        Ok(PackedInstant(self.as_datetime().plus(amount, unit)?.raw()))
    }

    pub fn millis_until(self, end: PackedInstant) -> Option<i64> {
        self.as_datetime().millis_until(end.as_datetime())
    }

    pub fn seconds_until(self, end: PackedInstant) -> Option<i64> {
        self.millis_until(end).map(|millis| millis / 1_000)
    }

    pub fn is_before(self, other: PackedInstant) -> bool {
        !self.is_missing() && !other.is_missing() && self < other
    }

    pub fn is_after(self, other: PackedInstant) -> bool {
        !self.is_missing() && !other.is_missing() && self > other
    }
}

impl<Tz: TimeZone> TryFrom<DateTime<Tz>> for PackedInstant {
    type Error = Error;

    fn try_from(value: DateTime<Tz>) -> Result<Self> {
        Self::from_datetime(&value)
    }
}

impl FromStr for PackedInstant {
    type Err = Error;

    /// Parse an RFC 3339 timestamp such as `2020-01-15T13:45:07Z`.
    fn from_str(s: &str) -> Result<Self> {
        let value = DateTime::parse_from_rfc3339(s.trim())
            .map_err(|_| Error::malformed(s, ColumnType::Instant))?;
        Self::from_datetime(&value)
    }
}

impl fmt::Display for PackedInstant {
    /// ISO instant with a `Z` suffix; empty when missing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return Ok(());
        }
        write!(f, "{}Z", self.as_datetime())
    }
}

impl fmt::Debug for PackedInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            write!(f, "PackedInstant(missing)")
        } else {
            write!(f, "PackedInstant({})", self)
        }
    }
}

//! Packed times of day.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};

use super::{TimeUnit, MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND};
use crate::column::ColumnType;
use crate::error::{Error, Result};

/// A time of day packed as `[hour: u8][minute: u8][millis_of_minute: u16]`.
///
/// Precision is one millisecond. Every field is non-negative and far below
/// its byte's sign bit, so signed order is chronological order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedTime(i32);

impl PackedTime {
    /// The missing time.
    pub const MISSING: PackedTime = PackedTime(i32::MIN);

    pub const MIDNIGHT: PackedTime = PackedTime(0);

    pub const NOON: PackedTime = PackedTime(12 << 24);

    /// Pack a validated time of day.
    pub fn pack(hour: u32, minute: u32, second: u32, millis: u32) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 || millis > 999 {
            return Err(Error::InvalidArgument(format!(
                "invalid time {:02}:{:02}:{:02}.{:03}",
                hour, minute, second, millis
            )));
        }
        Ok(Self::pack_unchecked(hour, minute, second * 1_000 + millis))
    }

    #[inline]
    fn pack_unchecked(hour: u32, minute: u32, millis_of_minute: u32) -> Self {
        PackedTime(((hour << 24) | (minute << 16) | millis_of_minute) as i32)
    }

    /// Wrap a raw cell value.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        PackedTime(raw)
    }

    /// The raw cell value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == i32::MIN
    }

    /// `(hour, minute, second, millis)`, or `None` when missing.
    pub fn unpack(self) -> Option<(u32, u32, u32, u32)> {
        if self.is_missing() {
            None
        } else {
            Some((self.hour(), self.minute(), self.second(), self.millisecond()))
        }
    }

    /// Pack a chrono time, truncating to milliseconds.
    pub fn from_naive(time: NaiveTime) -> Result<Self> {
        // Leap-second nanos run past one second; keep them in this second.
        let millis = (time.nanosecond() / 1_000_000).min(999);
        Self::pack(time.hour(), time.minute(), time.second(), millis)
    }

    pub fn to_naive(self) -> Option<NaiveTime> {
        self.unpack()
            .and_then(|(h, m, s, ms)| NaiveTime::from_hms_milli_opt(h, m, s, ms))
    }

    #[inline]
    pub fn hour(self) -> u32 {
        ((self.0 >> 24) & 0xFF) as u32
    }

    #[inline]
    pub fn minute(self) -> u32 {
        ((self.0 >> 16) & 0xFF) as u32
    }

    /// Milliseconds since the start of the minute, 0-59999.
    #[inline]
    pub fn millis_of_minute(self) -> u32 {
        (self.0 & 0xFFFF) as u32
    }

    #[inline]
    pub fn second(self) -> u32 {
        self.millis_of_minute() / 1_000
    }

    /// Millisecond of the second, 0-999.
    #[inline]
    pub fn millisecond(self) -> u32 {
        self.millis_of_minute() % 1_000
    }

    pub fn minute_of_day(self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    pub fn second_of_day(self) -> u32 {
        self.minute_of_day() * 60 + self.second()
    }

    pub fn millisecond_of_day(self) -> i64 {
        self.minute_of_day() as i64 * MILLIS_PER_MINUTE + self.millis_of_minute() as i64
    }

    /// The time `millis` milliseconds after midnight, wrapping at day length.
    pub fn from_millisecond_of_day(millis: i64) -> Self {
        let millis = millis.rem_euclid(MILLIS_PER_DAY);
        let hour = millis / MILLIS_PER_HOUR;
        let minute = (millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
        let millis_of_minute = millis % MILLIS_PER_MINUTE;
        Self::pack_unchecked(hour as u32, minute as u32, millis_of_minute as u32)
    }

    fn plus_millis_wrapping(self, millis: i64) -> Self {
        if self.is_missing() {
            return self;
        }
        let delta = millis % MILLIS_PER_DAY;
        Self::from_millisecond_of_day(self.millisecond_of_day() + delta)
    }

    /// Add hours, wrapping around midnight.
    pub fn plus_hours(self, hours: i64) -> Self {
        self.plus_millis_wrapping((hours % 24) * MILLIS_PER_HOUR)
    }

    pub fn plus_minutes(self, minutes: i64) -> Self {
        self.plus_millis_wrapping((minutes % (24 * 60)) * MILLIS_PER_MINUTE)
    }

    pub fn plus_seconds(self, seconds: i64) -> Self {
        self.plus_millis_wrapping((seconds % (24 * 60 * 60)) * MILLIS_PER_SECOND)
    }

    pub fn plus_millis(self, millis: i64) -> Self {
        self.plus_millis_wrapping(millis)
    }

    /// Add an amount of a time-based unit, wrapping around midnight.
    pub fn plus(self, amount: i64, unit: TimeUnit) -> Result<Self> {
        match unit {
            TimeUnit::Millis => Ok(self.plus_millis(amount)),
            TimeUnit::Seconds => Ok(self.plus_seconds(amount)),
            TimeUnit::Minutes => Ok(self.plus_minutes(amount)),
            TimeUnit::Hours => Ok(self.plus_hours(amount)),
            other => Err(Error::InvalidArgument(format!(
                "unit {:?} is not supported for times",
                other
            ))),
        }
    }

    pub fn with_hour(self, hour: u32) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        Self::pack(hour, self.minute(), self.second(), self.millisecond())
    }

    pub fn with_minute(self, minute: u32) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        Self::pack(self.hour(), minute, self.second(), self.millisecond())
    }

    pub fn with_second(self, second: u32) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        Self::pack(self.hour(), self.minute(), second, self.millisecond())
    }

    pub fn with_millisecond(self, millis: u32) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        Self::pack(self.hour(), self.minute(), self.second(), millis)
    }

    /// Drop every field smaller than `unit`. `Days` truncates to midnight.
    pub fn truncated_to(self, unit: TimeUnit) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        let (h, m, s) = (self.hour(), self.minute(), self.second());
        match unit {
            TimeUnit::Millis => Ok(self),
            TimeUnit::Seconds => Ok(Self::pack_unchecked(h, m, s * 1_000)),
            TimeUnit::Minutes => Ok(Self::pack_unchecked(h, m, 0)),
            TimeUnit::Hours => Ok(Self::pack_unchecked(h, 0, 0)),
            TimeUnit::Days => Ok(Self::MIDNIGHT),
            other => Err(Error::InvalidArgument(format!(
                "unit {:?} is too large to truncate a time",
                other
            ))),
        }
    }

    pub fn is_midnight(self) -> bool {
        self == Self::MIDNIGHT
    }

    pub fn is_noon(self) -> bool {
        self == Self::NOON
    }

    /// Before noon.
    pub fn is_am(self) -> bool {
        !self.is_missing() && self.hour() < 12
    }

    /// At or after noon.
    pub fn is_pm(self) -> bool {
        !self.is_missing() && self.hour() >= 12
    }

    fn until(self, end: PackedTime, unit_millis: i64) -> Option<i64> {
        if self.is_missing() || end.is_missing() {
            return None;
        }
        Some((end.millisecond_of_day() - self.millisecond_of_day()) / unit_millis)
    }

    /// Whole hours from `self` to `end` within one day.
    pub fn hours_until(self, end: PackedTime) -> Option<i64> {
        self.until(end, MILLIS_PER_HOUR)
    }

    pub fn minutes_until(self, end: PackedTime) -> Option<i64> {
        self.until(end, MILLIS_PER_MINUTE)
    }

    pub fn seconds_until(self, end: PackedTime) -> Option<i64> {
        self.until(end, MILLIS_PER_SECOND)
    }

    pub fn millis_until(self, end: PackedTime) -> Option<i64> {
        self.until(end, 1)
    }
}

impl TryFrom<NaiveTime> for PackedTime {
    type Error = Error;

    fn try_from(time: NaiveTime) -> Result<Self> {
        Self::from_naive(time)
    }
}

impl FromStr for PackedTime {
    type Err = Error;

    /// Parse `hh:mm`, `hh:mm:ss` or `hh:mm:ss.fff`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let time = NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map_err(|_| Error::malformed(s, ColumnType::LocalTime))?;
        Self::from_naive(time)
    }
}

impl fmt::Display for PackedTime {
    /// `hh:mm:ss`, with `.fff` when the millisecond is non-zero; empty when
    /// missing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return Ok(());
        }
        write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())?;
        if self.millisecond() != 0 {
            write!(f, ".{:03}", self.millisecond())?;
        }
        Ok(())
    }
}

impl fmt::Debug for PackedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            write!(f, "PackedTime(missing)")
        } else {
            write!(f, "PackedTime({})", self)
        }
    }
}

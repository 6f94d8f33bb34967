//! Packed local date-times.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use super::{PackedDate, PackedTime, TimeUnit, MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE};
use crate::column::ColumnType;
use crate::error::{Error, Result};

/// A local date-time packed as `[date: i32][time: u32]`.
///
/// The packed time is never negative, so treating the low half as unsigned
/// keeps signed 64-bit order chronological.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedDateTime(i64);

impl PackedDateTime {
    /// The missing date-time.
    pub const MISSING: PackedDateTime = PackedDateTime(i64::MIN);

    /// Combine a date and a time. Missing if either part is missing.
    pub fn pack(date: PackedDate, time: PackedTime) -> Self {
        if date.is_missing() || time.is_missing() {
            return Self::MISSING;
        }
        PackedDateTime(((date.raw() as i64) << 32) | (time.raw() as u32 as i64))
    }

    /// Pack from calendar fields.
    pub fn of(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millis: u32,
    ) -> Result<Self> {
        Ok(Self::pack(
            PackedDate::pack(year, month, day)?,
            PackedTime::pack(hour, minute, second, millis)?,
        ))
    }

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        PackedDateTime(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == i64::MIN
    }

    /// `(date, time)`, or `None` when missing.
    pub fn unpack(self) -> Option<(PackedDate, PackedTime)> {
        if self.is_missing() {
            None
        } else {
            Some((self.date(), self.time()))
        }
    }

    /// Date part; missing when `self` is missing.
    #[inline]
    pub fn date(self) -> PackedDate {
        if self.is_missing() {
            PackedDate::MISSING
        } else {
            PackedDate::from_raw((self.0 >> 32) as i32)
        }
    }

    /// Time part; missing when `self` is missing.
    #[inline]
    pub fn time(self) -> PackedTime {
        if self.is_missing() {
            PackedTime::MISSING
        } else {
            PackedTime::from_raw(self.0 as u32 as i32)
        }
    }

    pub fn from_naive(value: NaiveDateTime) -> Result<Self> {
        Ok(Self::pack(
            PackedDate::from_naive(value.date())?,
            PackedTime::from_naive(value.time())?,
        ))
    }

    pub fn to_naive(self) -> Option<NaiveDateTime> {
        let (date, time) = self.unpack()?;
        Some(NaiveDateTime::new(date.to_naive()?, time.to_naive()?))
    }

    /// Milliseconds since 1970-01-01T00:00, reading the value as UTC.
    pub fn to_epoch_millis(self) -> Option<i64> {
        let (date, time) = self.unpack()?;
        Some(date.to_epoch_day() * MILLIS_PER_DAY + time.millisecond_of_day())
    }

    /// The date-time `millis` milliseconds after 1970-01-01T00:00.
    pub fn from_epoch_millis(millis: i64) -> Result<Self> {
        let date = PackedDate::from_epoch_day(millis.div_euclid(MILLIS_PER_DAY))?;
        let time = PackedTime::from_millisecond_of_day(millis.rem_euclid(MILLIS_PER_DAY));
        Ok(Self::pack(date, time))
    }

    /// Add an amount of any unit.
    ///
    /// Time-based units carry whole days into the date; month and year
    /// arithmetic clamps the day and keeps the time.
    pub fn plus(self, amount: i64, unit: TimeUnit) -> Result<Self> {
        if self.is_missing() || amount == 0 {
            return Ok(self);
        }
        let (date, time) = (self.date(), self.time());
        if unit.is_time_based() {
            let unit_millis = unit.millis().unwrap_or(1) as i128;
            let total = time.millisecond_of_day() as i128 + amount as i128 * unit_millis;
            let carry = total.div_euclid(MILLIS_PER_DAY as i128);
            let carry = i64::try_from(carry).map_err(|_| {
                Error::InvalidArgument(format!("cannot add {} {:?}", amount, unit))
            })?;
            let millis = total.rem_euclid(MILLIS_PER_DAY as i128) as i64;
            Ok(Self::pack(
                date.plus_days(carry)?,
                PackedTime::from_millisecond_of_day(millis),
            ))
        } else {
            Ok(Self::pack(date.plus(amount, unit)?, time))
        }
    }

    pub fn plus_days(self, days: i64) -> Result<Self> {
        self.plus(days, TimeUnit::Days)
    }

    pub fn plus_hours(self, hours: i64) -> Result<Self> {
        self.plus(hours, TimeUnit::Hours)
    }

    pub fn plus_minutes(self, minutes: i64) -> Result<Self> {
        self.plus(minutes, TimeUnit::Minutes)
    }

    fn until(self, end: PackedDateTime, unit_millis: i64) -> Option<i64> {
        Some((end.to_epoch_millis()? - self.to_epoch_millis()?) / unit_millis)
    }

    /// Whole days from `self` to `end`, counting partial days toward zero.
    pub fn days_until(self, end: PackedDateTime) -> Option<i64> {
        self.until(end, MILLIS_PER_DAY)
    }

    pub fn hours_until(self, end: PackedDateTime) -> Option<i64> {
        self.until(end, MILLIS_PER_HOUR)
    }

    pub fn minutes_until(self, end: PackedDateTime) -> Option<i64> {
        self.until(end, MILLIS_PER_MINUTE)
    }

    pub fn millis_until(self, end: PackedDateTime) -> Option<i64> {
        self.until(end, 1)
    }
}

impl TryFrom<NaiveDateTime> for PackedDateTime {
    type Error = Error;

    fn try_from(value: NaiveDateTime) -> Result<Self> {
        Self::from_naive(value)
    }
}

impl FromStr for PackedDateTime {
    type Err = Error;

    /// Parse an ISO `yyyy-mm-ddThh:mm:ss[.fff]`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let value = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .map_err(|_| Error::malformed(s, ColumnType::LocalDateTime))?;
        Self::from_naive(value)
    }
}

impl fmt::Display for PackedDateTime {
    /// ISO `yyyy-mm-ddThh:mm:ss[.fff]`; empty when missing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unpack() {
            Some((date, time)) => write!(f, "{}T{}", date, time),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for PackedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            write!(f, "PackedDateTime(missing)")
        } else {
            write!(f, "PackedDateTime({})", self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> PackedDateTime {
        PackedDateTime::of(y, mo, d, h, mi, 0, 0).unwrap()
    }

    #[test]
    fn test_pack_unpack() {
        let value = PackedDateTime::of(2020, 1, 15, 13, 45, 7, 250).unwrap();
        let (date, time) = value.unpack().unwrap();
        assert_eq!(date.unpack(), Some((2020, 1, 15)));
        assert_eq!(time.unpack(), Some((13, 45, 7, 250)));
        assert_eq!(value.to_string(), "2020-01-15T13:45:07.250");
        assert_eq!(PackedDateTime::from_raw(value.raw()), value);
    }

    #[test]
    fn test_missing_parts() {
        assert!(PackedDateTime::pack(PackedDate::MISSING, PackedTime::NOON).is_missing());
        assert!(PackedDateTime::MISSING.date().is_missing());
        assert!(PackedDateTime::MISSING.time().is_missing());
        assert_eq!(PackedDateTime::MISSING.to_string(), "");
    }

    #[test]
    fn test_order() {
        assert!(dt(2020, 1, 15, 23, 59) < dt(2020, 1, 16, 0, 0));
        assert!(dt(1969, 12, 31, 12, 0) < dt(1970, 1, 1, 0, 0));
        assert!(dt(-5, 1, 1, 0, 0) < dt(-4, 1, 1, 0, 0));
        assert!(PackedDateTime::MISSING < dt(-30_000, 1, 1, 0, 0));
    }

    #[test]
    fn test_plus_carries_days() {
        let value = dt(2020, 12, 31, 23, 0);
        assert_eq!(value.plus_hours(2).unwrap(), dt(2021, 1, 1, 1, 0));
        assert_eq!(value.plus_minutes(-23 * 60 - 1).unwrap(), dt(2020, 12, 30, 23, 59));
        assert_eq!(value.plus(2, TimeUnit::Months).unwrap(), dt(2021, 2, 28, 23, 0));
        assert_eq!(value.plus_days(1).unwrap(), dt(2021, 1, 1, 23, 0));
    }

    #[test]
    fn test_epoch_millis() {
        let value = dt(1970, 1, 2, 0, 1);
        assert_eq!(value.to_epoch_millis(), Some(MILLIS_PER_DAY + 60_000));
        assert_eq!(PackedDateTime::from_epoch_millis(-1).unwrap(), PackedDateTime::of(1969, 12, 31, 23, 59, 59, 999).unwrap());
    }

    #[test]
    fn test_until() {
        let start = dt(2020, 1, 1, 12, 0);
        let end = dt(2020, 1, 3, 11, 0);
        assert_eq!(start.days_until(end), Some(1));
        assert_eq!(start.hours_until(end), Some(47));
        assert_eq!(start.minutes_until(end), Some(47 * 60));
        assert_eq!(start.days_until(PackedDateTime::MISSING), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "2020-01-15T13:45".parse::<PackedDateTime>().unwrap(),
            dt(2020, 1, 15, 13, 45)
        );
        assert!("2020-01-15".parse::<PackedDateTime>().is_err());
    }
}

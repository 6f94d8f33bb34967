//! Packed calendar dates.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};

use super::{days_in_month, is_leap_year, TimeUnit};
use crate::column::ColumnType;
use crate::error::{Error, Result};

/// Days in a 400 year Gregorian cycle.
const DAYS_PER_CYCLE: i64 = 146_097;

/// Days from 0000-01-01 to 1970-01-01.
const DAYS_0000_TO_1970: i64 = DAYS_PER_CYCLE * 5 - (30 * 365 + 7);

/// Epoch days beyond this cannot hold an `i16` year.
const MAX_EPOCH_DAY: i64 = 13_000_000;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A date packed as `[year: i16][month: u8][day: u8]`.
///
/// The year occupies the signed high half, so signed integer order is
/// chronological order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedDate(i32);

impl PackedDate {
    /// The missing date.
    pub const MISSING: PackedDate = PackedDate(i32::MIN);

    /// Pack a validated calendar date.
    pub fn pack(year: i32, month: u32, day: u32) -> Result<Self> {
        if year < i16::MIN as i32 || year > i16::MAX as i32 {
            return Err(Error::InvalidArgument(format!(
                "year {} cannot be packed; supported years are {} to {}",
                year,
                i16::MIN,
                i16::MAX
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidArgument(format!("invalid month {}", month)));
        }
        if day < 1 || day > days_in_month(year, month) {
            return Err(Error::InvalidArgument(format!(
                "invalid day {} for {}-{:02}",
                day, year, month
            )));
        }
        Ok(Self::pack_unchecked(year, month, day))
    }

    #[inline]
    fn pack_unchecked(year: i32, month: u32, day: u32) -> Self {
        PackedDate((year << 16) | ((month as i32) << 8) | day as i32)
    }

    /// Wrap a raw cell value.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        PackedDate(raw)
    }

    /// The raw cell value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns true for the missing sentinel.
    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == i32::MIN
    }

    /// `(year, month, day)`, or `None` when missing.
    pub fn unpack(self) -> Option<(i32, u32, u32)> {
        if self.is_missing() {
            None
        } else {
            Some((self.year(), self.month(), self.day()))
        }
    }

    /// Pack a chrono date.
    pub fn from_naive(date: NaiveDate) -> Result<Self> {
        Self::pack(date.year(), date.month(), date.day())
    }

    /// The chrono date, or `None` when missing.
    pub fn to_naive(self) -> Option<NaiveDate> {
        self.unpack()
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
    }

    /// Year field.
    #[inline]
    pub fn year(self) -> i32 {
        (self.0 >> 16) as i16 as i32
    }

    /// Month field, 1-12.
    #[inline]
    pub fn month(self) -> u32 {
        ((self.0 >> 8) & 0xFF) as u32
    }

    /// Day of month, 1-31.
    #[inline]
    pub fn day(self) -> u32 {
        (self.0 & 0xFF) as u32
    }

    pub fn is_leap_year(self) -> bool {
        is_leap_year(self.year())
    }

    pub fn length_of_month(self) -> u32 {
        days_in_month(self.year(), self.month())
    }

    pub fn length_of_year(self) -> u32 {
        if self.is_leap_year() {
            366
        } else {
            365
        }
    }

    /// Day of year, 1-366.
    pub fn day_of_year(self) -> u32 {
        let leap = self.is_leap_year();
        let before: u32 = (1..self.month())
            .map(|m| days_in_month(if leap { 2000 } else { 2001 }, m))
            .sum();
        before + self.day()
    }

    /// Quarter of the year, 1-4.
    pub fn quarter(self) -> u32 {
        (self.month() - 1) / 3 + 1
    }

    pub fn weekday(self) -> Weekday {
        let dow0 = (self.to_epoch_day() + 3).rem_euclid(7);
        WEEKDAYS[dow0 as usize]
    }

    pub fn is_first_day_of_month(self) -> bool {
        self.day() == 1
    }

    pub fn is_last_day_of_month(self) -> bool {
        self.day() == self.length_of_month()
    }

    /// ISO-8601 week of the week-based year, 1-53.
    pub fn iso_week(self) -> u32 {
        let weekday = self.weekday().number_from_monday() as i64;
        let week = (self.day_of_year() as i64 - weekday + 10) / 7;
        if week < 1 {
            iso_weeks_in_year(self.year() - 1)
        } else if week as u32 > iso_weeks_in_year(self.year()) {
            1
        } else {
            week as u32
        }
    }

    /// Days since 1970-01-01, negative before.
    pub fn to_epoch_day(self) -> i64 {
        let y = self.year() as i64;
        let m = self.month() as i64;
        let mut total = 365 * y;
        if y >= 0 {
            total += (y + 3) / 4 - (y + 99) / 100 + (y + 399) / 400;
        } else {
            total -= y / -4 - y / -100 + y / -400;
        }
        total += (367 * m - 362) / 12;
        total += self.day() as i64 - 1;
        if m > 2 {
            total -= 1;
            if !self.is_leap_year() {
                total -= 1;
            }
        }
        total - DAYS_0000_TO_1970
    }

    /// The date `epoch_day` days after 1970-01-01.
    pub fn from_epoch_day(epoch_day: i64) -> Result<Self> {
        if !(-MAX_EPOCH_DAY..=MAX_EPOCH_DAY).contains(&epoch_day) {
            return Err(Error::InvalidArgument(format!(
                "epoch day {} is outside the packable range",
                epoch_day
            )));
        }
        let mut zero_day = epoch_day + DAYS_0000_TO_1970 - 60;
        // March-based year keeps the leap day at the end of the cycle.
        let mut adjust = 0;
        if zero_day < 0 {
            let adjust_cycles = (zero_day + 1) / DAYS_PER_CYCLE - 1;
            adjust = adjust_cycles * 400;
            zero_day += -adjust_cycles * DAYS_PER_CYCLE;
        }
        let mut year_est = (400 * zero_day + 591) / DAYS_PER_CYCLE;
        let mut doy_est =
            zero_day - (365 * year_est + year_est / 4 - year_est / 100 + year_est / 400);
        if doy_est < 0 {
            year_est -= 1;
            doy_est = zero_day - (365 * year_est + year_est / 4 - year_est / 100 + year_est / 400);
        }
        year_est += adjust;
        let march_doy0 = doy_est;
        let march_month0 = (march_doy0 * 5 + 2) / 153;
        let month = (march_month0 + 2) % 12 + 1;
        let day = march_doy0 - (march_month0 * 306 + 5) / 10 + 1;
        year_est += march_month0 / 10;

        let year = i32::try_from(year_est)
            .map_err(|_| Error::InvalidArgument(format!("epoch day {} overflows", epoch_day)))?;
        Self::pack(year, month as u32, day as u32)
    }

    /// Add days. Missing stays missing.
    pub fn plus_days(self, days: i64) -> Result<Self> {
        if self.is_missing() || days == 0 {
            return Ok(self);
        }
        let (y, m, d) = (self.year(), self.month(), self.day());
        let dom = d as i64 + days;
        if dom > 0 && dom <= 59 {
            let month_len = self.length_of_month() as i64;
            if dom <= month_len {
                return Ok(Self::pack_unchecked(y, m, dom as u32));
            } else if m < 12 {
                return Ok(Self::pack_unchecked(y, m + 1, (dom - month_len) as u32));
            } else {
                return Self::pack(y + 1, 1, (dom - month_len) as u32);
            }
        }
        let epoch_day = self
            .to_epoch_day()
            .checked_add(days)
            .ok_or_else(|| Error::InvalidArgument(format!("cannot add {} days", days)))?;
        Self::from_epoch_day(epoch_day)
    }

    pub fn plus_weeks(self, weeks: i64) -> Result<Self> {
        let days = weeks
            .checked_mul(7)
            .ok_or_else(|| Error::InvalidArgument(format!("cannot add {} weeks", weeks)))?;
        self.plus_days(days)
    }

    /// Add months, clamping the day to the end of the resulting month.
    pub fn plus_months(self, months: i64) -> Result<Self> {
        if self.is_missing() || months == 0 {
            return Ok(self);
        }
        let month_count = self.year() as i64 * 12 + (self.month() as i64 - 1);
        let target = month_count
            .checked_add(months)
            .ok_or_else(|| Error::InvalidArgument(format!("cannot add {} months", months)))?;
        let year = i32::try_from(target.div_euclid(12))
            .map_err(|_| Error::InvalidArgument(format!("cannot add {} months", months)))?;
        let month = target.rem_euclid(12) as u32 + 1;
        Self::resolve_previous_valid(year, month, self.day())
    }

    /// Add years, clamping February 29 to February 28.
    pub fn plus_years(self, years: i64) -> Result<Self> {
        if self.is_missing() || years == 0 {
            return Ok(self);
        }
        let year = i32::try_from(self.year() as i64 + years)
            .map_err(|_| Error::InvalidArgument(format!("cannot add {} years", years)))?;
        Self::resolve_previous_valid(year, self.month(), self.day())
    }

    /// Add an amount of a date-based unit.
    pub fn plus(self, amount: i64, unit: TimeUnit) -> Result<Self> {
        match unit {
            TimeUnit::Days => self.plus_days(amount),
            TimeUnit::Weeks => self.plus_weeks(amount),
            TimeUnit::Months => self.plus_months(amount),
            TimeUnit::Years => self.plus_years(amount),
            other => Err(Error::InvalidArgument(format!(
                "unit {:?} is not supported for dates",
                other
            ))),
        }
    }

    /// Replace the year, clamping February 29.
    pub fn with_year(self, year: i32) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        Self::resolve_previous_valid(year, self.month(), self.day())
    }

    /// Replace the month, clamping the day to the month's length.
    pub fn with_month(self, month: u32) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidArgument(format!("invalid month {}", month)));
        }
        Self::resolve_previous_valid(self.year(), month, self.day())
    }

    /// Replace the day of month.
    pub fn with_day(self, day: u32) -> Result<Self> {
        if self.is_missing() {
            return Ok(self);
        }
        Self::pack(self.year(), self.month(), day)
    }

    /// Whole days from `self` to `end`; `None` if either is missing.
    pub fn days_until(self, end: PackedDate) -> Option<i64> {
        if self.is_missing() || end.is_missing() {
            return None;
        }
        Some(end.to_epoch_day() - self.to_epoch_day())
    }

    pub fn weeks_until(self, end: PackedDate) -> Option<i64> {
        self.days_until(end).map(|days| days / 7)
    }

    /// Whole months from `self` to `end`; a month is complete once the
    /// day of month is reached.
    pub fn months_until(self, end: PackedDate) -> Option<i64> {
        if self.is_missing() || end.is_missing() {
            return None;
        }
        let start = self.proleptic_month() * 32 + self.day() as i64;
        let finish = end.proleptic_month() * 32 + end.day() as i64;
        Some((finish - start) / 32)
    }

    pub fn years_until(self, end: PackedDate) -> Option<i64> {
        self.months_until(end).map(|months| months / 12)
    }

    fn proleptic_month(self) -> i64 {
        self.year() as i64 * 12 + self.month() as i64 - 1
    }

    fn resolve_previous_valid(year: i32, month: u32, day: u32) -> Result<Self> {
        Self::pack(year, month, day.min(days_in_month(year, month)))
    }
}

fn iso_weeks_in_year(year: i32) -> u32 {
    match PackedDate::pack(year, 1, 1) {
        Ok(jan1) => {
            let weekday = jan1.weekday();
            if weekday == Weekday::Thu || (is_leap_year(year) && weekday == Weekday::Wed) {
                53
            } else {
                52
            }
        }
        Err(_) => 52,
    }
}

impl TryFrom<NaiveDate> for PackedDate {
    type Error = Error;

    fn try_from(date: NaiveDate) -> Result<Self> {
        Self::from_naive(date)
    }
}

impl FromStr for PackedDate {
    type Err = Error;

    /// Parse an ISO `yyyy-mm-dd` date.
    fn from_str(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| Error::malformed(s, ColumnType::LocalDate))?;
        Self::from_naive(date)
    }
}

impl fmt::Display for PackedDate {
    /// ISO `yyyy-mm-dd`; empty when missing.
    ///
    /// Years outside 0..=9999 use the expanded form with an explicit sign,
    /// `+12000-01-15` or `-0044-03-15`, which chrono's `%Y` reads back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return Ok(());
        }
        let year = self.year();
        if year < 0 {
            write!(f, "-{:04}-{:02}-{:02}", -year, self.month(), self.day())
        } else if year > 9999 {
            write!(f, "+{}-{:02}-{:02}", year, self.month(), self.day())
        } else {
            write!(f, "{:04}-{:02}-{:02}", year, self.month(), self.day())
        }
    }
}

impl fmt::Debug for PackedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            write!(f, "PackedDate(missing)")
        } else {
            write!(f, "PackedDate({})", self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> PackedDate {
        PackedDate::pack(y, m, d).unwrap()
    }

    #[test]
    fn test_pack_unpack() {
        let packed = date(2020, 1, 15);
        assert_eq!(packed.unpack(), Some((2020, 1, 15)));
        assert_eq!(packed.to_string(), "2020-01-15");
        assert_eq!(PackedDate::from_raw(packed.raw()), packed);
        assert!(packed < date(2020, 1, 16));
    }

    #[test]
    fn test_negative_years_order() {
        assert!(date(-1, 12, 31) < date(0, 1, 1));
        assert!(date(-200, 6, 1) < date(-1, 1, 1));
        assert!(PackedDate::MISSING < date(i16::MIN as i32, 1, 1));
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(PackedDate::pack(2023, 2, 29).is_err());
        assert!(PackedDate::pack(2023, 13, 1).is_err());
        assert!(PackedDate::pack(2023, 4, 31).is_err());
        assert!(PackedDate::pack(40_000, 1, 1).is_err());
        assert!(PackedDate::pack(2024, 2, 29).is_ok());
    }

    #[test]
    fn test_epoch_day_matches_chrono() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        for (y, m, d) in [(1970, 1, 1), (2000, 2, 29), (1969, 12, 31), (1, 1, 1), (-400, 3, 1), (2024, 12, 31)] {
            let packed = date(y, m, d);
            let expected = (NaiveDate::from_ymd_opt(y, m, d).unwrap() - epoch).num_days();
            assert_eq!(packed.to_epoch_day(), expected, "{}", packed);
            assert_eq!(PackedDate::from_epoch_day(expected).unwrap(), packed);
        }
    }

    #[test]
    fn test_fields() {
        let d = date(2024, 3, 1);
        assert_eq!(d.day_of_year(), 61);
        assert_eq!(d.quarter(), 1);
        assert_eq!(d.weekday(), Weekday::Fri);
        assert!(d.is_leap_year());
        assert_eq!(d.length_of_year(), 366);
        assert!(d.is_first_day_of_month());
        assert!(date(2023, 2, 28).is_last_day_of_month());
        assert_eq!(date(2023, 12, 31).quarter(), 4);
    }

    #[test]
    fn test_iso_week_matches_chrono() {
        for (y, m, d) in [(2021, 1, 1), (2020, 12, 31), (2024, 12, 30), (2026, 1, 1), (2015, 12, 31)] {
            let expected = NaiveDate::from_ymd_opt(y, m, d).unwrap().iso_week().week();
            assert_eq!(date(y, m, d).iso_week(), expected, "{}-{}-{}", y, m, d);
        }
    }

    #[test]
    fn test_plus_days_crosses_boundaries() {
        assert_eq!(date(2023, 12, 31).plus_days(1).unwrap(), date(2024, 1, 1));
        assert_eq!(date(2024, 2, 28).plus_days(1).unwrap(), date(2024, 2, 29));
        assert_eq!(date(2024, 3, 1).plus_days(-1).unwrap(), date(2024, 2, 29));
        assert_eq!(date(2020, 1, 15).plus_days(365).unwrap(), date(2021, 1, 14));
        assert_eq!(date(2020, 1, 15).plus_weeks(2).unwrap(), date(2020, 1, 29));
    }

    #[test]
    fn test_month_arithmetic_clamps() {
        assert_eq!(date(2024, 1, 31).plus_months(1).unwrap(), date(2024, 2, 29));
        assert_eq!(date(2023, 1, 31).plus_months(1).unwrap(), date(2023, 2, 28));
        assert_eq!(date(2024, 1, 15).plus_months(-2).unwrap(), date(2023, 11, 15));
        assert_eq!(date(2024, 2, 29).plus_years(1).unwrap(), date(2025, 2, 28));
        assert_eq!(date(2024, 5, 31).with_month(6).unwrap(), date(2024, 6, 30));
        assert!(date(2024, 5, 31).plus(1, TimeUnit::Hours).is_err());
    }

    #[test]
    fn test_missing_propagates() {
        let missing = PackedDate::MISSING;
        assert_eq!(missing.plus_days(3).unwrap(), missing);
        assert_eq!(missing.plus_months(3).unwrap(), missing);
        assert_eq!(missing.to_naive(), None);
        assert_eq!(missing.to_string(), "");
        assert_eq!(missing.days_until(date(2020, 1, 1)), None);
    }

    #[test]
    fn test_until() {
        let start = date(2020, 1, 15);
        assert_eq!(start.days_until(date(2020, 2, 14)), Some(30));
        assert_eq!(start.weeks_until(date(2020, 2, 14)), Some(4));
        assert_eq!(start.months_until(date(2020, 2, 14)), Some(0));
        assert_eq!(start.months_until(date(2020, 2, 15)), Some(1));
        assert_eq!(start.years_until(date(2023, 1, 14)), Some(2));
        assert_eq!(date(2020, 2, 15).months_until(start), Some(-1));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("2020-01-15".parse::<PackedDate>().unwrap(), date(2020, 1, 15));
        assert!("2020-02-30".parse::<PackedDate>().is_err());
    }

    #[test]
    fn test_expanded_years_read_back() {
        for packed in [date(12_000, 1, 15), date(i16::MAX as i32, 12, 31), date(-44, 3, 15)] {
            let text = packed.to_string();
            assert_eq!(text.parse::<PackedDate>().unwrap(), packed, "{}", text);
        }
        assert_eq!(date(12_000, 1, 15).to_string(), "+12000-01-15");
        assert_eq!(date(-44, 3, 15).to_string(), "-0044-03-15");
        assert_eq!(date(9999, 12, 31).to_string(), "9999-12-31");
    }
}

//! Order-preserving packed temporal values.
//!
//! Calendar values are packed into a single `i32` or `i64` so that sorting,
//! comparison and min/max over a temporal column are plain integer
//! operations. Every packing here satisfies two properties:
//!
//! - `unpack(pack(x)) == x` for every representable value;
//! - numeric order of packed values equals chronological order.
//!
//! Layouts (most significant first):
//!
//! | type | width | layout |
//! |---|---|---|
//! | [`PackedDate`] | 32 | `year: i16`, `month: u8`, `day: u8` |
//! | [`PackedTime`] | 32 | `hour: u8`, `minute: u8`, `millis_of_minute: u16` |
//! | [`PackedDateTime`] | 64 | `date: i32`, `time: u32` |
//! | [`PackedInstant`] | 64 | as date-time, in UTC |
//! | [`PackedDateRange`] | 64 | `from: i32`, `to ^ 0x8000_0000: u32` |
//!
//! Each type reserves the minimum of its width as the missing sentinel. No
//! valid value packs to it, and every arithmetic helper maps it to itself.

mod date;
mod datetime;
mod instant;
mod range;
mod time;

pub use date::PackedDate;
pub use datetime::PackedDateTime;
pub use instant::PackedInstant;
pub use range::PackedDateRange;
pub use time::PackedTime;

pub(crate) const MILLIS_PER_SECOND: i64 = 1_000;
pub(crate) const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub(crate) const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub(crate) const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Unit for temporal arithmetic and truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    /// Fixed length of the unit in milliseconds. Months and years vary.
    pub fn millis(self) -> Option<i64> {
        match self {
            TimeUnit::Millis => Some(1),
            TimeUnit::Seconds => Some(MILLIS_PER_SECOND),
            TimeUnit::Minutes => Some(MILLIS_PER_MINUTE),
            TimeUnit::Hours => Some(MILLIS_PER_HOUR),
            TimeUnit::Days => Some(MILLIS_PER_DAY),
            TimeUnit::Weeks => Some(7 * MILLIS_PER_DAY),
            TimeUnit::Months | TimeUnit::Years => None,
        }
    }

    /// Returns true for units shorter than a day.
    pub fn is_time_based(self) -> bool {
        matches!(
            self,
            TimeUnit::Millis | TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours
        )
    }
}

/// Proleptic Gregorian leap year rule.
#[inline]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1-12) of `year`.
#[inline]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert!(is_leap_year(-4));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_unit_lengths() {
        assert_eq!(TimeUnit::Hours.millis(), Some(3_600_000));
        assert_eq!(TimeUnit::Months.millis(), None);
        assert!(TimeUnit::Minutes.is_time_based());
        assert!(!TimeUnit::Days.is_time_based());
    }
}

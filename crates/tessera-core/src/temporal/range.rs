//! Packed closed date ranges.

use std::fmt;

use super::PackedDate;
use crate::error::{Error, Result};

const TO_BIAS: u32 = 0x8000_0000;

/// A closed range of dates `[from, to]` packed as
/// `[from: i32][to ^ 0x8000_0000: u32]`.
///
/// Flipping the sign bit of `to` makes its unsigned order match its signed
/// order, so packed order is `from` first with `to` breaking ties.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedDateRange(i64);

impl PackedDateRange {
    /// The missing range.
    pub const MISSING: PackedDateRange = PackedDateRange(i64::MIN);

    /// Pack `[from, to]`. Missing if either end is missing.
    pub fn pack(from: PackedDate, to: PackedDate) -> Result<Self> {
        if from.is_missing() || to.is_missing() {
            return Ok(Self::MISSING);
        }
        if to < from {
            return Err(Error::InvalidArgument(format!(
                "range end {} is before its start {}",
                to, from
            )));
        }
        Ok(PackedDateRange(
            ((from.raw() as i64) << 32) | ((to.raw() as u32 ^ TO_BIAS) as i64),
        ))
    }

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        PackedDateRange(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == i64::MIN
    }

    /// `(from, to)`, or `None` when missing.
    pub fn unpack(self) -> Option<(PackedDate, PackedDate)> {
        if self.is_missing() {
            None
        } else {
            Some((self.from(), self.to()))
        }
    }

    /// First day of the range.
    pub fn from(self) -> PackedDate {
        if self.is_missing() {
            return PackedDate::MISSING;
        }
        PackedDate::from_raw((self.0 >> 32) as i32)
    }

    /// Last day of the range.
    pub fn to(self) -> PackedDate {
        if self.is_missing() {
            return PackedDate::MISSING;
        }
        PackedDate::from_raw((self.0 as u32 ^ TO_BIAS) as i32)
    }

    /// Returns true if `date` lies within the range, ends included.
    pub fn contains(self, date: PackedDate) -> bool {
        match self.unpack() {
            Some((from, to)) => !date.is_missing() && from <= date && date <= to,
            None => false,
        }
    }

    /// Returns true if the ranges share at least one day.
    pub fn overlaps(self, other: PackedDateRange) -> bool {
        match (self.unpack(), other.unpack()) {
            (Some((a_from, a_to)), Some((b_from, b_to))) => a_from <= b_to && b_from <= a_to,
            _ => false,
        }
    }

    /// Number of days covered, counting both ends.
    pub fn length_in_days(self) -> Option<i64> {
        let (from, to) = self.unpack()?;
        from.days_until(to).map(|days| days + 1)
    }

    /// Parse `from<separator>to` with ISO dates on each side.
    pub fn parse_with(s: &str, separator: &str) -> Result<Self> {
        let malformed = || Error::malformed(s, crate::column::ColumnType::DateRange);
        let (from, to) = s.split_once(separator).ok_or_else(malformed)?;
        let from: PackedDate = from.parse().map_err(|_| malformed())?;
        let to: PackedDate = to.parse().map_err(|_| malformed())?;
        Self::pack(from, to)
    }
}

impl std::str::FromStr for PackedDateRange {
    type Err = Error;

    /// Parse `yyyy-mm-dd/yyyy-mm-dd`.
    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with(s, "/")
    }
}

impl fmt::Display for PackedDateRange {
    /// `from/to`; empty when missing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unpack() {
            Some((from, to)) => write!(f, "{}/{}", from, to),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for PackedDateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            write!(f, "PackedDateRange(missing)")
        } else {
            write!(f, "PackedDateRange({})", self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> PackedDate {
        PackedDate::pack(y, m, d).unwrap()
    }

    fn range(from: PackedDate, to: PackedDate) -> PackedDateRange {
        PackedDateRange::pack(from, to).unwrap()
    }

    #[test]
    fn test_pack_unpack() {
        let r = range(date(2020, 1, 1), date(2020, 1, 31));
        assert_eq!(r.unpack(), Some((date(2020, 1, 1), date(2020, 1, 31))));
        assert_eq!(r.to_string(), "2020-01-01/2020-01-31");
        assert_eq!(r.length_in_days(), Some(31));
    }

    #[test]
    fn test_order_is_from_then_to() {
        let a = range(date(2020, 1, 1), date(2020, 1, 5));
        let b = range(date(2020, 1, 1), date(2020, 2, 1));
        let c = range(date(2020, 1, 2), date(2020, 1, 3));
        assert!(a < b);
        assert!(b < c);
        let negative = range(date(-10, 1, 1), date(-5, 1, 1));
        let wide = range(date(-10, 1, 1), date(5, 1, 1));
        assert!(negative < wide);
        assert!(PackedDateRange::MISSING < negative);
    }

    #[test]
    fn test_rejects_inverted() {
        assert!(PackedDateRange::pack(date(2020, 2, 1), date(2020, 1, 1)).is_err());
        assert!(PackedDateRange::pack(PackedDate::MISSING, date(2020, 1, 1))
            .unwrap()
            .is_missing());
    }

    #[test]
    fn test_contains_and_overlaps() {
        let q1 = range(date(2020, 1, 1), date(2020, 3, 31));
        let march = range(date(2020, 3, 1), date(2020, 3, 31));
        let q2 = range(date(2020, 4, 1), date(2020, 6, 30));
        assert!(q1.contains(date(2020, 3, 31)));
        assert!(!q1.contains(date(2020, 4, 1)));
        assert!(!q1.contains(PackedDate::MISSING));
        assert!(q1.overlaps(march));
        assert!(!q1.overlaps(q2));
        assert!(!q1.overlaps(PackedDateRange::MISSING));
    }

    #[test]
    fn test_parse() {
        let r: PackedDateRange = "2020-01-01/2020-01-02".parse().unwrap();
        assert_eq!(r.length_in_days(), Some(2));
        let r = PackedDateRange::parse_with("2020-01-01 to 2020-01-02", " to ").unwrap();
        assert_eq!(r.from(), date(2020, 1, 1));
        assert!("2020-01-01".parse::<PackedDateRange>().is_err());
    }
}

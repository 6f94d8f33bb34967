//! Text cell parsing.
//!
//! Each parser returns `Ok(None)` for a configured missing token,
//! `Ok(Some(value))` on success and an error otherwise. A cell that does not
//! parse is never silently read as missing.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::column::ColumnType;
use crate::config::ParseOptions;
use crate::error::{Error, Result, WideValue};
use crate::store::NumericType;
use crate::temporal::{PackedDate, PackedDateRange, PackedDateTime, PackedInstant, PackedTime};

/// Parse a boolean cell using the configured true/false tokens.
pub fn parse_boolean(cell: &str, options: &ParseOptions) -> Result<Option<bool>> {
    if options.is_missing_token(cell) {
        Ok(None)
    } else if options.is_true(cell) {
        Ok(Some(true))
    } else if options.is_false(cell) {
        Ok(Some(false))
    } else {
        Err(Error::malformed(cell, ColumnType::Boolean))
    }
}

fn strip_grouping<'a>(cell: &'a str, options: &ParseOptions) -> Cow<'a, str> {
    match options.grouping_separator {
        Some(sep) if cell.contains(sep) => Cow::Owned(cell.chars().filter(|c| *c != sep).collect()),
        _ => Cow::Borrowed(cell),
    }
}

/// Parse a numeric cell into the width `T`.
///
/// Integers are read at 128-bit width first. A literal that parses but
/// does not fit `T`, or lands on the sentinel, raises
/// [`Error::OutOfRange`] carrying the wide value. A finite float too large
/// for `f32` does the same.
pub fn parse_number<T: NumericType>(cell: &str, options: &ParseOptions) -> Result<Option<T>> {
    if options.is_missing_token(cell) {
        return Ok(None);
    }
    let text = strip_grouping(options.normalize(cell), options);
    if T::IS_FLOAT {
        parse_float(cell, &text).map(Some)
    } else {
        parse_integer(cell, &text).map(Some)
    }
}

fn parse_integer<T: NumericType>(cell: &str, text: &str) -> Result<T> {
    let wide: i128 = match text.parse() {
        Ok(value) => value,
        // Accept integral decimals such as "12.0".
        Err(_) => match text.split_once('.') {
            Some((whole, fraction)) if !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') => {
                whole.parse().map_err(|_| Error::malformed(cell, T::COLUMN_TYPE))?
            }
            _ => return Err(Error::malformed(cell, T::COLUMN_TYPE)),
        },
    };
    let out_of_range = || Error::OutOfRange {
        input: cell.to_string(),
        parsed: WideValue::Integer(wide),
        column_type: T::COLUMN_TYPE,
    };
    let long = i64::try_from(wide).map_err(|_| out_of_range())?;
    let value = T::from_i64_wrapping(long);
    if value.to_i64() != long || value.is_missing_value() {
        return Err(out_of_range());
    }
    Ok(value)
}

fn parse_float<T: NumericType>(cell: &str, text: &str) -> Result<T> {
    let wide: f64 = text
        .parse()
        .map_err(|_| Error::malformed(cell, T::COLUMN_TYPE))?;
    // NaN is the float sentinel; only a configured missing token may yield it.
    if wide.is_nan() {
        return Err(Error::malformed(cell, T::COLUMN_TYPE));
    }
    let value = T::from_f64_lossy(wide);
    if wide.is_finite() && !value.to_f64().is_finite() {
        return Err(Error::OutOfRange {
            input: cell.to_string(),
            parsed: WideValue::Float(wide),
            column_type: T::COLUMN_TYPE,
        });
    }
    Ok(value)
}

fn first_match<T, F>(text: &str, formats: &[String], parse: F) -> Option<T>
where
    F: Fn(&str, &str) -> Option<T>,
{
    formats.iter().find_map(|format| parse(text, format))
}

/// Parse a date cell, trying each configured format in order.
pub fn parse_date(cell: &str, options: &ParseOptions) -> Result<Option<PackedDate>> {
    if options.is_missing_token(cell) {
        return Ok(None);
    }
    let text = options.normalize(cell);
    let date = first_match(text, &options.date_formats, |t, f| {
        NaiveDate::parse_from_str(t, f).ok()
    })
    .ok_or_else(|| Error::malformed(cell, ColumnType::LocalDate))?;
    PackedDate::from_naive(date).map(Some)
}

/// Parse a time cell, trying each configured format in order.
pub fn parse_time(cell: &str, options: &ParseOptions) -> Result<Option<PackedTime>> {
    if options.is_missing_token(cell) {
        return Ok(None);
    }
    let text = options.normalize(cell);
    let time = first_match(text, &options.time_formats, |t, f| {
        NaiveTime::parse_from_str(t, f).ok()
    })
    .ok_or_else(|| Error::malformed(cell, ColumnType::LocalTime))?;
    PackedTime::from_naive(time).map(Some)
}

fn naive_datetime(text: &str, options: &ParseOptions) -> Option<NaiveDateTime> {
    first_match(text, &options.datetime_formats, |t, f| {
        NaiveDateTime::parse_from_str(t, f).ok()
    })
}

fn epoch_millis(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

/// Parse a date-time cell.
///
/// Configured formats are tried first; a bare integer is read as
/// milliseconds since the Unix epoch.
pub fn parse_datetime(cell: &str, options: &ParseOptions) -> Result<Option<PackedDateTime>> {
    if options.is_missing_token(cell) {
        return Ok(None);
    }
    let text = options.normalize(cell);
    if let Some(value) = naive_datetime(text, options) {
        return PackedDateTime::from_naive(value).map(Some);
    }
    match epoch_millis(text) {
        Some(millis) => PackedDateTime::from_epoch_millis(millis).map(Some),
        None => Err(Error::malformed(cell, ColumnType::LocalDateTime)),
    }
}

/// Parse an instant cell.
///
/// RFC 3339 timestamps keep their offset; date-time formats without an
/// offset, optionally ending in `Z`, and bare epoch milliseconds are read as
/// UTC. The `Z` form covers years RFC 3339 cannot write, such as
/// `+12000-01-15T10:00:00Z`.
pub fn parse_instant(cell: &str, options: &ParseOptions) -> Result<Option<PackedInstant>> {
    if options.is_missing_token(cell) {
        return Ok(None);
    }
    let text = options.normalize(cell);
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return PackedInstant::from_datetime(&value).map(Some);
    }
    let local = text.strip_suffix('Z').unwrap_or(text);
    if let Some(value) = naive_datetime(local, options) {
        let packed = PackedDateTime::from_naive(value)?;
        return Ok(Some(PackedInstant::from_raw(packed.raw())));
    }
    match epoch_millis(text) {
        Some(millis) => PackedInstant::from_epoch_millis(millis).map(Some),
        None => Err(Error::malformed(cell, ColumnType::Instant)),
    }
}

/// Parse a `from<separator>to` date range; each end uses the date formats.
///
/// The separator may also occur inside a date format, as `/` does in
/// `%m/%d/%Y`, so every occurrence is tried as the split point and the
/// first one where both ends parse wins.
pub fn parse_date_range(cell: &str, options: &ParseOptions) -> Result<Option<PackedDateRange>> {
    if options.is_missing_token(cell) {
        return Ok(None);
    }
    let text = options.normalize(cell);
    let separator = options.date_range_separator.as_str();
    let malformed = || Error::malformed(cell, ColumnType::DateRange);
    if separator.is_empty() {
        return Err(malformed());
    }
    let end = |part: &str| parse_date(part, options).ok().flatten();
    let (from, to) = text
        .match_indices(separator)
        .find_map(|(at, _)| Some((end(&text[..at])?, end(&text[at + separator.len()..])?)))
        .ok_or_else(malformed)?;
    PackedDateRange::pack(from, to).map(Some)
}

/// A string cell, or `None` for a missing token.
pub fn parse_string<'a>(cell: &'a str, options: &ParseOptions) -> Option<&'a str> {
    if options.is_missing_token(cell) {
        None
    } else {
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ParseOptions {
        ParseOptions::default()
    }

    #[test]
    fn test_boolean_tokens() {
        assert_eq!(parse_boolean("TRUE", &options()).unwrap(), Some(true));
        assert_eq!(parse_boolean("n", &options()).unwrap(), Some(false));
        assert_eq!(parse_boolean("NA", &options()).unwrap(), None);
        assert!(matches!(
            parse_boolean("maybe", &options()),
            Err(Error::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(parse_number::<i16>("1,234", &options()).unwrap(), Some(1234));
        assert_eq!(parse_number::<i32>(" -7 ", &options()).unwrap(), Some(-7));
        assert_eq!(parse_number::<i32>("12.00", &options()).unwrap(), Some(12));
        assert_eq!(parse_number::<i64>("", &options()).unwrap(), None);
        assert!(matches!(
            parse_number::<i32>("12.5", &options()),
            Err(Error::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_integer_out_of_range_carries_wide_value() {
        let err = parse_number::<i16>("40000", &options()).unwrap_err();
        match err {
            Error::OutOfRange {
                input,
                parsed,
                column_type,
            } => {
                assert_eq!(input, "40000");
                assert_eq!(parsed, WideValue::Integer(40_000));
                assert_eq!(column_type, ColumnType::Short);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let huge = "99999999999999999999";
        let err = parse_number::<i64>(huge, &options()).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange { parsed: WideValue::Integer(v), .. } if v == 99_999_999_999_999_999_999i128
        ));
    }

    #[test]
    fn test_sentinel_literal_is_out_of_range() {
        let err = parse_number::<i8>("-128", &options()).unwrap_err();
        assert!(err.is_out_of_range());
        assert_eq!(parse_number::<i8>("-127", &options()).unwrap(), Some(-127));
    }

    #[test]
    fn test_floats() {
        assert_eq!(parse_number::<f64>("1.5e3", &options()).unwrap(), Some(1500.0));
        assert_eq!(parse_number::<f32>("2.25", &options()).unwrap(), Some(2.25));
        assert_eq!(parse_number::<f64>("NaN", &options()).unwrap(), None);
        assert!(parse_number::<f32>("1e300", &options())
            .unwrap_err()
            .is_out_of_range());
        assert!(parse_number::<f64>("abc", &options()).is_err());
    }

    #[test]
    fn test_unlisted_nan_spellings_are_malformed() {
        for cell in ["nan", "NAN", "-nan", "+NaN"] {
            assert!(
                matches!(parse_number::<f64>(cell, &options()), Err(Error::MalformedLiteral { .. })),
                "{}",
                cell
            );
            assert!(parse_number::<f32>(cell, &options()).is_err(), "{}", cell);
        }
        assert_eq!(parse_number::<f64>("inf", &options()).unwrap(), Some(f64::INFINITY));
    }

    #[test]
    fn test_dates_try_each_format() {
        let expected = PackedDate::pack(2020, 1, 15).unwrap();
        for cell in ["2020-01-15", "20200115", "01/15/2020", "15-Jan-2020", "Jan 15, 2020"] {
            assert_eq!(parse_date(cell, &options()).unwrap(), Some(expected), "{}", cell);
        }
        assert!(matches!(
            parse_date("2020-13-45", &options()),
            Err(Error::MalformedLiteral { .. })
        ));
        assert_eq!(parse_date("", &options()).unwrap(), None);
    }

    #[test]
    fn test_expanded_years() {
        assert_eq!(
            parse_date("+12000-01-15", &options()).unwrap(),
            Some(PackedDate::pack(12_000, 1, 15).unwrap())
        );
        assert_eq!(
            parse_date("-0044-03-15", &options()).unwrap(),
            Some(PackedDate::pack(-44, 3, 15).unwrap())
        );
        let far = PackedDateTime::of(12_000, 1, 15, 10, 0, 0, 0).unwrap();
        assert_eq!(parse_datetime("+12000-01-15T10:00:00", &options()).unwrap(), Some(far));
        let instant = parse_instant("+12000-01-15T10:00:00Z", &options()).unwrap().unwrap();
        assert_eq!(instant.raw(), far.raw());
    }

    #[test]
    fn test_custom_date_format() {
        let options = options().with_date_format("%d.%m.%Y");
        let parsed = parse_date("15.01.2020", &options).unwrap().unwrap();
        assert_eq!(parsed.unpack(), Some((2020, 1, 15)));
    }

    #[test]
    fn test_times() {
        assert_eq!(
            parse_time("13:45:07.250", &options()).unwrap(),
            Some(PackedTime::pack(13, 45, 7, 250).unwrap())
        );
        assert_eq!(
            parse_time("1:30 PM", &options()).unwrap(),
            Some(PackedTime::pack(13, 30, 0, 0).unwrap())
        );
        assert!(parse_time("25:00", &options()).is_err());
    }

    #[test]
    fn test_datetimes_and_instants() {
        let expected = PackedDateTime::of(2020, 1, 15, 8, 30, 0, 0).unwrap();
        assert_eq!(parse_datetime("2020-01-15T08:30:00", &options()).unwrap(), Some(expected));
        assert_eq!(parse_datetime("2020-01-15 08:30", &options()).unwrap(), Some(expected));

        let instant = parse_instant("2020-01-15T10:30:00+02:00", &options()).unwrap().unwrap();
        assert_eq!(instant.raw(), expected.raw());
        let utc = parse_instant("2020-01-15 08:30:00", &options()).unwrap().unwrap();
        assert_eq!(utc, instant);
        let epoch = parse_instant("0", &options()).unwrap().unwrap();
        assert_eq!(epoch.to_epoch_millis(), Some(0));
    }

    #[test]
    fn test_date_ranges() {
        let range = parse_date_range("2020-01-01/2020-01-31", &options()).unwrap().unwrap();
        assert_eq!(range.length_in_days(), Some(31));
        assert!(parse_date_range("2020-01-31/2020-01-01", &options()).is_err());
        assert!(matches!(
            parse_date_range("2020-01-01", &options()),
            Err(Error::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_date_range_separator_inside_date_format() {
        let range = parse_date_range("01/15/2020/01/20/2020", &options())
            .unwrap()
            .unwrap();
        assert_eq!(range.from(), PackedDate::pack(2020, 1, 15).unwrap());
        assert_eq!(range.to(), PackedDate::pack(2020, 1, 20).unwrap());
        assert!(parse_date_range("01/15/2020/01/40/2020", &options()).is_err());

        let spaced = options().with_date_range_separator(" to ");
        let range = parse_date_range("2020-01-01 to 01/31/2020", &spaced).unwrap().unwrap();
        assert_eq!(range.length_in_days(), Some(31));
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse_string("abc", &options()), Some("abc"));
        assert_eq!(parse_string("null", &options()), None);
    }
}

//! Temporal columns over packed values.
//!
//! One generic [`PackedColumn`] stores the raw packed integers of any
//! [`TemporalValue`]. Because packing preserves chronological order, sorting,
//! min/max and range predicates work directly on the raw integers. Each
//! instantiation adds the field extraction and arithmetic specific to its
//! type.

use std::any::Any;
use std::fmt;

use bytes::Bytes;
use chrono::Weekday;

use super::{
    same_type, Column, ColumnType, IntColumn, LongColumn, ShortColumn, SortableColumn,
    TemporalColumn,
};
use crate::config::ParseOptions;
use crate::error::{Error, Result};
use crate::missing::MissingValue;
use crate::parse::{parse_date, parse_date_range, parse_datetime, parse_instant, parse_time};
use crate::selection::Selection;
use crate::store::{NumericType, Primitive, PrimitiveStore};
use crate::temporal::{
    PackedDate, PackedDateRange, PackedDateTime, PackedInstant, PackedTime, TimeUnit,
};

/// A packed temporal value that a column can store.
pub trait TemporalValue: Copy + Ord + fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Stored integer width.
    type Raw: Primitive + Ord;

    const COLUMN_TYPE: ColumnType;

    const MISSING: Self;

    fn from_raw(raw: Self::Raw) -> Self;

    fn raw(self) -> Self::Raw;

    fn is_missing(self) -> bool;

    /// Parse one text cell; `Ok(None)` for a missing token.
    fn parse_cell(cell: &str, options: &ParseOptions) -> Result<Option<Self>>;
}

macro_rules! temporal_value {
    ($t:ty, $raw:ty, $column_type:expr, $parse:ident) => {
        impl TemporalValue for $t {
            type Raw = $raw;

            const COLUMN_TYPE: ColumnType = $column_type;

            const MISSING: Self = <$t>::MISSING;

            #[inline]
            fn from_raw(raw: $raw) -> Self {
                <$t>::from_raw(raw)
            }

            #[inline]
            fn raw(self) -> $raw {
                <$t>::raw(self)
            }

            #[inline]
            fn is_missing(self) -> bool {
                <$t>::is_missing(self)
            }

            fn parse_cell(cell: &str, options: &ParseOptions) -> Result<Option<Self>> {
                $parse(cell, options)
            }
        }
    };
}

temporal_value!(PackedDate, i32, ColumnType::LocalDate, parse_date);
temporal_value!(PackedTime, i32, ColumnType::LocalTime, parse_time);
temporal_value!(PackedDateTime, i64, ColumnType::LocalDateTime, parse_datetime);
temporal_value!(PackedInstant, i64, ColumnType::Instant, parse_instant);
temporal_value!(PackedDateRange, i64, ColumnType::DateRange, parse_date_range);

/// A column of packed temporal values.
pub struct PackedColumn<V: TemporalValue> {
    name: String,
    data: PrimitiveStore<V::Raw>,
}

pub type DateColumn = PackedColumn<PackedDate>;
pub type TimeColumn = PackedColumn<PackedTime>;
pub type DateTimeColumn = PackedColumn<PackedDateTime>;
pub type InstantColumn = PackedColumn<PackedInstant>;
pub type DateRangeColumn = PackedColumn<PackedDateRange>;

impl<V: TemporalValue> Clone for PackedColumn<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            data: self.data.clone(),
        }
    }
}

impl<V: TemporalValue> PartialEq for PackedColumn<V> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data == other.data
    }
}

impl<V: TemporalValue> PackedColumn<V> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: PrimitiveStore::new(),
        }
    }

    /// Create a column of `rows` missing values.
    pub fn with_size(name: &str, rows: usize) -> Self {
        Self {
            name: name.to_string(),
            data: PrimitiveStore::missing(rows),
        }
    }

    pub fn create(name: &str, values: &[V]) -> Self {
        Self {
            name: name.to_string(),
            data: values.iter().map(|v| v.raw()).collect(),
        }
    }

    pub fn from_options<I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<V>>,
    {
        Self {
            name: name.to_string(),
            data: values
                .into_iter()
                .map(|v| v.unwrap_or(V::MISSING).raw())
                .collect(),
        }
    }

    /// Create a column over raw packed integers.
    pub fn from_raw(name: &str, values: Vec<V::Raw>) -> Self {
        Self {
            name: name.to_string(),
            data: PrimitiveStore::from_vec(values),
        }
    }

    fn with_data(&self, data: PrimitiveStore<V::Raw>) -> Self {
        Self {
            name: self.name.clone(),
            data,
        }
    }

    fn derived<W: TemporalValue<Raw = V::Raw>>(&self, name: String) -> PackedColumn<W> {
        PackedColumn {
            name,
            data: self.data.clone(),
        }
    }

    /// Raw packed integers, sentinels included.
    pub fn as_raw(&self) -> &[V::Raw] {
        self.data.as_slice()
    }

    pub fn get(&self, row: usize) -> Result<Option<V>> {
        let value = V::from_raw(self.data.get(row)?);
        Ok(if value.is_missing() { None } else { Some(value) })
    }

    pub fn set(&mut self, row: usize, value: V) -> Result<()> {
        self.data.set(row, value.raw())
    }

    pub fn set_missing_at(&mut self, row: usize) -> Result<()> {
        self.data.set(row, V::MISSING.raw())
    }

    pub fn append(&mut self, value: V) -> &mut Self {
        self.data.append(value.raw());
        self
    }

    pub fn append_option(&mut self, value: Option<V>) -> &mut Self {
        self.data.append(value.unwrap_or(V::MISSING).raw());
        self
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn empty_copy(&self) -> Self {
        Self::new(&self.name)
    }

    pub fn filter(&self, selection: &Selection) -> Result<Self> {
        Ok(self.with_data(self.data.filter(selection)?))
    }

    pub fn subset(&self, rows: &[usize]) -> Result<Self> {
        Ok(self.with_data(self.data.subset(rows)?))
    }

    pub fn lag(&self, n: isize) -> Self {
        self.with_data(self.data.lag(n))
    }

    pub fn lead(&self, n: isize) -> Self {
        self.with_data(self.data.lead(n))
    }

    /// The `n` latest values, latest first.
    pub fn top(&self, n: usize) -> Self {
        self.with_data(self.data.top(n))
    }

    /// The `n` earliest values, earliest first.
    pub fn bottom(&self, n: usize) -> Self {
        self.with_data(self.data.bottom(n))
    }

    /// Distinct non-missing values in first-seen order.
    pub fn unique(&self) -> Self {
        self.with_data(self.data.unique())
    }

    /// Earliest value, skipping missing rows.
    pub fn min(&self) -> Option<V> {
        self.data.min().map(V::from_raw)
    }

    /// Latest value, skipping missing rows.
    pub fn max(&self) -> Option<V> {
        self.data.max().map(V::from_raw)
    }

    /// Rows whose value satisfies `predicate`. Missing rows never match.
    pub fn eval<F: Fn(V) -> bool>(&self, predicate: F) -> Selection {
        self.data.eval(|raw| predicate(V::from_raw(raw)))
    }

    pub fn is_equal_to(&self, value: V) -> Selection {
        let raw = value.raw();
        self.data.eval(|v| v == raw)
    }

    pub fn is_not_equal_to(&self, value: V) -> Selection {
        let raw = value.raw();
        self.data.eval(|v| v != raw)
    }

    pub fn is_before(&self, value: V) -> Selection {
        let raw = value.raw();
        self.data.eval(|v| v < raw)
    }

    pub fn is_after(&self, value: V) -> Selection {
        let raw = value.raw();
        self.data.eval(|v| v > raw)
    }

    pub fn is_on_or_before(&self, value: V) -> Selection {
        let raw = value.raw();
        self.data.eval(|v| v <= raw)
    }

    pub fn is_on_or_after(&self, value: V) -> Selection {
        let raw = value.raw();
        self.data.eval(|v| v >= raw)
    }

    /// Rows in `[low, high]`.
    pub fn is_between_inclusive(&self, low: V, high: V) -> Selection {
        let (low, high) = (low.raw(), high.raw());
        self.data.eval(|v| v >= low && v <= high)
    }

    /// Rows in `(low, high)`.
    pub fn is_between_exclusive(&self, low: V, high: V) -> Selection {
        let (low, high) = (low.raw(), high.raw());
        self.data.eval(|v| v > low && v < high)
    }

    pub fn is_in(&self, values: &[V]) -> Selection {
        let raws: Vec<V::Raw> = values.iter().map(|v| v.raw()).collect();
        self.data.eval(|v| raws.contains(&v))
    }

    /// Rows where both columns are present and `compare(self, other)` holds.
    pub fn compare_column<F>(&self, other: &Self, compare: F) -> Result<Selection>
    where
        F: Fn(V, V) -> bool,
    {
        if self.size() != other.size() {
            return Err(Error::LengthMismatch {
                left: self.size(),
                right: other.size(),
            });
        }
        Ok(self
            .as_raw()
            .iter()
            .zip(other.as_raw())
            .enumerate()
            .filter(|(_, (a, b))| {
                !a.is_missing_value()
                    && !b.is_missing_value()
                    && compare(V::from_raw(**a), V::from_raw(**b))
            })
            .map(|(row, _)| row)
            .collect())
    }

    pub fn is_before_column(&self, other: &Self) -> Result<Selection> {
        self.compare_column(other, |a, b| a < b)
    }

    pub fn is_after_column(&self, other: &Self) -> Result<Selection> {
        self.compare_column(other, |a, b| a > b)
    }

    pub fn is_equal_to_column(&self, other: &Self) -> Result<Selection> {
        self.compare_column(other, |a, b| a == b)
    }

    /// Apply an infallible operation to every present value.
    pub fn map_values(&self, op: impl Fn(V) -> V) -> Self {
        self.with_data(self.data.map(|raw| op(V::from_raw(raw)).raw()))
    }

    /// Apply a fallible operation to every present value, stopping at the
    /// first error.
    pub fn try_map_values(&self, op: impl Fn(V) -> Result<V>) -> Result<Self> {
        let mut data = Vec::with_capacity(self.size());
        for &raw in self.as_raw() {
            if raw.is_missing_value() {
                data.push(raw);
            } else {
                data.push(op(V::from_raw(raw))?.raw());
            }
        }
        Ok(self.with_data(PrimitiveStore::from_vec(data)))
    }

    /// Extract a numeric field from every present value.
    fn extract<U, F>(&self, name: &str, field: F) -> crate::column::NumberColumn<U>
    where
        U: NumericType,
        F: Fn(V) -> U,
    {
        let values = self
            .as_raw()
            .iter()
            .map(|&raw| {
                if raw.is_missing_value() {
                    U::MISSING
                } else {
                    field(V::from_raw(raw))
                }
            })
            .collect();
        crate::column::NumberColumn::from_raw(&format!("{} {}", self.name, name), values)
    }

    /// Row-wise difference in some unit; missing when either row is.
    fn difference<F>(&self, other: &Self, name: &str, until: F) -> Result<LongColumn>
    where
        F: Fn(V, V) -> Option<i64>,
    {
        let data = self.data.zip_map(&other.data, |a, b| {
            until(V::from_raw(a), V::from_raw(b)).unwrap_or(i64::MISSING)
        })?;
        Ok(LongColumn::from_raw(
            &format!("{} {} {}", self.name, name, other.name),
            data.into_vec(),
        ))
    }
}

impl<V: TemporalValue> fmt::Debug for PackedColumn<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedColumn")
            .field("name", &self.name)
            .field("type", &V::COLUMN_TYPE)
            .field("size", &self.data.len())
            .finish()
    }
}

impl<V: TemporalValue> Column for PackedColumn<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn column_type(&self) -> ColumnType {
        V::COLUMN_TYPE
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn is_missing(&self, row: usize) -> Result<bool> {
        self.data.is_missing(row)
    }

    fn count_missing(&self) -> usize {
        self.data.count_missing()
    }

    fn count_unique(&self) -> usize {
        self.data.count_unique()
    }

    fn append_missing(&mut self) {
        self.data.append_missing();
    }

    fn append_cell(&mut self, cell: &str, options: &ParseOptions) -> Result<()> {
        let value = V::parse_cell(cell, options)?;
        self.append_option(value);
        Ok(())
    }

    fn get_string(&self, row: usize) -> Result<String> {
        Ok(match self.get(row)? {
            Some(value) => value.to_string(),
            None => String::new(),
        })
    }

    fn as_bytes(&self, row: usize) -> Result<Bytes> {
        self.data.cell_bytes(row)
    }

    fn sort_ascending(&mut self) {
        self.data.sort_ascending();
    }

    fn sort_descending(&mut self) {
        self.data.sort_descending();
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn missing(&self) -> Selection {
        self.data.missing_rows()
    }

    fn not_missing(&self) -> Selection {
        self.data.present_rows()
    }

    fn set_missing(&mut self, selection: &Selection) -> Result<()> {
        self.data.set_missing(selection)
    }

    fn copy_column(&self) -> Box<dyn Column> {
        Box::new(self.copy())
    }

    fn empty_copy_column(&self) -> Box<dyn Column> {
        Box::new(self.empty_copy())
    }

    fn where_selected(&self, selection: &Selection) -> Result<Box<dyn Column>> {
        Ok(Box::new(self.filter(selection)?))
    }

    fn drop_where(&self, selection: &Selection) -> Box<dyn Column> {
        Box::new(self.with_data(self.data.drop_selected(selection)))
    }

    fn subset_column(&self, rows: &[usize]) -> Result<Box<dyn Column>> {
        Ok(Box::new(self.subset(rows)?))
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<()> {
        let other = same_type::<Self>(V::COLUMN_TYPE, other)?;
        self.data.extend_from_slice(other.as_raw());
        Ok(())
    }

    fn append_row_from(&mut self, other: &dyn Column, row: usize) -> Result<()> {
        let other = same_type::<Self>(V::COLUMN_TYPE, other)?;
        self.data.append(other.data.get(row)?);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<V: TemporalValue> TemporalColumn for PackedColumn<V> {
    type Value = V;

    fn get_packed(&self, row: usize) -> Result<V> {
        Ok(V::from_raw(self.data.get(row)?))
    }

    fn min_packed(&self) -> Option<V> {
        self.min()
    }

    fn max_packed(&self) -> Option<V> {
        self.max()
    }
}

impl<V: TemporalValue> SortableColumn for PackedColumn<V> {
    fn reorder(&mut self, rows: &[usize]) -> Result<()> {
        self.data = self.data.subset(rows)?;
        Ok(())
    }
}

impl PackedColumn<PackedDate> {
    /// Year of each date. An int column, since year `i16::MIN` is a valid
    /// date year but the short column's missing value.
    pub fn year(&self) -> IntColumn {
        self.extract("year", |d| d.year())
    }

    pub fn month_value(&self) -> ShortColumn {
        self.extract("month", |d| d.month() as i16)
    }

    pub fn day_of_month(&self) -> ShortColumn {
        self.extract("day of month", |d| d.day() as i16)
    }

    pub fn day_of_year(&self) -> ShortColumn {
        self.extract("day of year", |d| d.day_of_year() as i16)
    }

    /// ISO day of week, Monday = 1 through Sunday = 7.
    pub fn day_of_week(&self) -> ShortColumn {
        self.extract("day of week", |d| d.weekday().number_from_monday() as i16)
    }

    pub fn quarter(&self) -> ShortColumn {
        self.extract("quarter", |d| d.quarter() as i16)
    }

    /// ISO-8601 week of the year.
    pub fn iso_week(&self) -> ShortColumn {
        self.extract("week", |d| d.iso_week() as i16)
    }

    /// Days since 1970-01-01.
    pub fn to_epoch_day(&self) -> LongColumn {
        self.extract("epoch day", |d| d.to_epoch_day())
    }

    pub fn plus(&self, amount: i64, unit: TimeUnit) -> Result<Self> {
        self.try_map_values(|d| d.plus(amount, unit))
    }

    pub fn plus_days(&self, days: i64) -> Result<Self> {
        self.try_map_values(|d| d.plus_days(days))
    }

    pub fn plus_weeks(&self, weeks: i64) -> Result<Self> {
        self.try_map_values(|d| d.plus_weeks(weeks))
    }

    /// Add months, clamping to the end of shorter months.
    pub fn plus_months(&self, months: i64) -> Result<Self> {
        self.try_map_values(|d| d.plus_months(months))
    }

    pub fn plus_years(&self, years: i64) -> Result<Self> {
        self.try_map_values(|d| d.plus_years(years))
    }

    pub fn minus_days(&self, days: i64) -> Result<Self> {
        let days = days
            .checked_neg()
            .ok_or_else(|| Error::InvalidArgument(format!("cannot subtract {} days", days)))?;
        self.plus_days(days)
    }

    /// Days from each row of `self` to the same row of `end`.
    pub fn days_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "days until", PackedDate::days_until)
    }

    pub fn weeks_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "weeks until", PackedDate::weeks_until)
    }

    pub fn months_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "months until", PackedDate::months_until)
    }

    pub fn years_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "years until", PackedDate::years_until)
    }

    pub fn is_in_year(&self, year: i32) -> Selection {
        self.eval(|d| d.year() == year)
    }

    /// Rows in the given month, 1-12, of any year.
    pub fn is_in_month(&self, month: u32) -> Selection {
        self.eval(|d| d.month() == month)
    }

    pub fn is_in_quarter(&self, quarter: u32) -> Selection {
        self.eval(|d| d.quarter() == quarter)
    }

    pub fn is_on_day_of_week(&self, weekday: Weekday) -> Selection {
        self.eval(|d| d.weekday() == weekday)
    }

    pub fn is_weekday(&self) -> Selection {
        self.eval(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
    }

    pub fn is_weekend(&self) -> Selection {
        self.eval(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
    }

    pub fn is_first_day_of_month(&self) -> Selection {
        self.eval(PackedDate::is_first_day_of_month)
    }

    pub fn is_last_day_of_month(&self) -> Selection {
        self.eval(PackedDate::is_last_day_of_month)
    }

    pub fn is_in_leap_year(&self) -> Selection {
        self.eval(PackedDate::is_leap_year)
    }

    /// Combine each date with the time in the same row.
    pub fn at_time(&self, times: &TimeColumn) -> Result<DateTimeColumn> {
        let data = self.data.zip_map(&times.data, |d, t| {
            PackedDateTime::pack(PackedDate::from_raw(d), PackedTime::from_raw(t)).raw()
        })?;
        Ok(DateTimeColumn {
            name: format!("{} {}", self.name, times.name),
            data,
        })
    }

    /// Each date at midnight.
    pub fn at_start_of_day(&self) -> DateTimeColumn {
        DateTimeColumn {
            name: self.name.clone(),
            data: self
                .data
                .map(|d| PackedDateTime::pack(PackedDate::from_raw(d), PackedTime::MIDNIGHT).raw()),
        }
    }
}

impl PackedColumn<PackedTime> {
    pub fn hour(&self) -> ShortColumn {
        self.extract("hour", |t| t.hour() as i16)
    }

    pub fn minute(&self) -> ShortColumn {
        self.extract("minute", |t| t.minute() as i16)
    }

    pub fn second(&self) -> ShortColumn {
        self.extract("second", |t| t.second() as i16)
    }

    pub fn millisecond(&self) -> ShortColumn {
        self.extract("millisecond", |t| t.millisecond() as i16)
    }

    pub fn minute_of_day(&self) -> ShortColumn {
        self.extract("minute of day", |t| t.minute_of_day() as i16)
    }

    pub fn second_of_day(&self) -> IntColumn {
        self.extract("second of day", |t| t.second_of_day() as i32)
    }

    pub fn millisecond_of_day(&self) -> IntColumn {
        self.extract("millisecond of day", |t| t.millisecond_of_day() as i32)
    }

    /// Add hours, wrapping past midnight.
    pub fn plus_hours(&self, hours: i64) -> Self {
        self.map_values(|t| t.plus_hours(hours))
    }

    pub fn plus_minutes(&self, minutes: i64) -> Self {
        self.map_values(|t| t.plus_minutes(minutes))
    }

    pub fn plus_seconds(&self, seconds: i64) -> Self {
        self.map_values(|t| t.plus_seconds(seconds))
    }

    pub fn plus_millis(&self, millis: i64) -> Self {
        self.map_values(|t| t.plus_millis(millis))
    }

    /// Add an amount of a time-based unit.
    pub fn plus(&self, amount: i64, unit: TimeUnit) -> Result<Self> {
        self.try_map_values(|t| t.plus(amount, unit))
    }

    /// Truncate each time to a whole unit.
    pub fn truncated_to(&self, unit: TimeUnit) -> Result<Self> {
        self.try_map_values(|t| t.truncated_to(unit))
    }

    pub fn is_midnight(&self) -> Selection {
        self.eval(PackedTime::is_midnight)
    }

    pub fn is_noon(&self) -> Selection {
        self.eval(PackedTime::is_noon)
    }

    pub fn is_before_noon(&self) -> Selection {
        self.eval(PackedTime::is_am)
    }

    pub fn is_after_noon(&self) -> Selection {
        self.eval(PackedTime::is_pm)
    }

    pub fn minutes_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "minutes until", PackedTime::minutes_until)
    }

    pub fn seconds_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "seconds until", PackedTime::seconds_until)
    }
}

impl PackedColumn<PackedDateTime> {
    /// The date part of each row.
    pub fn date(&self) -> DateColumn {
        DateColumn {
            name: format!("{} date", self.name),
            data: self.data.map(|raw| PackedDateTime::from_raw(raw).date().raw()),
        }
    }

    /// The time part of each row.
    pub fn time(&self) -> TimeColumn {
        TimeColumn {
            name: format!("{} time", self.name),
            data: self.data.map(|raw| PackedDateTime::from_raw(raw).time().raw()),
        }
    }

    pub fn year(&self) -> IntColumn {
        self.extract("year", |dt| dt.date().year())
    }

    pub fn month_value(&self) -> ShortColumn {
        self.extract("month", |dt| dt.date().month() as i16)
    }

    pub fn day_of_month(&self) -> ShortColumn {
        self.extract("day of month", |dt| dt.date().day() as i16)
    }

    pub fn hour(&self) -> ShortColumn {
        self.extract("hour", |dt| dt.time().hour() as i16)
    }

    pub fn minute(&self) -> ShortColumn {
        self.extract("minute", |dt| dt.time().minute() as i16)
    }

    /// Milliseconds since the Unix epoch.
    pub fn to_epoch_millis(&self) -> LongColumn {
        self.extract("epoch millis", |dt| dt.to_epoch_millis().unwrap_or(i64::MISSING))
    }

    /// Read each local date-time as UTC.
    pub fn to_instant_column(&self) -> InstantColumn {
        self.derived(self.name.clone())
    }

    pub fn plus(&self, amount: i64, unit: TimeUnit) -> Result<Self> {
        self.try_map_values(|dt| dt.plus(amount, unit))
    }

    pub fn plus_days(&self, days: i64) -> Result<Self> {
        self.try_map_values(|dt| dt.plus_days(days))
    }

    pub fn plus_hours(&self, hours: i64) -> Result<Self> {
        self.try_map_values(|dt| dt.plus_hours(hours))
    }

    pub fn plus_minutes(&self, minutes: i64) -> Result<Self> {
        self.try_map_values(|dt| dt.plus_minutes(minutes))
    }

    pub fn days_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "days until", PackedDateTime::days_until)
    }

    pub fn hours_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "hours until", PackedDateTime::hours_until)
    }

    pub fn minutes_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "minutes until", PackedDateTime::minutes_until)
    }

    pub fn millis_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "millis until", PackedDateTime::millis_until)
    }

    /// Rows falling on `date`.
    pub fn is_on(&self, date: PackedDate) -> Selection {
        self.eval(|dt| dt.date() == date)
    }
}

impl PackedColumn<PackedInstant> {
    /// The UTC local date-time of each instant.
    pub fn to_datetime_column(&self) -> DateTimeColumn {
        self.derived(self.name.clone())
    }

    /// Milliseconds since the Unix epoch.
    pub fn to_epoch_millis(&self) -> LongColumn {
        self.extract("epoch millis", |i| i.to_epoch_millis().unwrap_or(i64::MISSING))
    }

    pub fn plus(&self, amount: i64, unit: TimeUnit) -> Result<Self> {
        self.try_map_values(|i| i.plus(amount, unit))
    }

    pub fn millis_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "millis until", PackedInstant::millis_until)
    }

    pub fn seconds_until(&self, end: &Self) -> Result<LongColumn> {
        self.difference(end, "seconds until", PackedInstant::seconds_until)
    }
}

impl PackedColumn<PackedDateRange> {
    /// First day of each range.
    pub fn from_dates(&self) -> DateColumn {
        DateColumn {
            name: format!("{} from", self.name),
            data: self.data.map(|raw| PackedDateRange::from_raw(raw).from().raw()),
        }
    }

    /// Last day of each range.
    pub fn to_dates(&self) -> DateColumn {
        DateColumn {
            name: format!("{} to", self.name),
            data: self.data.map(|raw| PackedDateRange::from_raw(raw).to().raw()),
        }
    }

    /// Days covered by each range, both ends included.
    pub fn length_in_days(&self) -> LongColumn {
        self.extract("length", |r| r.length_in_days().unwrap_or(i64::MISSING))
    }

    /// Rows whose range contains `date`.
    pub fn contains(&self, date: PackedDate) -> Selection {
        self.eval(|r| r.contains(date))
    }

    /// Rows whose range shares a day with `range`.
    pub fn overlaps(&self, range: PackedDateRange) -> Selection {
        self.eval(|r| r.overlaps(range))
    }

    /// Rows whose range contains the date in the same row of `dates`.
    pub fn contains_column(&self, dates: &DateColumn) -> Result<Selection> {
        if self.size() != dates.size() {
            return Err(Error::LengthMismatch {
                left: self.size(),
                right: dates.size(),
            });
        }
        Ok(self
            .as_raw()
            .iter()
            .zip(dates.as_raw())
            .enumerate()
            .filter(|(_, (r, d))| PackedDateRange::from_raw(**r).contains(PackedDate::from_raw(**d)))
            .map(|(row, _)| row)
            .collect())
    }
}

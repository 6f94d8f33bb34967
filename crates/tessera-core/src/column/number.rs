//! Numeric columns.

use std::any::Any;
use std::fmt;

use bytes::Bytes;

use super::{same_type, Column, ColumnType, NumericColumn, SortableColumn, StringColumn};
use crate::config::ParseOptions;
use crate::error::{Error, Result};
use crate::missing::MissingValue;
use crate::parse::parse_number;
use crate::selection::Selection;
use crate::store::{NumericType, Primitive, PrimitiveStore};

/// A column of one numeric width.
///
/// Missing rows hold the width's sentinel. Arithmetic propagates missing:
/// combining a missing row with anything yields a missing row. Integer
/// arithmetic wraps at the column width.
#[derive(Clone, PartialEq)]
pub struct NumberColumn<T> {
    name: String,
    data: PrimitiveStore<T>,
}

pub type ByteColumn = NumberColumn<i8>;
pub type ShortColumn = NumberColumn<i16>;
pub type IntColumn = NumberColumn<i32>;
pub type LongColumn = NumberColumn<i64>;
pub type FloatColumn = NumberColumn<f32>;
pub type DoubleColumn = NumberColumn<f64>;

/// Apply a binary operation at the column width.
///
/// Floats compute in `f64` and round once; integers compute in wrapping
/// `i64` and narrow by truncation.
#[inline]
fn arith<T: NumericType>(
    a: T,
    b: T,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> T {
    if T::IS_FLOAT {
        T::from_f64_lossy(float_op(a.to_f64(), b.to_f64()))
    } else {
        T::from_i64_wrapping(int_op(a.to_i64(), b.to_i64()))
    }
}

impl<T: NumericType> NumberColumn<T> {
    /// Create an empty column.
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

    /// Create a column over raw values. Sentinel values read as missing.
    pub fn from_raw(name: &str, values: Vec<T>) -> Self {
        Self {
            name: name.to_string(),
            data: PrimitiveStore::from_vec(values),
        }
    }

    /// Create a column by copying raw values.
    pub fn create(name: &str, values: &[T]) -> Self {
        Self::from_raw(name, values.to_vec())
    }

    /// Create a column from optional values.
    pub fn from_options<I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
    {
        Self {
            name: name.to_string(),
            data: values.into_iter().map(|v| v.unwrap_or(T::MISSING)).collect(),
        }
    }

    fn with_data(&self, data: PrimitiveStore<T>) -> Self {
        Self {
            name: self.name.clone(),
            data,
        }
    }

    /// Backing store.
    pub fn data(&self) -> &PrimitiveStore<T> {
        &self.data
    }

    /// Raw values, sentinels included.
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// The value at `row`, or `None` when missing.
    pub fn get(&self, row: usize) -> Result<Option<T>> {
        let value = self.data.get(row)?;
        Ok(if value.is_missing_value() {
            None
        } else {
            Some(value)
        })
    }

    /// The raw value at `row`, sentinel included.
    pub fn get_raw(&self, row: usize) -> Result<T> {
        self.data.get(row)
    }

    pub fn set(&mut self, row: usize, value: T) -> Result<()> {
        self.data.set(row, value)
    }

    pub fn set_missing_at(&mut self, row: usize) -> Result<()> {
        self.data.set(row, T::MISSING)
    }

    /// Overwrite every selected row with `value`.
    pub fn set_selected(&mut self, selection: &Selection, value: T) -> Result<()> {
        self.data.set_selected(selection, value)
    }

    pub fn append(&mut self, value: T) -> &mut Self {
        self.data.append(value);
        self
    }

    pub fn append_option(&mut self, value: Option<T>) -> &mut Self {
        self.data.append(value.unwrap_or(T::MISSING));
        self
    }

    /// Parse `cell` without appending it.
    pub fn parse(&self, cell: &str, options: &ParseOptions) -> Result<Option<T>> {
        parse_number::<T>(cell, options)
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn empty_copy(&self) -> Self {
        Self::new(&self.name)
    }

    /// The selected rows, in row order.
    pub fn filter(&self, selection: &Selection) -> Result<Self> {
        Ok(self.with_data(self.data.filter(selection)?))
    }

    /// The given rows, in the order given.
    pub fn subset(&self, rows: &[usize]) -> Result<Self> {
        Ok(self.with_data(self.data.subset(rows)?))
    }

    /// The first `n` rows.
    pub fn first(&self, n: usize) -> Self {
        let n = n.min(self.size());
        self.with_data(PrimitiveStore::from_vec(self.as_slice()[..n].to_vec()))
    }

    /// The last `n` rows.
    pub fn last(&self, n: usize) -> Self {
        let n = n.min(self.size());
        let start = self.size() - n;
        self.with_data(PrimitiveStore::from_vec(self.as_slice()[start..].to_vec()))
    }

    /// Values shifted `n` rows later; see [`PrimitiveStore::lag`].
    pub fn lag(&self, n: isize) -> Self {
        let mut column = self.with_data(self.data.lag(n));
        column.name = format!("{} lag({})", self.name, n);
        column
    }

    /// Values shifted `n` rows earlier.
    pub fn lead(&self, n: isize) -> Self {
        let mut column = self.with_data(self.data.lead(n));
        column.name = format!("{} lead({})", self.name, n);
        column
    }

    /// The `n` largest values, largest first.
    pub fn top(&self, n: usize) -> Self {
        self.with_data(self.data.top(n))
    }

    /// The `n` smallest values, smallest first.
    pub fn bottom(&self, n: usize) -> Self {
        self.with_data(self.data.bottom(n))
    }

    /// Distinct non-missing values in first-seen order.
    pub fn unique(&self) -> Self {
        self.with_data(self.data.unique())
    }

    pub fn remove_missing(&self) -> Self {
        self.with_data(self.data.remove_missing())
    }

    /// Replace every missing row with `value`.
    pub fn fill_missing(&mut self, value: T) -> &mut Self {
        self.data.fill_missing(value);
        self
    }

    pub fn min(&self) -> Option<T> {
        self.data.min()
    }

    pub fn max(&self) -> Option<T> {
        self.data.max()
    }

    pub fn contains(&self, value: T) -> bool {
        self.data.contains(value)
    }

    /// Rows whose value satisfies `predicate`. Missing rows never match.
    pub fn eval<F: Fn(T) -> bool>(&self, predicate: F) -> Selection {
        self.data.eval(predicate)
    }

    pub fn is_equal_to(&self, value: T) -> Selection {
        self.eval(|v| v == value)
    }

    pub fn is_not_equal_to(&self, value: T) -> Selection {
        self.eval(|v| v != value)
    }

    pub fn is_greater_than(&self, value: T) -> Selection {
        self.eval(|v| v > value)
    }

    pub fn is_greater_than_or_equal_to(&self, value: T) -> Selection {
        self.eval(|v| v >= value)
    }

    pub fn is_less_than(&self, value: T) -> Selection {
        self.eval(|v| v < value)
    }

    pub fn is_less_than_or_equal_to(&self, value: T) -> Selection {
        self.eval(|v| v <= value)
    }

    /// Rows in `[low, high]`.
    pub fn is_between_inclusive(&self, low: T, high: T) -> Selection {
        self.eval(|v| v >= low && v <= high)
    }

    /// Rows in `(low, high)`.
    pub fn is_between_exclusive(&self, low: T, high: T) -> Selection {
        self.eval(|v| v > low && v < high)
    }

    pub fn is_in(&self, values: &[T]) -> Selection {
        self.eval(|v| values.contains(&v))
    }

    /// Present rows whose value is not in `values`.
    pub fn is_not_in(&self, values: &[T]) -> Selection {
        self.eval(|v| !values.contains(&v))
    }

    pub fn is_zero(&self) -> Selection {
        self.eval(|v| v.to_f64() == 0.0)
    }

    pub fn is_positive(&self) -> Selection {
        self.eval(|v| v.to_f64() > 0.0)
    }

    pub fn is_negative(&self) -> Selection {
        self.eval(|v| v.to_f64() < 0.0)
    }

    pub fn is_non_negative(&self) -> Selection {
        self.eval(|v| v.to_f64() >= 0.0)
    }

    /// Rows where both columns are present and `compare(self, other)` holds.
    pub fn compare_column<F>(&self, other: &Self, compare: F) -> Result<Selection>
    where
        F: Fn(T, T) -> bool,
    {
        self.check_length(other)?;
        Ok(self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .enumerate()
            .filter(|(_, (a, b))| !a.is_missing_value() && !b.is_missing_value() && compare(**a, **b))
            .map(|(row, _)| row)
            .collect())
    }

    pub fn is_equal_to_column(&self, other: &Self) -> Result<Selection> {
        self.compare_column(other, |a, b| a == b)
    }

    pub fn is_greater_than_column(&self, other: &Self) -> Result<Selection> {
        self.compare_column(other, |a, b| a > b)
    }

    pub fn is_less_than_column(&self, other: &Self) -> Result<Selection> {
        self.compare_column(other, |a, b| a < b)
    }

    fn check_length(&self, other: &Self) -> Result<()> {
        if self.size() != other.size() {
            return Err(Error::LengthMismatch {
                left: self.size(),
                right: other.size(),
            });
        }
        Ok(())
    }

    /// Convert to another width.
    ///
    /// Widening keeps the value (integers past 2^53 round when widened to
    /// floating point). Narrowing discards high-order bits and may flip the
    /// sign. Missing stays missing.
    pub fn to_column<U: NumericType>(&self) -> NumberColumn<U> {
        NumberColumn {
            name: self.name.clone(),
            data: self.data.cast::<U>(),
        }
    }

    pub fn to_byte_column(&self) -> ByteColumn {
        self.to_column()
    }

    pub fn to_short_column(&self) -> ShortColumn {
        self.to_column()
    }

    pub fn to_int_column(&self) -> IntColumn {
        self.to_column()
    }

    pub fn to_long_column(&self) -> LongColumn {
        self.to_column()
    }

    pub fn to_float_column(&self) -> FloatColumn {
        self.to_column()
    }

    pub fn to_double_column(&self) -> DoubleColumn {
        self.to_column()
    }

    /// Text form of each value as a string column.
    pub fn to_string_column(&self) -> Result<StringColumn> {
        let mut column = StringColumn::new(&self.name);
        for value in self.as_slice() {
            if value.is_missing_value() {
                column.append_missing();
            } else {
                column.append(&format_value(*value))?;
            }
        }
        Ok(column)
    }

    fn zip_with(&self, other: &Self, name: String, op: impl Fn(T, T) -> T) -> Result<Self> {
        let data = self.data.zip_map(&other.data, op)?;
        Ok(Self { name, data })
    }

    fn map_with(&self, name: String, op: impl Fn(T) -> T) -> Self {
        Self {
            name,
            data: self.data.map(op),
        }
    }

    /// Row-wise sum.
    pub fn add(&self, other: &Self) -> Result<Self> {
        let name = format!("{} + {}", self.name, other.name);
        self.zip_with(other, name, |a, b| arith(a, b, i64::wrapping_add, |x, y| x + y))
    }

    /// Row-wise difference.
    pub fn subtract(&self, other: &Self) -> Result<Self> {
        let name = format!("{} - {}", self.name, other.name);
        self.zip_with(other, name, |a, b| arith(a, b, i64::wrapping_sub, |x, y| x - y))
    }

    /// Row-wise product.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        let name = format!("{} * {}", self.name, other.name);
        self.zip_with(other, name, |a, b| arith(a, b, i64::wrapping_mul, |x, y| x * y))
    }

    /// Row-wise quotient as doubles. Division by zero follows IEEE rules.
    pub fn divide(&self, other: &Self) -> Result<DoubleColumn> {
        let data = self
            .data
            .zip_map(&other.data, |a, b| a.to_f64() / b.to_f64())?;
        Ok(NumberColumn {
            name: format!("{} / {}", self.name, other.name),
            data,
        })
    }

    /// Row-wise remainder. An integer remainder by zero is missing.
    pub fn remainder(&self, other: &Self) -> Result<Self> {
        let name = format!("{} % {}", self.name, other.name);
        self.zip_with(other, name, remainder)
    }

    pub fn add_value(&self, value: T) -> Self {
        let name = format!("{} + {:?}", self.name, value);
        self.map_with(name, |a| {
            if value.is_missing_value() {
                T::MISSING
            } else {
                arith(a, value, i64::wrapping_add, |x, y| x + y)
            }
        })
    }

    pub fn subtract_value(&self, value: T) -> Self {
        let name = format!("{} - {:?}", self.name, value);
        self.map_with(name, |a| {
            if value.is_missing_value() {
                T::MISSING
            } else {
                arith(a, value, i64::wrapping_sub, |x, y| x - y)
            }
        })
    }

    pub fn multiply_value(&self, value: T) -> Self {
        let name = format!("{} * {:?}", self.name, value);
        self.map_with(name, |a| {
            if value.is_missing_value() {
                T::MISSING
            } else {
                arith(a, value, i64::wrapping_mul, |x, y| x * y)
            }
        })
    }

    pub fn divide_value(&self, value: f64) -> DoubleColumn {
        NumberColumn {
            name: format!("{} / {}", self.name, value),
            data: self.data.map(|a| a.to_f64() / value),
        }
    }

    pub fn remainder_value(&self, value: T) -> Self {
        let name = format!("{} % {:?}", self.name, value);
        self.map_with(name, |a| {
            if value.is_missing_value() {
                T::MISSING
            } else {
                remainder(a, value)
            }
        })
    }

    /// Absolute values. The most negative integer wraps to itself.
    pub fn abs(&self) -> Self {
        let name = format!("abs({})", self.name);
        self.map_with(name, |a| {
            if T::IS_FLOAT {
                T::from_f64_lossy(a.to_f64().abs())
            } else {
                T::from_i64_wrapping(a.to_i64().wrapping_abs())
            }
        })
    }

    pub fn neg(&self) -> Self {
        let name = format!("-{}", self.name);
        self.map_with(name, |a| {
            if T::IS_FLOAT {
                T::from_f64_lossy(-a.to_f64())
            } else {
                T::from_i64_wrapping(a.to_i64().wrapping_neg())
            }
        })
    }

    /// Round half away from zero. Integers are unchanged.
    pub fn round(&self) -> Self {
        let name = format!("round({})", self.name);
        self.map_with(name, |a| {
            if T::IS_FLOAT {
                T::from_f64_lossy(a.to_f64().round())
            } else {
                a
            }
        })
    }

    /// Apply `op` to every present value.
    pub fn map(&self, op: impl Fn(T) -> T) -> Self {
        self.map_with(self.name.clone(), op)
    }

    /// Each row minus the previous row; the first row is missing.
    pub fn difference(&self) -> Self {
        let lagged = self.data.lag(1);
        let data = self
            .data
            .zip_map(&lagged, |a, b| arith(a, b, i64::wrapping_sub, |x, y| x - y))
            .unwrap_or_else(|_| PrimitiveStore::missing(self.size()));
        Self {
            name: format!("{} difference", self.name),
            data,
        }
    }

    /// Running total. Missing rows stay missing and do not reset the total.
    pub fn cumulative_sum(&self) -> Self {
        let mut total: Option<T> = None;
        let data = self
            .as_slice()
            .iter()
            .map(|&v| {
                if v.is_missing_value() {
                    return T::MISSING;
                }
                let next = match total {
                    Some(t) => arith(t, v, i64::wrapping_add, |x, y| x + y),
                    None => v,
                };
                total = Some(next);
                next
            })
            .collect();
        Self {
            name: format!("{} cumulative sum", self.name),
            data,
        }
    }

    /// Running product. Missing rows stay missing and do not reset the product.
    pub fn cumulative_product(&self) -> Self {
        let mut total: Option<T> = None;
        let data = self
            .as_slice()
            .iter()
            .map(|&v| {
                if v.is_missing_value() {
                    return T::MISSING;
                }
                let next = match total {
                    Some(t) => arith(t, v, i64::wrapping_mul, |x, y| x * y),
                    None => v,
                };
                total = Some(next);
                next
            })
            .collect();
        Self {
            name: format!("{} cumulative product", self.name),
            data,
        }
    }

    /// Apply `op` to every present value as a double. Results that come out
    /// NaN read as missing.
    fn map_double(&self, name: String, op: impl Fn(f64) -> f64) -> DoubleColumn {
        NumberColumn {
            name,
            data: self.data.map(|a| op(a.to_f64())),
        }
    }

    pub fn power(&self, exponent: f64) -> DoubleColumn {
        self.map_double(format!("{}[pow]", self.name), |a| a.powf(exponent))
    }

    pub fn square(&self) -> DoubleColumn {
        self.map_double(format!("{}[sq]", self.name), |a| a * a)
    }

    pub fn cube(&self) -> DoubleColumn {
        self.map_double(format!("{}[cb]", self.name), |a| a * a * a)
    }

    /// Square roots. Negative values give missing.
    pub fn sqrt(&self) -> DoubleColumn {
        self.map_double(format!("{}[sqrt]", self.name), f64::sqrt)
    }

    pub fn cube_root(&self) -> DoubleColumn {
        self.map_double(format!("{}[cbrt]", self.name), f64::cbrt)
    }

    pub fn exp(&self) -> DoubleColumn {
        self.map_double(format!("{}[exp]", self.name), f64::exp)
    }

    /// Natural logarithms. Zero gives negative infinity; negative values
    /// give missing.
    pub fn log_n(&self) -> DoubleColumn {
        self.map_double(format!("{}[logN]", self.name), f64::ln)
    }

    pub fn log10(&self) -> DoubleColumn {
        self.map_double(format!("{}[log10]", self.name), f64::log10)
    }

    /// `ln(1 + x)`, accurate near zero.
    pub fn log1p(&self) -> DoubleColumn {
        self.map_double(format!("{}[log1p]", self.name), f64::ln_1p)
    }

    /// Each value divided by the sum of present values.
    pub fn as_ratio(&self) -> DoubleColumn {
        let total = self.sum();
        self.map_double(format!("{} ratio", self.name), |a| a / total)
    }

    /// Each value as a percentage of the sum of present values.
    pub fn as_percent(&self) -> DoubleColumn {
        let total = self.sum();
        self.map_double(format!("{} percents", self.name), |a| a / total * 100.0)
    }

    /// Fractional change from the previous row; the first row is missing.
    pub fn pct_change(&self) -> DoubleColumn {
        let previous = self.data.lag(1);
        let data = self
            .data
            .zip_map(&previous, |a, b| (a.to_f64() - b.to_f64()) / b.to_f64())
            .unwrap_or_else(|_| PrimitiveStore::missing(self.size()));
        NumberColumn {
            name: format!("{} percent change", self.name),
            data,
        }
    }

    /// Sum of present values as a double.
    pub fn sum(&self) -> f64 {
        self.as_slice()
            .iter()
            .filter(|v| !v.is_missing_value())
            .map(|v| v.to_f64())
            .sum()
    }
}

fn remainder<T: NumericType>(a: T, b: T) -> T {
    if T::IS_FLOAT {
        T::from_f64_lossy(a.to_f64() % b.to_f64())
    } else if b.to_i64() == 0 {
        T::MISSING
    } else {
        T::from_i64_wrapping(a.to_i64().wrapping_rem(b.to_i64()))
    }
}

fn format_value<T: NumericType>(value: T) -> String {
    if T::IS_FLOAT {
        format!("{}", value.to_f64())
    } else {
        format!("{}", value.to_i64())
    }
}

impl<T: NumericType> fmt::Debug for NumberColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberColumn")
            .field("name", &self.name)
            .field("type", &T::COLUMN_TYPE)
            .field("size", &self.size())
            .finish()
    }
}

impl<T: NumericType> Column for NumberColumn<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn column_type(&self) -> ColumnType {
        T::COLUMN_TYPE
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
        let value = parse_number::<T>(cell, options)?;
        self.append_option(value);
        Ok(())
    }

    fn get_string(&self, row: usize) -> Result<String> {
        let value = self.data.get(row)?;
        if value.is_missing_value() {
            Ok(String::new())
        } else {
            Ok(format_value(value))
        }
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
        let other = same_type::<Self>(T::COLUMN_TYPE, other)?;
        self.data.extend_from_slice(other.as_slice());
        Ok(())
    }

    fn append_row_from(&mut self, other: &dyn Column, row: usize) -> Result<()> {
        let other = same_type::<Self>(T::COLUMN_TYPE, other)?;
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

impl<T: NumericType> NumericColumn for NumberColumn<T> {
    fn get_double(&self, row: usize) -> Result<f64> {
        Ok(self.data.get(row)?.to_f64())
    }

    fn as_double_array(&self) -> Vec<f64> {
        self.data.to_f64_vec()
    }

    fn min_f64(&self) -> Option<f64> {
        self.min().map(|v| v.to_f64())
    }

    fn max_f64(&self) -> Option<f64> {
        self.max().map(|v| v.to_f64())
    }
}

impl<T: NumericType> SortableColumn for NumberColumn<T> {
    fn reorder(&mut self, rows: &[usize]) -> Result<()> {
        self.data = self.data.subset(rows)?;
        Ok(())
    }
}

impl<T: NumericType> FromIterator<T> for NumberColumn<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            name: String::new(),
            data: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: i32 = i32::MIN;

    fn ints(values: &[i32]) -> IntColumn {
        IntColumn::create("n", values)
    }

    #[test]
    fn test_missing_counts_and_sort_order() {
        let mut column = IntColumn::new("n");
        column.append(1).append(2).append_option(None).append(4);
        assert_eq!(column.count_missing(), 1);
        assert_eq!(column.get(2).unwrap(), None);

        column.sort_ascending();
        assert_eq!(column.as_slice(), &[M, 1, 2, 4]);
        column.sort_descending();
        assert_eq!(column.as_slice(), &[4, 2, 1, M]);
    }

    #[test]
    fn test_double_sort_places_nan_first() {
        let mut column = DoubleColumn::create("d", &[3.0, f64::NAN, -1.0]);
        column.sort_ascending();
        assert!(column.get(0).unwrap().is_none());
        assert_eq!(column.get(1).unwrap(), Some(-1.0));
        column.sort_descending();
        assert!(column.is_missing(2).unwrap());
    }

    #[test]
    fn test_append_cell_reports_out_of_range() {
        let options = ParseOptions::default();
        let mut column = ShortColumn::new("s");
        column.append_cell("12", &options).unwrap();
        column.append_cell("NA", &options).unwrap();
        let err = column.append_cell("70000", &options).unwrap_err();
        assert!(err.is_out_of_range());
        assert_eq!(column.size(), 2);

        // Widening is the caller's decision.
        let mut widened = column.to_int_column();
        widened.append_cell("70000", &options).unwrap();
        assert_eq!(widened.get(2).unwrap(), Some(70_000));
        assert_eq!(widened.count_missing(), 1);
    }

    #[test]
    fn test_malformed_cell_is_not_missing() {
        let mut column = IntColumn::new("n");
        let err = column
            .append_cell("twelve", &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedLiteral { .. }));
        assert!(column.is_empty());
    }

    #[test]
    fn test_lag_lead() {
        let column = ints(&[10, 20, 30, 40, 50]);
        assert_eq!(column.lag(2).as_slice(), &[M, M, 10, 20, 30]);
        assert_eq!(column.lead(2).as_slice(), &[30, 40, 50, M, M]);
        assert_eq!(column.lag(2).name(), "n lag(2)");
    }

    #[test]
    fn test_predicates_skip_missing() {
        let column = ints(&[5, M, 10, 15, -3]);
        assert_eq!(column.is_greater_than(4).to_vec(), vec![0, 2, 3]);
        assert_eq!(column.is_between_inclusive(5, 10).to_vec(), vec![0, 2]);
        assert_eq!(column.is_in(&[10, -3]).to_vec(), vec![2, 4]);
        assert_eq!(column.is_not_in(&[10, -3]).to_vec(), vec![0, 3]);
        assert_eq!(column.is_negative().to_vec(), vec![4]);
        assert_eq!(column.missing().to_vec(), vec![1]);
        assert_eq!(column.not_missing().len(), 4);
    }

    #[test]
    fn test_where_preserves_order() {
        let column = ints(&[1, 2, 3, 4, 5]);
        let evens = &column.is_greater_than(1) & &column.eval(|v| v % 2 == 0);
        let selected = column.filter(&evens).unwrap();
        assert_eq!(selected.as_slice(), &[2, 4]);
        let dropped = column.drop_where(&evens);
        assert_eq!(dropped.size(), 3);
        assert_eq!(dropped.get_string(2).unwrap(), "5");
    }

    #[test]
    fn test_arithmetic_propagates_missing() {
        let a = ints(&[1, M, 3, 7]);
        let b = ints(&[10, 20, M, 2]);
        assert_eq!(a.add(&b).unwrap().as_slice(), &[11, M, M, 9]);
        assert_eq!(a.multiply(&b).unwrap().as_slice(), &[10, M, M, 14]);
        assert_eq!(a.remainder(&b).unwrap().as_slice(), &[1, M, M, 1]);

        let quotient = a.divide(&b).unwrap();
        assert_eq!(quotient.get(0).unwrap(), Some(0.1));
        assert_eq!(quotient.get(1).unwrap(), None);
        assert_eq!(quotient.get(3).unwrap(), Some(3.5));

        assert!(a.add(&ints(&[1])).is_err());
    }

    #[test]
    fn test_scalar_arithmetic() {
        let column = ints(&[1, M, -4]);
        assert_eq!(column.add_value(2).as_slice(), &[3, M, -2]);
        assert_eq!(column.multiply_value(3).as_slice(), &[3, M, -12]);
        assert_eq!(column.abs().as_slice(), &[1, M, 4]);
        assert_eq!(column.neg().as_slice(), &[-1, M, 4]);
        assert_eq!(column.remainder_value(0).as_slice(), &[M, M, M]);
        assert_eq!(column.divide_value(2.0).get(2).unwrap(), Some(-2.0));
    }

    #[test]
    fn test_running_operations() {
        let column = ints(&[1, 3, M, 10]);
        assert_eq!(column.difference().as_slice(), &[M, 2, M, M]);
        assert_eq!(column.cumulative_sum().as_slice(), &[1, 4, M, 14]);
        let pct = column.pct_change();
        assert_eq!(pct.get(1).unwrap(), Some(2.0));
        assert_eq!(pct.get(0).unwrap(), None);
    }

    #[test]
    fn test_round() {
        let column = DoubleColumn::create("d", &[1.4, 2.5, -2.5, f64::NAN]);
        let rounded = column.round();
        assert_eq!(&rounded.as_slice()[..3], &[1.0, 3.0, -3.0]);
        assert!(rounded.is_missing(3).unwrap());
    }

    #[test]
    fn test_math_maps_propagate_missing() {
        let column = ints(&[4, M, -9, 0]);
        let root = column.sqrt();
        assert_eq!(root.get(0).unwrap(), Some(2.0));
        assert_eq!(root.get(1).unwrap(), None);
        assert_eq!(root.get(2).unwrap(), None);

        assert_eq!(column.cube_root().get(0).unwrap().map(|v| (v * v * v).round()), Some(4.0));
        assert_eq!(column.cube_root().get(2).unwrap().map(f64::round), Some(-2.0));
        assert_eq!(column.square().get(0).unwrap(), Some(16.0));
        assert_eq!(column.cube().get(2).unwrap(), Some(-729.0));
        assert_eq!(column.power(3.0).get(0).unwrap(), Some(64.0));
        assert!(column.power(2.0).is_missing(1).unwrap());

        let logs = column.log_n();
        assert_eq!(logs.get(3).unwrap(), Some(f64::NEG_INFINITY));
        assert_eq!(logs.get(2).unwrap(), None);
        assert_eq!(DoubleColumn::create("d", &[100.0]).log10().get(0).unwrap(), Some(2.0));
        assert_eq!(column.log1p().get(3).unwrap(), Some(0.0));
        assert_eq!(column.exp().get(3).unwrap(), Some(1.0));
        assert_eq!(column.exp().count_missing(), 1);
    }

    #[test]
    fn test_cumulative_product_and_ratios() {
        let column = ints(&[2, 3, M, 4]);
        assert_eq!(column.cumulative_product().as_slice(), &[2, 6, M, 24]);

        let ratio = column.as_ratio();
        assert_eq!(ratio.get(0).unwrap(), Some(2.0 / 9.0));
        assert_eq!(ratio.get(2).unwrap(), None);
        assert_eq!(column.as_percent().get(3).unwrap(), Some(4.0 / 9.0 * 100.0));
    }

    #[test]
    fn test_conversions() {
        let column = LongColumn::create("l", &[1, i64::MIN, 300, 1 << 40]);
        let narrow = column.to_byte_column();
        assert_eq!(narrow.get(0).unwrap(), Some(1));
        assert_eq!(narrow.get(1).unwrap(), None);
        assert_eq!(narrow.get(2).unwrap(), Some(300i64 as i8));

        let wide = IntColumn::create("i", &[7, M]).to_double_column();
        assert_eq!(wide.as_double_array()[0], 7.0);
        assert!(wide.as_double_array()[1].is_nan());

        let text = ints(&[7, M]).to_string_column().unwrap();
        assert_eq!(text.get(0).unwrap().as_deref(), Some("7"));
        assert_eq!(text.count_missing(), 1);
    }

    #[test]
    fn test_numeric_column_view() {
        let column = FloatColumn::create("f", &[2.5, f32::NAN, -1.0]);
        assert_eq!(column.min_f64(), Some(-1.0));
        assert_eq!(column.max_f64(), Some(2.5));
        assert!(column.get_double(1).unwrap().is_nan());
        assert_eq!(column.sum(), 1.5);
    }

    #[test]
    fn test_top_bottom_unique() {
        let column = ints(&[4, 1, M, 4, 9]);
        assert_eq!(column.top(2).as_slice(), &[9, 4]);
        assert_eq!(column.bottom(2).as_slice(), &[1, 4]);
        assert_eq!(column.unique().as_slice(), &[4, 1, 9]);
        assert_eq!(column.count_unique(), 3);
    }

    #[test]
    fn test_fill_missing() {
        let mut column = ints(&[M, 2, M]);
        column.fill_missing(0);
        assert_eq!(column.as_slice(), &[0, 2, 0]);
    }

    #[test]
    fn test_sort_with_row_comparator() {
        let mut column = ints(&[3, 1, 2]);
        let keys = [2, 0, 1];
        column.sort_with(&|a: usize, b: usize| keys[a].cmp(&keys[b])).unwrap();
        assert_eq!(column.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_column_comparisons() {
        let a = ints(&[1, 5, M]);
        let b = ints(&[2, 5, 1]);
        assert_eq!(a.is_less_than_column(&b).unwrap().to_vec(), vec![0]);
        assert_eq!(a.is_equal_to_column(&b).unwrap().to_vec(), vec![1]);
        assert!(a.is_greater_than_column(&ints(&[1])).is_err());
    }

    #[test]
    fn test_append_column_same_type() {
        let mut a = ints(&[1]);
        let b = ints(&[2, 3]);
        a.append_column(&b).unwrap();
        a.append_row_from(&b, 0).unwrap();
        assert_eq!(a.as_slice(), &[1, 2, 3, 2]);
        assert!(a.append_row_from(&b, 5).is_err());
    }
}

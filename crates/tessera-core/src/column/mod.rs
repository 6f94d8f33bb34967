//! Typed columns.
//!
//! Every column implements the object-safe [`Column`] trait, which is all a
//! table container needs: size, missing bookkeeping, text ingestion,
//! fixed-width cell bytes, sorting and selection-based filtering. Behaviour
//! that only some types have lives in the capability traits
//! [`NumericColumn`], [`TemporalColumn`], [`DictionaryBacked`] and
//! [`SortableColumn`].
//!
//! Columns are single-writer. Reads from many threads are fine while no
//! thread mutates the column.

mod boolean;
mod number;
mod string;
mod temporal;

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::ParseOptions;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::selection::Selection;

pub use boolean::BooleanColumn;
pub use number::{
    ByteColumn, DoubleColumn, FloatColumn, IntColumn, LongColumn, NumberColumn, ShortColumn,
};
pub use string::StringColumn;
pub use temporal::{
    DateColumn, DateRangeColumn, DateTimeColumn, InstantColumn, PackedColumn, TemporalValue,
    TimeColumn,
};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    String,
    LocalDate,
    LocalTime,
    LocalDateTime,
    Instant,
    DateRange,
}

impl ColumnType {
    /// Every column type.
    pub const ALL: [ColumnType; 13] = [
        ColumnType::Boolean,
        ColumnType::Byte,
        ColumnType::Short,
        ColumnType::Integer,
        ColumnType::Long,
        ColumnType::Float,
        ColumnType::Double,
        ColumnType::String,
        ColumnType::LocalDate,
        ColumnType::LocalTime,
        ColumnType::LocalDateTime,
        ColumnType::Instant,
        ColumnType::DateRange,
    ];

    /// Width of one serialized cell in bytes.
    ///
    /// String cells serialize as their 4-byte dictionary key.
    pub const fn byte_size(self) -> usize {
        match self {
            ColumnType::Boolean | ColumnType::Byte => 1,
            ColumnType::Short => 2,
            ColumnType::Integer
            | ColumnType::Float
            | ColumnType::String
            | ColumnType::LocalDate
            | ColumnType::LocalTime => 4,
            ColumnType::Long
            | ColumnType::Double
            | ColumnType::LocalDateTime
            | ColumnType::Instant
            | ColumnType::DateRange => 8,
        }
    }

    /// Upper-case type name.
    pub const fn name(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Byte => "BYTE",
            ColumnType::Short => "SHORT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Long => "LONG",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::String => "STRING",
            ColumnType::LocalDate => "LOCAL_DATE",
            ColumnType::LocalTime => "LOCAL_TIME",
            ColumnType::LocalDateTime => "LOCAL_DATE_TIME",
            ColumnType::Instant => "INSTANT",
            ColumnType::DateRange => "DATE_RANGE",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Byte
                | ColumnType::Short
                | ColumnType::Integer
                | ColumnType::Long
                | ColumnType::Float
                | ColumnType::Double
        )
    }

    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            ColumnType::LocalDate
                | ColumnType::LocalTime
                | ColumnType::LocalDateTime
                | ColumnType::Instant
                | ColumnType::DateRange
        )
    }

    /// Create an empty column of this type.
    pub fn create_column(self, name: &str) -> Box<dyn Column> {
        match self {
            ColumnType::Boolean => Box::new(BooleanColumn::new(name)),
            ColumnType::Byte => Box::new(ByteColumn::new(name)),
            ColumnType::Short => Box::new(ShortColumn::new(name)),
            ColumnType::Integer => Box::new(IntColumn::new(name)),
            ColumnType::Long => Box::new(LongColumn::new(name)),
            ColumnType::Float => Box::new(FloatColumn::new(name)),
            ColumnType::Double => Box::new(DoubleColumn::new(name)),
            ColumnType::String => Box::new(StringColumn::new(name)),
            ColumnType::LocalDate => Box::new(DateColumn::new(name)),
            ColumnType::LocalTime => Box::new(TimeColumn::new(name)),
            ColumnType::LocalDateTime => Box::new(DateTimeColumn::new(name)),
            ColumnType::Instant => Box::new(InstantColumn::new(name)),
            ColumnType::DateRange => Box::new(DateRangeColumn::new(name)),
        }
    }

    /// Create a column of this type holding `rows` missing values.
    pub fn create_column_with_size(self, name: &str, rows: usize) -> Box<dyn Column> {
        let mut column = self.create_column(name);
        for _ in 0..rows {
            column.append_missing();
        }
        column
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The contract every column type honours.
pub trait Column: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: &str);

    fn column_type(&self) -> ColumnType;

    /// Number of rows.
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns true if the raw value at `row` is the type's sentinel.
    fn is_missing(&self, row: usize) -> Result<bool>;

    fn count_missing(&self) -> usize;

    /// Number of distinct non-missing values.
    fn count_unique(&self) -> usize;

    fn append_missing(&mut self);

    /// Parse `cell` and append it.
    ///
    /// Missing tokens append the sentinel. A cell that does not parse is an
    /// error and nothing is appended.
    fn append_cell(&mut self, cell: &str, options: &ParseOptions) -> Result<()>;

    /// Text form of the value at `row`; empty for missing.
    fn get_string(&self, row: usize) -> Result<String>;

    /// Big-endian bytes of the cell at `row`, exactly [`Column::byte_size`]
    /// long.
    fn as_bytes(&self, row: usize) -> Result<Bytes>;

    fn byte_size(&self) -> usize {
        self.column_type().byte_size()
    }

    /// Sort values in place, missing first.
    fn sort_ascending(&mut self);

    /// Sort values in place, missing last.
    fn sort_descending(&mut self);

    /// Remove every row.
    fn clear(&mut self);

    /// Rows holding the missing sentinel.
    fn missing(&self) -> Selection;

    /// Rows holding a value.
    fn not_missing(&self) -> Selection {
        let missing = self.missing();
        (0..self.size()).filter(|row| !missing.contains(*row)).collect()
    }

    /// Mark every selected row missing.
    fn set_missing(&mut self, selection: &Selection) -> Result<()>;

    /// A deep copy with fresh storage.
    fn copy_column(&self) -> Box<dyn Column>;

    /// An empty column of the same name and type.
    fn empty_copy_column(&self) -> Box<dyn Column>;

    /// The selected rows, in row order, as a new column.
    fn where_selected(&self, selection: &Selection) -> Result<Box<dyn Column>>;

    /// The rows not selected, in row order, as a new column.
    fn drop_where(&self, selection: &Selection) -> Box<dyn Column>;

    /// The given rows, in the order given, as a new column.
    fn subset_column(&self, rows: &[usize]) -> Result<Box<dyn Column>>;

    /// Append every row of `other`, which must have the same type.
    fn append_column(&mut self, other: &dyn Column) -> Result<()>;

    /// Append row `row` of `other`, which must have the same type.
    fn append_row_from(&mut self, other: &dyn Column, row: usize) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Column {
    /// Downcast to a concrete column type.
    pub fn downcast_ref<C: Column + 'static>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }

    pub fn downcast_mut<C: Column + 'static>(&mut self) -> Option<&mut C> {
        self.as_any_mut().downcast_mut::<C>()
    }
}

/// Downcast `other` to `C`, or fail with a type mismatch.
pub(crate) fn same_type<'a, C: Column + 'static>(
    expected: ColumnType,
    other: &'a dyn Column,
) -> Result<&'a C> {
    if other.column_type() != expected {
        return Err(Error::TypeMismatch {
            expected,
            actual: other.column_type(),
        });
    }
    other.as_any().downcast_ref::<C>().ok_or(Error::TypeMismatch {
        expected,
        actual: other.column_type(),
    })
}

/// Columns readable as doubles, for aggregation.
pub trait NumericColumn: Column {
    /// The value at `row` as a double; NaN when missing.
    fn get_double(&self, row: usize) -> Result<f64>;

    /// Every value as a double; missing rows are NaN.
    fn as_double_array(&self) -> Vec<f64>;

    /// Smallest value, skipping missing rows.
    fn min_f64(&self) -> Option<f64> {
        self.as_double_array()
            .into_iter()
            .filter(|v| !v.is_nan())
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Largest value, skipping missing rows.
    fn max_f64(&self) -> Option<f64> {
        self.as_double_array()
            .into_iter()
            .filter(|v| !v.is_nan())
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }
}

/// Columns of packed temporal values.
pub trait TemporalColumn: Column {
    type Value: TemporalValue;

    /// The packed value at `row`; the type's `MISSING` when absent.
    fn get_packed(&self, row: usize) -> Result<Self::Value>;

    /// Earliest value, skipping the sentinel.
    fn min_packed(&self) -> Option<Self::Value>;

    /// Latest value, skipping the sentinel.
    fn max_packed(&self) -> Option<Self::Value>;
}

/// Columns that store dictionary keys.
pub trait DictionaryBacked: Column {
    fn dictionary(&self) -> &Dictionary;

    /// The key stored at `row`; the missing code when absent.
    fn key_at(&self, row: usize) -> Result<i32>;
}

/// Columns that can be reordered by an arbitrary row comparator.
pub trait SortableColumn: Column {
    /// Rearrange rows so that new row `i` is old row `rows[i]`.
    fn reorder(&mut self, rows: &[usize]) -> Result<()>;

    /// Sort rows with a comparator over row indices. Stable for ties.
    fn sort_with(&mut self, compare: &dyn Fn(usize, usize) -> Ordering) -> Result<()> {
        let mut rows: Vec<usize> = (0..self.size()).collect();
        rows.sort_by(|&a, &b| compare(a, b));
        self.reorder(&rows)
    }
}

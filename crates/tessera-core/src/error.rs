//! Core error types.

use std::fmt;

use thiserror::Error;

use crate::column::ColumnType;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A parsed literal that was too wide for the target column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WideValue {
    /// An integer literal, parsed at 128-bit width.
    Integer(i128),
    /// A floating point literal, parsed at 64-bit width.
    Float(f64),
}

impl fmt::Display for WideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WideValue::Integer(v) => write!(f, "{}", v),
            WideValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Core column errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Two columns of different declared types were combined.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ColumnType,
        actual: ColumnType,
    },

    /// A numeric literal parsed fine but does not fit the column width.
    ///
    /// The caller may widen the column and retry with `parsed`.
    #[error("value {input:?} is out of range for {column_type} (parsed as {parsed})")]
    OutOfRange {
        input: String,
        parsed: WideValue,
        column_type: ColumnType,
    },

    /// A text cell could not be parsed into the column type.
    #[error("cannot parse {input:?} as {column_type}")]
    MalformedLiteral {
        input: String,
        column_type: ColumnType,
    },

    /// A row index outside `[0, size)`.
    #[error("row {index} is out of bounds for column of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Element-wise operation over columns of different lengths.
    #[error("length mismatch: {left} rows vs {right} rows")]
    LengthMismatch { left: usize, right: usize },

    /// Invalid argument to an operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(input: &str, column_type: ColumnType) -> Self {
        Error::MalformedLiteral {
            input: input.to_string(),
            column_type,
        }
    }

    /// Check that `index` addresses a row of a column with `size` rows.
    #[inline]
    pub(crate) fn check_index(index: usize, size: usize) -> Result<()> {
        if index < size {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds { index, size })
        }
    }

    /// Returns true if this error signals a value that could fit a wider column.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfRange { .. })
    }
}

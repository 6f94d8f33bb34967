//! Dense fixed-width column storage.
//!
//! A [`PrimitiveStore`] holds one raw value per row in a contiguous vector.
//! Missing rows hold the width's sentinel (see [`crate::missing`]), and every
//! operation here treats the sentinel as "no value": it is skipped by
//! `min`/`max`, `unique`, `top`/`bottom` and distinct counts, and it sorts
//! first ascending.

mod primitive;

use std::cmp::Ordering;
use std::collections::HashSet;

use bytes::{Bytes, BytesMut};
use rayon::slice::ParallelSliceMut;
use tracing::trace;

use crate::error::{Error, Result};
use crate::missing::{self, MissingValue};
use crate::selection::Selection;

pub use primitive::{NumericType, Primitive};

/// Stores at or above this many rows sort on the rayon pool.
pub const PARALLEL_SORT_THRESHOLD: usize = 1 << 16;

/// One raw value per row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimitiveStore<T> {
    data: Vec<T>,
}

impl<T: Primitive> PrimitiveStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create a store of `rows` missing values.
    pub fn missing(rows: usize) -> Self {
        Self {
            data: vec![T::MISSING; rows],
        }
    }

    /// Wrap an existing raw vector.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Consume the store, returning the raw vector.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw values.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Raw value at `row`.
    #[inline]
    pub fn get(&self, row: usize) -> Result<T> {
        self.data
            .get(row)
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                index: row,
                size: self.data.len(),
            })
    }

    /// Overwrite the raw value at `row`.
    #[inline]
    pub fn set(&mut self, row: usize, value: T) -> Result<()> {
        let size = self.data.len();
        match self.data.get_mut(row) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { index: row, size }),
        }
    }

    /// Overwrite every selected row with `value`.
    pub fn set_selected(&mut self, selection: &Selection, value: T) -> Result<()> {
        if let Some(max) = selection.max() {
            Error::check_index(max, self.data.len())?;
        }
        for row in selection {
            self.data[row] = value;
        }
        Ok(())
    }

    /// Mark every selected row as missing.
    pub fn set_missing(&mut self, selection: &Selection) -> Result<()> {
        self.set_selected(selection, T::MISSING)
    }

    /// Append a raw value.
    #[inline]
    pub fn append(&mut self, value: T) {
        self.data.push(value);
    }

    /// Append the sentinel.
    #[inline]
    pub fn append_missing(&mut self) {
        self.data.push(T::MISSING);
    }

    /// Append raw values copied from a slice.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.data.extend_from_slice(values);
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns true if the raw value at `row` is the sentinel.
    #[inline]
    pub fn is_missing(&self, row: usize) -> Result<bool> {
        self.get(row).map(T::is_missing_value)
    }

    /// Number of missing rows.
    pub fn count_missing(&self) -> usize {
        self.data.iter().filter(|v| v.is_missing_value()).count()
    }

    /// Number of distinct non-missing values.
    pub fn count_unique(&self) -> usize {
        self.data
            .iter()
            .filter(|v| !v.is_missing_value())
            .map(|v| v.distinct_key())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Distinct non-missing values, in first-seen order.
    pub fn unique(&self) -> Self {
        let mut seen = HashSet::new();
        let data = self
            .data
            .iter()
            .copied()
            .filter(|v| !v.is_missing_value() && seen.insert(v.distinct_key()))
            .collect();
        Self { data }
    }

    /// Returns true if any row holds `value`.
    pub fn contains(&self, value: T) -> bool {
        let key = value.distinct_key();
        !value.is_missing_value()
            && self
                .data
                .iter()
                .any(|v| !v.is_missing_value() && v.distinct_key() == key)
    }

    /// Smallest non-missing value.
    pub fn min(&self) -> Option<T> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_missing_value())
            .min_by(|a, b| T::compare(*a, *b))
    }

    /// Largest non-missing value.
    pub fn max(&self) -> Option<T> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_missing_value())
            .max_by(|a, b| T::compare(*a, *b))
    }

    /// Sort in place, smallest first. Missing rows come first.
    pub fn sort_ascending(&mut self) {
        self.sort_by(T::compare);
    }

    /// Sort in place, largest first. Missing rows come last.
    pub fn sort_descending(&mut self) {
        self.sort_by(|a, b| T::compare(b, a));
    }

    /// Sort in place with a custom comparator over raw values.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: Fn(T, T) -> Ordering + Sync,
    {
        if self.data.len() >= PARALLEL_SORT_THRESHOLD {
            trace!(rows = self.data.len(), "parallel sort");
            self.data.par_sort_unstable_by(|a, b| compare(*a, *b));
        } else {
            self.data.sort_unstable_by(|a, b| compare(*a, *b));
        }
    }

    /// Values at the given rows, in the order given.
    pub fn subset(&self, rows: &[usize]) -> Result<Self> {
        let mut data = Vec::with_capacity(rows.len());
        for &row in rows {
            data.push(self.get(row)?);
        }
        Ok(Self { data })
    }

    /// Values at the selected rows, in row order.
    pub fn filter(&self, selection: &Selection) -> Result<Self> {
        if let Some(max) = selection.max() {
            Error::check_index(max, self.data.len())?;
        }
        Ok(Self {
            data: selection.iter().map(|row| self.data[row]).collect(),
        })
    }

    /// Values at the rows not selected, in row order.
    pub fn drop_selected(&self, selection: &Selection) -> Self {
        Self {
            data: self
                .data
                .iter()
                .enumerate()
                .filter(|(row, _)| !selection.contains(*row))
                .map(|(_, v)| *v)
                .collect(),
        }
    }

    /// Shift values `n` rows later; the first `n` rows become missing.
    ///
    /// A negative `n` shifts values earlier and the trailing rows become
    /// missing. `|n| >= len` yields an all-missing store.
    pub fn lag(&self, n: isize) -> Self {
        let size = self.data.len();
        let mut dest = vec![T::MISSING; size];
        let shift = n.unsigned_abs();
        if shift < size {
            let length = size - shift;
            if n >= 0 {
                dest[shift..].copy_from_slice(&self.data[..length]);
            } else {
                dest[..length].copy_from_slice(&self.data[shift..]);
            }
        }
        Self { data: dest }
    }

    /// Shift values `n` rows earlier. Equivalent to `lag(-n)`.
    pub fn lead(&self, n: isize) -> Self {
        self.lag(n.saturating_neg())
    }

    /// The `n` largest non-missing values, largest first.
    pub fn top(&self, n: usize) -> Self {
        let mut values = self.remove_missing();
        values.sort_descending();
        values.data.truncate(n);
        values
    }

    /// The `n` smallest non-missing values, smallest first.
    pub fn bottom(&self, n: usize) -> Self {
        let mut values = self.remove_missing();
        values.sort_ascending();
        values.data.truncate(n);
        values
    }

    /// A copy without the missing rows.
    pub fn remove_missing(&self) -> Self {
        Self {
            data: self
                .data
                .iter()
                .copied()
                .filter(|v| !v.is_missing_value())
                .collect(),
        }
    }

    /// Replace every missing row with `value`.
    pub fn fill_missing(&mut self, value: T) {
        for slot in self.data.iter_mut().filter(|v| v.is_missing_value()) {
            *slot = value;
        }
    }

    /// Rows whose value satisfies `predicate`. Missing rows never match.
    pub fn eval<F>(&self, predicate: F) -> Selection
    where
        F: Fn(T) -> bool,
    {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_missing_value() && predicate(**v))
            .map(|(row, _)| row)
            .collect()
    }

    /// Rows holding the sentinel.
    pub fn missing_rows(&self) -> Selection {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_missing_value())
            .map(|(row, _)| row)
            .collect()
    }

    /// Rows holding a real value.
    pub fn present_rows(&self) -> Selection {
        self.eval(|_| true)
    }

    /// Big-endian encoding of one cell, exactly `T::BYTE_SIZE` bytes.
    pub fn cell_bytes(&self, row: usize) -> Result<Bytes> {
        let value = self.get(row)?;
        let mut buf = BytesMut::with_capacity(T::BYTE_SIZE);
        value.put_be(&mut buf);
        Ok(buf.freeze())
    }

    /// Apply `op` to every row, propagating the sentinel.
    pub fn map<U, F>(&self, op: F) -> PrimitiveStore<U>
    where
        U: Primitive,
        F: Fn(T) -> U,
    {
        PrimitiveStore {
            data: self
                .data
                .iter()
                .map(|v| missing::map(*v, &op))
                .collect(),
        }
    }

    /// Combine two stores row by row, propagating the sentinel.
    pub fn zip_map<V, U, F>(&self, other: &PrimitiveStore<V>, op: F) -> Result<PrimitiveStore<U>>
    where
        V: Primitive,
        U: Primitive,
        F: Fn(T, V) -> U,
    {
        if self.len() != other.len() {
            return Err(Error::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(PrimitiveStore {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| missing::combine(*a, *b, &op))
                .collect(),
        })
    }

    /// Convert to another numeric width, propagating the sentinel.
    pub fn cast<U>(&self) -> PrimitiveStore<U>
    where
        T: NumericType,
        U: NumericType,
    {
        PrimitiveStore {
            data: self.data.iter().map(|v| v.cast::<U>()).collect(),
        }
    }

    /// Values as doubles; missing rows become NaN.
    pub fn to_f64_vec(&self) -> Vec<f64>
    where
        T: NumericType,
    {
        self.data.iter().map(|v| v.to_f64()).collect()
    }
}

impl<T: Primitive> FromIterator<T> for PrimitiveStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

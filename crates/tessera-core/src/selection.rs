//! Row selections.
//!
//! A [`Selection`] is the result type of every predicate evaluated against a
//! column. It is a compressed bitmap of row indices, so combining selections
//! over millions of rows costs space proportional to how many rows are
//! selected rather than to the row count.
//!
//! Row indices are stored as `u32`. Adding a row above [`MAX_ROW`] fails
//! with [`Error::IndexOutOfBounds`]; removing or probing one is a no-op.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, RangeInclusive, Sub};

use rand::Rng;
use roaring::RoaringBitmap;
use tracing::trace;

use crate::error::{Error, Result};

/// Largest row index a selection can hold.
pub const MAX_ROW: usize = u32::MAX as usize;

#[inline]
fn row_u32(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| Error::IndexOutOfBounds {
        index: row,
        size: MAX_ROW.saturating_add(1),
    })
}

/// `[start, end)` as an inclusive `u32` range. Requires `start < end`.
#[inline]
fn row_range(start: usize, end: usize) -> Result<RangeInclusive<u32>> {
    Ok(row_u32(start)?..=row_u32(end - 1)?)
}

/// An ordered set of unique row indices.
#[derive(Clone, Default, PartialEq)]
pub struct Selection {
    bitmap: RoaringBitmap,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self {
            bitmap: RoaringBitmap::new(),
        }
    }

    /// Create a selection holding the given rows.
    pub fn with(rows: &[usize]) -> Self {
        rows.iter().copied().collect()
    }

    /// Create a selection holding every row in `[start, end)`.
    pub fn with_range(start: usize, end: usize) -> Result<Self> {
        let mut selection = Self::new();
        selection.add_range(start, end)?;
        Ok(selection)
    }

    /// Create a selection covering `[0, row_count)`.
    pub fn full(row_count: usize) -> Result<Self> {
        Self::with_range(0, row_count)
    }

    /// Rows in `[total_start, total_end)` that are not in `[excluded_start, excluded_end)`.
    pub fn without_range(
        total_start: usize,
        total_end: usize,
        excluded_start: usize,
        excluded_end: usize,
    ) -> Result<Self> {
        if total_end < total_start
            || excluded_end < excluded_start
            || excluded_start < total_start
            || excluded_end > total_end
        {
            return Err(Error::InvalidArgument(format!(
                "excluded range [{}, {}) must lie within [{}, {})",
                excluded_start, excluded_end, total_start, total_end
            )));
        }
        let mut selection = Self::with_range(total_start, total_end)?;
        selection.remove_range(excluded_start, excluded_end);
        Ok(selection)
    }

    /// Select `n` distinct rows uniformly at random from `[0, max)`.
    pub fn select_n_at_random<R: Rng + ?Sized>(n: usize, max: usize, rng: &mut R) -> Result<Self> {
        if n > max {
            return Err(Error::InvalidArgument(format!(
                "cannot select {} rows out of {}",
                n, max
            )));
        }
        if n == max {
            return Self::full(max);
        }
        trace!(n, max, "sampling rows");
        Ok(rand::seq::index::sample(rng, max, n).into_iter().collect())
    }

    /// Add a row. Adding a row already present does nothing.
    pub fn add(&mut self, row: usize) -> Result<&mut Self> {
        self.bitmap.insert(row_u32(row)?);
        Ok(self)
    }

    /// Add every row in `[start, end)`. Nothing is added when any row of
    /// the range is above [`MAX_ROW`].
    pub fn add_range(&mut self, start: usize, end: usize) -> Result<&mut Self> {
        if start < end {
            self.bitmap.insert_range(row_range(start, end)?);
        }
        Ok(self)
    }

    /// Remove a row.
    pub fn remove(&mut self, row: usize) -> &mut Self {
        if let Ok(row) = row_u32(row) {
            self.bitmap.remove(row);
        }
        self
    }

    /// Remove every row in `[start, end)`.
    pub fn remove_range(&mut self, start: usize, end: usize) -> &mut Self {
        if start < end && start <= MAX_ROW {
            self.bitmap.remove_range(start as u32..=(end - 1).min(MAX_ROW) as u32);
        }
        self
    }

    /// Returns true if `row` is selected.
    pub fn contains(&self, row: usize) -> bool {
        row_u32(row).map_or(false, |row| self.bitmap.contains(row))
    }

    /// Intersect with `other` in place.
    pub fn and(&mut self, other: &Selection) -> &mut Self {
        self.bitmap &= &other.bitmap;
        self
    }

    /// Union with `other` in place.
    pub fn or(&mut self, other: &Selection) -> &mut Self {
        self.bitmap |= &other.bitmap;
        self
    }

    /// Remove every row of `other` in place.
    pub fn and_not(&mut self, other: &Selection) -> &mut Self {
        self.bitmap -= &other.bitmap;
        self
    }

    /// Intersection as a new selection.
    pub fn intersection(&self, other: &Selection) -> Selection {
        self & other
    }

    /// Union as a new selection.
    pub fn union(&self, other: &Selection) -> Selection {
        self | other
    }

    /// Difference as a new selection.
    pub fn difference(&self, other: &Selection) -> Selection {
        self - other
    }

    /// Flip membership of every row in `[start, end)`.
    pub fn flip(&mut self, start: usize, end: usize) -> Result<&mut Self> {
        if start < end {
            let mut range = RoaringBitmap::new();
            range.insert_range(row_range(start, end)?);
            self.bitmap ^= range;
        }
        Ok(self)
    }

    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.bitmap.len() as usize
    }

    /// Alias for [`Selection::len`].
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Returns true if no row is selected.
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Remove every row.
    pub fn clear(&mut self) -> &mut Self {
        self.bitmap.clear();
        self
    }

    /// The `i`-th smallest selected row.
    ///
    /// For `{4, 32, 71}`, `get(0)` is 4 and `get(2)` is 71.
    pub fn get(&self, i: usize) -> Option<usize> {
        if i >= self.len() {
            return None;
        }
        self.bitmap.select(i as u32).map(|row| row as usize)
    }

    /// Smallest selected row.
    pub fn min(&self) -> Option<usize> {
        self.bitmap.min().map(|row| row as usize)
    }

    /// Largest selected row.
    pub fn max(&self) -> Option<usize> {
        self.bitmap.max().map(|row| row as usize)
    }

    /// Iterate selected rows in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bitmap.iter().map(|row| row as usize)
    }

    /// Selected rows in ascending order.
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 16;
        let mut list = f.debug_set();
        list.entries(self.iter().take(SHOWN));
        if self.len() > SHOWN {
            list.entry(&format_args!("... {} more", self.len() - SHOWN));
        }
        list.finish()
    }
}

/// Collecting panics on a row above [`MAX_ROW`]; use [`Selection::add`]
/// to handle that case as an error.
impl FromIterator<usize> for Selection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut selection = Self::new();
        selection.extend(iter);
        selection
    }
}

impl Extend<usize> for Selection {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        self.bitmap.extend(iter.into_iter().map(|row| match row_u32(row) {
            Ok(row) => row,
            Err(err) => panic!("{}", err),
        }));
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = usize;
    type IntoIter = std::iter::Map<roaring::bitmap::Iter<'a>, fn(u32) -> usize>;

    fn into_iter(self) -> Self::IntoIter {
        fn widen(row: u32) -> usize {
            row as usize
        }
        self.bitmap.iter().map(widen as fn(u32) -> usize)
    }
}

impl BitAnd for &Selection {
    type Output = Selection;

    fn bitand(self, rhs: &Selection) -> Selection {
        Selection {
            bitmap: &self.bitmap & &rhs.bitmap,
        }
    }
}

impl BitOr for &Selection {
    type Output = Selection;

    fn bitor(self, rhs: &Selection) -> Selection {
        Selection {
            bitmap: &self.bitmap | &rhs.bitmap,
        }
    }
}

impl BitXor for &Selection {
    type Output = Selection;

    fn bitxor(self, rhs: &Selection) -> Selection {
        Selection {
            bitmap: &self.bitmap ^ &rhs.bitmap,
        }
    }
}

impl Sub for &Selection {
    type Output = Selection;

    fn sub(self, rhs: &Selection) -> Selection {
        Selection {
            bitmap: &self.bitmap - &rhs.bitmap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn evens(n: usize) -> Selection {
        (0..n).filter(|i| i % 2 == 0).collect()
    }

    #[test]
    fn test_and_not_removes_rows() {
        let mut selection = evens(10);
        selection.and_not(&Selection::with(&[0, 2]));
        assert_eq!(selection.to_vec(), vec![4, 6, 8]);
        assert_eq!(selection.size(), 3);
    }

    #[test]
    fn test_and_or() {
        let a = Selection::with(&[1, 2, 3]);
        let b = Selection::with(&[2, 3, 4]);

        assert_eq!((&a & &b).to_vec(), vec![2, 3]);
        assert_eq!((&a | &b).to_vec(), vec![1, 2, 3, 4]);
        assert_eq!((&a - &b).to_vec(), vec![1]);
        assert_eq!((&a ^ &b).to_vec(), vec![1, 4]);

        let mut chained = a.clone();
        chained.or(&b).and(&Selection::with_range(2, 4).unwrap());
        assert_eq!(chained.to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_ranges() {
        let mut selection = Selection::with_range(5, 10).unwrap();
        assert_eq!(selection.len(), 5);
        assert!(selection.contains(5));
        assert!(!selection.contains(10));

        selection.remove_range(6, 8);
        assert_eq!(selection.to_vec(), vec![5, 8, 9]);

        // Empty and inverted ranges are no-ops.
        selection.add_range(3, 3).unwrap().add_range(7, 2).unwrap();
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_without_range() {
        let selection = Selection::without_range(0, 10, 3, 6).unwrap();
        assert_eq!(selection.to_vec(), vec![0, 1, 2, 6, 7, 8, 9]);
        assert!(Selection::without_range(2, 10, 0, 5).is_err());
    }

    #[test]
    fn test_flip() {
        let mut selection = Selection::with(&[1, 3]);
        selection.flip(0, 5).unwrap();
        assert_eq!(selection.to_vec(), vec![0, 2, 4]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_rows_above_u32_are_rejected() {
        let too_far = MAX_ROW + 1;
        let mut selection = Selection::new();
        assert!(matches!(
            selection.add(too_far),
            Err(Error::IndexOutOfBounds { index, .. }) if index == too_far
        ));
        assert!(selection.add_range(MAX_ROW - 1, too_far + 1).is_err());
        assert!(selection.flip(MAX_ROW, too_far + 1).is_err());
        assert!(selection.is_empty());

        selection.add_range(MAX_ROW - 1, too_far).unwrap();
        assert_eq!(selection.to_vec(), vec![MAX_ROW - 1, MAX_ROW]);
        assert!(!selection.contains(too_far));
        selection.remove(too_far).remove_range(MAX_ROW, too_far + 5);
        assert_eq!(selection.to_vec(), vec![MAX_ROW - 1]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_collect_panics_above_u32() {
        let _ = [1, MAX_ROW + 1].into_iter().collect::<Selection>();
    }

    #[test]
    fn test_get_nth() {
        let selection = Selection::with(&[71, 4, 32]);
        assert_eq!(selection.get(0), Some(4));
        assert_eq!(selection.get(1), Some(32));
        assert_eq!(selection.get(2), Some(71));
        assert_eq!(selection.get(3), None);
        assert_eq!(selection.min(), Some(4));
        assert_eq!(selection.max(), Some(71));
    }

    #[test]
    fn test_iteration_is_ascending_and_unique() {
        let selection = Selection::with(&[9, 1, 5, 1, 9]);
        let rows: Vec<usize> = (&selection).into_iter().collect();
        assert_eq!(rows, vec![1, 5, 9]);
    }

    #[test]
    fn test_random_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let sample = Selection::select_n_at_random(10, 100, &mut rng).unwrap();
        assert_eq!(sample.len(), 10);
        assert!(sample.iter().all(|row| row < 100));

        let all = Selection::select_n_at_random(5, 5, &mut rng).unwrap();
        assert_eq!(all.to_vec(), vec![0, 1, 2, 3, 4]);

        assert!(Selection::select_n_at_random(6, 5, &mut rng).is_err());
    }

    #[test]
    fn test_empty_selection_is_not_absent() {
        let a = Selection::with(&[1]);
        let b = Selection::with(&[2]);
        let none = &a & &b;
        assert!(none.is_empty());
        assert_eq!(none.len(), 0);
        assert_eq!(format!("{:?}", none), "{}");
    }
}

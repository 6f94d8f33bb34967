//! Boolean columns.

use std::any::Any;
use std::fmt;

use bytes::Bytes;

use super::{same_type, Column, ColumnType, IntColumn, NumericColumn, SortableColumn};
use crate::config::ParseOptions;
use crate::error::{Error, Result};
use crate::missing::{MissingValue, BOOLEAN_FALSE, BOOLEAN_MISSING, BOOLEAN_TRUE};
use crate::parse::parse_boolean;
use crate::selection::Selection;
use crate::store::PrimitiveStore;

#[inline]
fn encode(value: bool) -> i8 {
    if value {
        BOOLEAN_TRUE
    } else {
        BOOLEAN_FALSE
    }
}

#[inline]
fn decode(byte: i8) -> Option<bool> {
    match byte {
        BOOLEAN_TRUE => Some(true),
        BOOLEAN_FALSE => Some(false),
        _ => None,
    }
}

/// A column of three-valued booleans stored one byte per row.
#[derive(Clone, PartialEq)]
pub struct BooleanColumn {
    name: String,
    data: PrimitiveStore<i8>,
}

impl BooleanColumn {
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

    pub fn create(name: &str, values: &[bool]) -> Self {
        Self {
            name: name.to_string(),
            data: values.iter().map(|&v| encode(v)).collect(),
        }
    }

    /// Create a column over stored bytes. Each byte must be 1, 0 or the
    /// missing sentinel.
    pub fn from_raw(name: &str, bytes: Vec<i8>) -> Result<Self> {
        if let Some((row, byte)) = bytes
            .iter()
            .enumerate()
            .find(|&(_, &byte)| decode(byte).is_none() && byte != BOOLEAN_MISSING)
        {
            return Err(Error::InvalidArgument(format!(
                "byte {} at row {} is not a boolean",
                byte, row
            )));
        }
        Ok(Self {
            name: name.to_string(),
            data: PrimitiveStore::from_vec(bytes),
        })
    }

    pub fn from_options<I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<bool>>,
    {
        Self {
            name: name.to_string(),
            data: values
                .into_iter()
                .map(|v| v.map(encode).unwrap_or(BOOLEAN_MISSING))
                .collect(),
        }
    }

    /// A column of `size` rows, true where `selection` contains the row.
    pub fn from_selection(name: &str, selection: &Selection, size: usize) -> Self {
        Self {
            name: name.to_string(),
            data: (0..size).map(|row| encode(selection.contains(row))).collect(),
        }
    }

    fn with_data(&self, data: PrimitiveStore<i8>) -> Self {
        Self {
            name: self.name.clone(),
            data,
        }
    }

    /// Raw bytes: 0, 1, or the missing byte.
    pub fn as_slice(&self) -> &[i8] {
        self.data.as_slice()
    }

    pub fn get(&self, row: usize) -> Result<Option<bool>> {
        Ok(decode(self.data.get(row)?))
    }

    pub fn set(&mut self, row: usize, value: bool) -> Result<()> {
        self.data.set(row, encode(value))
    }

    pub fn set_missing_at(&mut self, row: usize) -> Result<()> {
        self.data.set(row, BOOLEAN_MISSING)
    }

    pub fn append(&mut self, value: bool) -> &mut Self {
        self.data.append(encode(value));
        self
    }

    pub fn append_option(&mut self, value: Option<bool>) -> &mut Self {
        self.data.append(value.map(encode).unwrap_or(BOOLEAN_MISSING));
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

    /// Distinct non-missing values in first-seen order.
    pub fn unique(&self) -> Self {
        self.with_data(self.data.unique())
    }

    /// Rows holding `true`.
    pub fn is_true(&self) -> Selection {
        self.data.eval(|v| v == BOOLEAN_TRUE)
    }

    /// Rows holding `false`.
    pub fn is_false(&self) -> Selection {
        self.data.eval(|v| v == BOOLEAN_FALSE)
    }

    pub fn count_true(&self) -> usize {
        self.is_true().len()
    }

    pub fn count_false(&self) -> usize {
        self.is_false().len()
    }

    /// Share of present rows that are true; `None` when every row is missing.
    pub fn proportion_true(&self) -> Option<f64> {
        let present = self.size() - self.count_missing();
        if present == 0 {
            return None;
        }
        Some(self.count_true() as f64 / present as f64)
    }

    pub fn any(&self) -> bool {
        self.count_true() > 0
    }

    /// True when there is at least one present row and none is false.
    pub fn all(&self) -> bool {
        self.count_false() == 0 && self.count_missing() < self.size()
    }

    /// Row-wise AND. Missing in either row gives missing.
    pub fn and(&self, other: &BooleanColumn) -> Result<BooleanColumn> {
        let data = self.data.zip_map(&other.data, |a, b| encode(a == 1 && b == 1))?;
        Ok(BooleanColumn {
            name: format!("{} and {}", self.name, other.name),
            data,
        })
    }

    /// Row-wise OR. Missing in either row gives missing.
    pub fn or(&self, other: &BooleanColumn) -> Result<BooleanColumn> {
        let data = self.data.zip_map(&other.data, |a, b| encode(a == 1 || b == 1))?;
        Ok(BooleanColumn {
            name: format!("{} or {}", self.name, other.name),
            data,
        })
    }

    /// Row-wise negation. Missing stays missing.
    pub fn not(&self) -> BooleanColumn {
        BooleanColumn {
            name: format!("not {}", self.name),
            data: self.data.map(|v| encode(v != BOOLEAN_TRUE)),
        }
    }

    /// 1 for true, 0 for false.
    pub fn to_int_column(&self) -> IntColumn {
        IntColumn::from_raw(
            &self.name,
            self.as_slice()
                .iter()
                .map(|&v| if v.is_missing_value() { i32::MISSING } else { v as i32 })
                .collect(),
        )
    }
}

impl fmt::Debug for BooleanColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanColumn")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}

impl Column for BooleanColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::Boolean
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
        self.data.append(BOOLEAN_MISSING);
    }

    fn append_cell(&mut self, cell: &str, options: &ParseOptions) -> Result<()> {
        let value = parse_boolean(cell, options)?;
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
        let other = same_type::<Self>(ColumnType::Boolean, other)?;
        self.data.extend_from_slice(other.as_slice());
        Ok(())
    }

    fn append_row_from(&mut self, other: &dyn Column, row: usize) -> Result<()> {
        let other = same_type::<Self>(ColumnType::Boolean, other)?;
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

impl NumericColumn for BooleanColumn {
    fn get_double(&self, row: usize) -> Result<f64> {
        Ok(match self.get(row)? {
            Some(true) => 1.0,
            Some(false) => 0.0,
            None => f64::NAN,
        })
    }

    fn as_double_array(&self) -> Vec<f64> {
        self.as_slice()
            .iter()
            .map(|&v| match decode(v) {
                Some(true) => 1.0,
                Some(false) => 0.0,
                None => f64::NAN,
            })
            .collect()
    }
}

impl SortableColumn for BooleanColumn {
    fn reorder(&mut self, rows: &[usize]) -> Result<()> {
        self.data = self.data.subset(rows)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_valued_storage() {
        let column = BooleanColumn::from_options("b", [Some(true), None, Some(false)]);
        assert_eq!(column.as_slice(), &[1, i8::MIN, 0]);
        assert_eq!(column.get(1).unwrap(), None);
        assert_eq!(column.count_missing(), 1);
        assert_eq!(column.count_unique(), 2);
    }

    #[test]
    fn test_from_raw_accepts_only_stored_bytes() {
        let column = BooleanColumn::from_raw("b", vec![1, i8::MIN, 0]).unwrap();
        assert_eq!(column.get(0).unwrap(), Some(true));
        assert_eq!(column.get(1).unwrap(), None);
        assert_eq!(column.is_false().to_vec(), vec![2]);

        let err = BooleanColumn::from_raw("b", vec![1, 2]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
        assert!(BooleanColumn::from_raw("b", vec![-1]).is_err());
    }

    #[test]
    fn test_append_cell_tokens() {
        let options = ParseOptions::default();
        let mut column = BooleanColumn::new("b");
        for cell in ["Y", "false", "NA", "1"] {
            column.append_cell(cell, &options).unwrap();
        }
        assert_eq!(column.get_string(0).unwrap(), "true");
        assert_eq!(column.get_string(1).unwrap(), "false");
        assert_eq!(column.get_string(2).unwrap(), "");
        assert!(column.append_cell("maybe", &options).is_err());
        assert_eq!(column.size(), 4);
    }

    #[test]
    fn test_selections_and_counts() {
        let column =
            BooleanColumn::from_options("b", [Some(true), None, Some(true), Some(false)]);
        assert_eq!(column.is_true().to_vec(), vec![0, 2]);
        assert_eq!(column.is_false().to_vec(), vec![3]);
        assert_eq!(column.proportion_true(), Some(2.0 / 3.0));
        assert!(column.any());
        assert!(!column.all());
        assert_eq!(BooleanColumn::with_size("e", 2).proportion_true(), None);
    }

    #[test]
    fn test_logic_propagates_missing() {
        let a = BooleanColumn::from_options("a", [Some(true), Some(true), None]);
        let b = BooleanColumn::from_options("b", [Some(false), Some(true), Some(true)]);
        let and = a.and(&b).unwrap();
        assert_eq!(and.as_slice(), &[0, 1, i8::MIN]);
        let or = a.or(&b).unwrap();
        assert_eq!(or.as_slice(), &[1, 1, i8::MIN]);
        assert_eq!(a.not().as_slice(), &[0, 0, i8::MIN]);
    }

    #[test]
    fn test_sort_places_missing_first() {
        let mut column = BooleanColumn::from_options("b", [Some(true), None, Some(false)]);
        column.sort_ascending();
        assert_eq!(column.as_slice(), &[i8::MIN, 0, 1]);
        column.sort_descending();
        assert_eq!(column.as_slice(), &[1, 0, i8::MIN]);
    }

    #[test]
    fn test_numeric_views() {
        let column = BooleanColumn::from_options("b", [Some(true), None, Some(false)]);
        let ints = column.to_int_column();
        assert_eq!(ints.as_slice(), &[1, i32::MIN, 0]);
        assert_eq!(column.get_double(0).unwrap(), 1.0);
        assert!(column.get_double(1).unwrap().is_nan());
        assert_eq!(column.max_f64(), Some(1.0));
    }

    #[test]
    fn test_from_selection() {
        let column = BooleanColumn::from_selection("b", &Selection::with(&[1, 3]), 4);
        assert_eq!(column.as_slice(), &[0, 1, 0, 1]);
    }
}

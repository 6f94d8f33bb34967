//! Dictionary-encoded string columns.
//!
//! Each row stores an `i32` key into the column's own [`Dictionary`]; missing
//! rows store the key sentinel. Predicates evaluate once per distinct string
//! and then scan the keys, so their cost is dominated by the row count rather
//! than by string comparisons.
//!
//! The empty string is not a value: storing `""` stores a missing row, so a
//! column's text form reads back to the same column.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use bytes::Bytes;
use rayon::prelude::*;
use tracing::debug;

use super::{
    same_type, BooleanColumn, Column, ColumnType, DictionaryBacked, IntColumn, SortableColumn,
};
use crate::config::ParseOptions;
use crate::dictionary::{Dictionary, MISSING_KEY};
use crate::error::{Error, Result};
use crate::missing::MissingValue;
use crate::parse::parse_string;
use crate::selection::Selection;
use crate::store::PrimitiveStore;

/// A column of strings stored as dictionary keys.
///
/// Not safe for concurrent appends; build large columns in parallel with
/// [`StringColumn::from_shards`].
#[derive(Clone)]
pub struct StringColumn {
    name: String,
    codes: PrimitiveStore<i32>,
    dictionary: Dictionary,
}

impl StringColumn {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            codes: PrimitiveStore::new(),
            dictionary: Dictionary::new(),
        }
    }

    /// Create a column of `rows` missing values.
    pub fn with_size(name: &str, rows: usize) -> Self {
        Self {
            name: name.to_string(),
            codes: PrimitiveStore::missing(rows),
            dictionary: Dictionary::new(),
        }
    }

    pub fn create<S: AsRef<str>>(name: &str, values: &[S]) -> Result<Self> {
        let mut column = Self::new(name);
        for value in values {
            column.append(value.as_ref())?;
        }
        Ok(column)
    }

    pub fn from_options<I, S>(name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut column = Self::new(name);
        for value in values {
            match value {
                Some(value) => {
                    column.append(value.as_ref())?;
                }
                None => column.codes.append_missing(),
            }
        }
        Ok(column)
    }

    /// Build one column from independently encoded shards.
    ///
    /// Each shard is encoded into its own dictionary on the rayon pool; the
    /// shard dictionaries are then merged in shard order and their keys
    /// remapped. The result equals appending every shard in order.
    pub fn from_shards<S>(name: &str, shards: &[Vec<Option<S>>]) -> Result<Self>
    where
        S: AsRef<str> + Sync,
    {
        let encoded = shards
            .par_iter()
            .map(|shard| -> Result<(Dictionary, Vec<i32>)> {
                let mut dictionary = Dictionary::new();
                let mut codes = Vec::with_capacity(shard.len());
                for value in shard {
                    codes.push(match value {
                        Some(value) if !value.as_ref().is_empty() => {
                            dictionary.encode(value.as_ref())?
                        }
                        _ => MISSING_KEY,
                    });
                }
                Ok((dictionary, codes))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut column = Self::new(name);
        for (dictionary, mut codes) in encoded {
            let remap = column.dictionary.merge(&dictionary)?;
            remap.apply(&mut codes);
            column.codes.extend_from_slice(&codes);
        }
        debug!(
            shards = shards.len(),
            rows = column.size(),
            distinct = column.dictionary.distinct_count(),
            "Built string column from shards"
        );
        Ok(column)
    }

    /// Create a column over stored keys and the dictionary they index.
    ///
    /// Every code must be the missing sentinel or a live key. Row counts are
    /// recomputed from `codes` and keys no row uses are retired. Codes for
    /// the empty string become missing.
    pub fn from_raw(name: &str, codes: Vec<i32>, mut dictionary: Dictionary) -> Result<Self> {
        if let Some((row, code)) = codes
            .iter()
            .enumerate()
            .find(|&(_, &code)| code != MISSING_KEY && dictionary.string_for(code).is_none())
        {
            return Err(Error::InvalidArgument(format!(
                "code {} at row {} is not a dictionary key",
                code, row
            )));
        }
        let empty = dictionary.get_key("");
        dictionary.reset_counts();
        let codes: PrimitiveStore<i32> = codes
            .into_iter()
            .map(|code| {
                if code == MISSING_KEY || Some(code) == empty {
                    MISSING_KEY
                } else {
                    dictionary.retain(code);
                    code
                }
            })
            .collect();
        dictionary.compact();
        Ok(Self {
            name: name.to_string(),
            codes,
            dictionary,
        })
    }

    /// A column with the same name holding the strings behind `codes`,
    /// encoded into a fresh dictionary.
    fn rebuild<I>(&self, codes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut column = Self::new(&self.name);
        for code in codes {
            match self.dictionary.string_for(code) {
                Some(value) => column.push_known(value),
                None => column.codes.append_missing(),
            }
        }
        column
    }

    /// Append a string that came from an existing dictionary. The new
    /// dictionary never holds more keys than the source, so assignment
    /// cannot run out of keys.
    fn push_known(&mut self, value: &str) {
        match self.dictionary.encode(value) {
            Ok(key) => self.codes.append(key),
            Err(_) => self.codes.append_missing(),
        }
    }

    /// Row keys, sentinels included.
    pub fn codes(&self) -> &[i32] {
        self.codes.as_slice()
    }

    pub fn get(&self, row: usize) -> Result<Option<&str>> {
        let key = self.codes.get(row)?;
        Ok(self.dictionary.string_for(key))
    }

    /// Overwrite `row`. The previous string's key is retired if no other row
    /// uses it. Setting `""` makes the row missing.
    pub fn set(&mut self, row: usize, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.set_missing_at(row);
        }
        let old = self.codes.get(row)?;
        let key = self.dictionary.encode(value)?;
        self.codes.set(row, key)?;
        if !old.is_missing_value() {
            self.dictionary.release(old);
        }
        Ok(())
    }

    pub fn set_missing_at(&mut self, row: usize) -> Result<()> {
        let old = self.codes.get(row)?;
        self.codes.set(row, MISSING_KEY)?;
        if !old.is_missing_value() {
            self.dictionary.release(old);
        }
        Ok(())
    }

    /// Append `value`; `""` appends a missing row.
    pub fn append(&mut self, value: &str) -> Result<&mut Self> {
        if value.is_empty() {
            self.codes.append_missing();
            return Ok(self);
        }
        let key = self.dictionary.encode(value)?;
        self.codes.append(key);
        Ok(self)
    }

    pub fn append_option(&mut self, value: Option<&str>) -> Result<&mut Self> {
        match value {
            Some(value) => self.append(value),
            None => {
                self.codes.append_missing();
                Ok(self)
            }
        }
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn empty_copy(&self) -> Self {
        Self::new(&self.name)
    }

    /// The selected rows, in row order.
    pub fn filter(&self, selection: &Selection) -> Result<Self> {
        Ok(self.rebuild(self.codes.filter(selection)?.into_vec()))
    }

    /// The given rows, in the order given.
    pub fn subset(&self, rows: &[usize]) -> Result<Self> {
        Ok(self.rebuild(self.codes.subset(rows)?.into_vec()))
    }

    pub fn lag(&self, n: isize) -> Self {
        self.rebuild(self.codes.lag(n).into_vec())
    }

    pub fn lead(&self, n: isize) -> Self {
        self.rebuild(self.codes.lead(n).into_vec())
    }

    /// One row per distinct string, in dictionary order.
    ///
    /// Dictionary order is first-seen order, not sorted order.
    pub fn unique(&self) -> Self {
        let mut column = Self::new(&self.name);
        for (_, value) in self.dictionary.iter() {
            column.push_known(value);
        }
        column
    }

    /// Distinct strings with their row counts, in dictionary order.
    pub fn count_by_category(&self) -> (StringColumn, IntColumn) {
        let mut categories = StringColumn::new("Category");
        let mut counts = IntColumn::new("Count");
        for (key, value) in self.dictionary.iter() {
            categories.push_known(value);
            counts.append(self.dictionary.count_for_key(key) as i32);
        }
        (categories, counts)
    }

    /// One boolean column per distinct string, true where the row holds it.
    ///
    /// Costs O(rows × distinct strings); use only on low-cardinality columns.
    /// Missing rows are missing in every dummy column.
    pub fn get_dummies(&self) -> Vec<BooleanColumn> {
        debug!(
            column = %self.name,
            rows = self.size(),
            distinct = self.dictionary.distinct_count(),
            "Expanding dummy columns"
        );
        self.dictionary
            .iter()
            .map(|(key, value)| {
                BooleanColumn::from_options(
                    value,
                    self.codes().iter().map(|&code| {
                        if code.is_missing_value() {
                            None
                        } else {
                            Some(code == key)
                        }
                    }),
                )
            })
            .collect()
    }

    /// Returns true if any row holds `value`.
    pub fn contains(&self, value: &str) -> bool {
        self.dictionary.contains(value)
    }

    /// Number of rows holding `value`.
    pub fn count_occurrences(&self, value: &str) -> usize {
        self.dictionary.count_occurrences(value)
    }

    /// Rows whose string satisfies `predicate`. The predicate runs once per
    /// distinct string. Missing rows never match.
    pub fn eval<F: Fn(&str) -> bool>(&self, predicate: F) -> Selection {
        let mut matches = vec![false; self.dictionary.next_key().max(0) as usize];
        for (key, value) in self.dictionary.iter() {
            matches[key as usize] = predicate(value);
        }
        self.codes
            .eval(|code| matches.get(code as usize).copied().unwrap_or(false))
    }

    pub fn is_equal_to(&self, value: &str) -> Selection {
        match self.dictionary.get_key(value) {
            Some(key) => self.codes.eval(|code| code == key),
            None => Selection::new(),
        }
    }

    /// Present rows holding anything other than `value`.
    pub fn is_not_equal_to(&self, value: &str) -> Selection {
        match self.dictionary.get_key(value) {
            Some(key) => self.codes.eval(|code| code != key),
            None => self.codes.present_rows(),
        }
    }

    pub fn is_in(&self, values: &[&str]) -> Selection {
        let keys: HashSet<i32> = values
            .iter()
            .filter_map(|value| self.dictionary.get_key(value))
            .collect();
        self.codes.eval(|code| keys.contains(&code))
    }

    pub fn is_not_in(&self, values: &[&str]) -> Selection {
        let keys: HashSet<i32> = values
            .iter()
            .filter_map(|value| self.dictionary.get_key(value))
            .collect();
        self.codes.eval(|code| !keys.contains(&code))
    }

    pub fn starts_with(&self, prefix: &str) -> Selection {
        self.eval(|value| value.starts_with(prefix))
    }

    pub fn ends_with(&self, suffix: &str) -> Selection {
        self.eval(|value| value.ends_with(suffix))
    }

    pub fn contains_str(&self, pattern: &str) -> Selection {
        self.eval(|value| value.contains(pattern))
    }

    /// Rows with no string. The empty string is stored as missing, so these
    /// are the missing rows.
    pub fn is_empty_string(&self) -> Selection {
        self.codes.missing_rows()
    }

    /// Apply `op` to every present string. `op` runs once per distinct
    /// string; an empty result is missing.
    pub fn map_strings<F: Fn(&str) -> String>(&self, name: &str, op: F) -> Result<StringColumn> {
        let mapped: Vec<Option<String>> = (0..self.dictionary.next_key())
            .map(|key| self.dictionary.string_for(key).map(&op))
            .collect();
        let mut column = StringColumn::new(name);
        for &code in self.codes() {
            let value = if code < 0 {
                None
            } else {
                mapped.get(code as usize).and_then(|value| value.as_deref())
            };
            column.append_option(value)?;
        }
        Ok(column)
    }

    pub fn upper_case(&self) -> Result<StringColumn> {
        self.map_strings(&format!("{}[ucase]", self.name), str::to_uppercase)
    }

    pub fn lower_case(&self) -> Result<StringColumn> {
        self.map_strings(&format!("{}[lcase]", self.name), str::to_lowercase)
    }

    pub fn trim(&self) -> Result<StringColumn> {
        self.map_strings(&format!("{}[trim]", self.name), |value| value.trim().to_string())
    }

    /// Characters `[start, end)` of each string, clamped to its length.
    pub fn substring(&self, start: usize, end: usize) -> Result<StringColumn> {
        if end < start {
            return Err(Error::InvalidArgument(format!(
                "substring end {} is before start {}",
                end, start
            )));
        }
        self.map_strings(&format!("{}[sub]", self.name), |value| {
            value.chars().skip(start).take(end - start).collect()
        })
    }

    pub fn replace_all(&self, pattern: &str, replacement: &str) -> Result<StringColumn> {
        self.map_strings(&format!("{}[repl]", self.name), |value| {
            value.replace(pattern, replacement)
        })
    }

    /// Row-wise concatenation. Missing in either row gives missing.
    pub fn concatenate(&self, other: &StringColumn) -> Result<StringColumn> {
        if self.size() != other.size() {
            return Err(Error::LengthMismatch {
                left: self.size(),
                right: other.size(),
            });
        }
        let mut column = StringColumn::new(&format!("{}{}", self.name, other.name));
        for row in 0..self.size() {
            match (self.get(row)?, other.get(row)?) {
                (Some(left), Some(right)) => {
                    column.append(&format!("{}{}", left, right))?;
                }
                _ => column.codes.append_missing(),
            }
        }
        Ok(column)
    }

    /// Append `suffix` to every present string.
    pub fn concatenate_str(&self, suffix: &str) -> Result<StringColumn> {
        self.map_strings(&self.name, |value| format!("{}{}", value, suffix))
    }

    /// Number of characters in each string.
    pub fn count_chars(&self) -> IntColumn {
        IntColumn::from_raw(
            &format!("{}[len]", self.name),
            self.codes()
                .iter()
                .map(|&code| match self.dictionary.string_for(code) {
                    Some(value) => value.chars().count() as i32,
                    None => i32::MISSING,
                })
                .collect(),
        )
    }

    /// Characters from `start` to the end of each string.
    pub fn substring_from(&self, start: usize) -> Result<StringColumn> {
        self.map_strings(&format!("{}[sub]", self.name), |value| {
            value.chars().skip(start).collect()
        })
    }

    /// Replace the first match of `pattern` in each string.
    pub fn replace_first(&self, pattern: &str, replacement: &str) -> Result<StringColumn> {
        self.map_strings(&format!("{}[repl]", self.name), |value| {
            value.replacen(pattern, replacement, 1)
        })
    }

    /// Left-pad each string with `pad` to at least `min_len` characters.
    pub fn pad_start(&self, min_len: usize, pad: char) -> Result<StringColumn> {
        self.map_strings(&format!("{}[pad]", self.name), |value| {
            let missing = min_len.saturating_sub(value.chars().count());
            let mut padded: String = std::iter::repeat(pad).take(missing).collect();
            padded.push_str(value);
            padded
        })
    }

    /// Right-pad each string with `pad` to at least `min_len` characters.
    pub fn pad_end(&self, min_len: usize, pad: char) -> Result<StringColumn> {
        self.map_strings(&format!("{}[pad]", self.name), |value| {
            let missing = min_len.saturating_sub(value.chars().count());
            let mut padded = value.to_string();
            padded.extend(std::iter::repeat(pad).take(missing));
            padded
        })
    }

    /// Shorten strings longer than `max_width` characters to `max_width`,
    /// ending in `...`. `max_width` must leave room for one character.
    pub fn abbreviate(&self, max_width: usize) -> Result<StringColumn> {
        const MARKER: &str = "...";
        if max_width <= MARKER.len() {
            return Err(Error::InvalidArgument(format!(
                "abbreviation width {} must exceed {}",
                max_width,
                MARKER.len()
            )));
        }
        self.map_strings(&format!("{}[abbr]", self.name), |value| {
            if value.chars().count() <= max_width {
                return value.to_string();
            }
            let mut short: String = value.chars().take(max_width - MARKER.len()).collect();
            short.push_str(MARKER);
            short
        })
    }

    /// Split each string on `separator`, sort the trimmed non-empty tokens
    /// and join them back with `separator`.
    pub fn tokenize_and_sort(&self, separator: &str) -> Result<StringColumn> {
        check_separator(separator)?;
        self.map_strings(&format!("{}[sorted]", self.name), |value| {
            let mut tokens = split_tokens(value, separator);
            tokens.sort_unstable();
            tokens.join(separator)
        })
    }

    /// Split each string on `separator` and keep the first occurrence of
    /// each token.
    pub fn tokenize_and_remove_duplicates(&self, separator: &str) -> Result<StringColumn> {
        check_separator(separator)?;
        self.map_strings(&format!("{}[without duplicates]", self.name), |value| {
            let mut seen = HashSet::new();
            split_tokens(value, separator)
                .into_iter()
                .filter(|token| seen.insert(*token))
                .collect::<Vec<_>>()
                .join(separator)
        })
    }

    /// Number of trimmed non-empty tokens in each string.
    pub fn count_tokens(&self, separator: &str) -> Result<IntColumn> {
        check_separator(separator)?;
        Ok(IntColumn::from_raw(
            &format!("{}[token count]", self.name),
            self.codes()
                .iter()
                .map(|&code| match self.dictionary.string_for(code) {
                    Some(value) => split_tokens(value, separator).len() as i32,
                    None => i32::MISSING,
                })
                .collect(),
        ))
    }

    /// Every token of every row, in row order. The result is not row-aligned
    /// with this column.
    pub fn tokens(&self, separator: &str) -> Result<StringColumn> {
        check_separator(separator)?;
        let mut column = StringColumn::new(&format!("{}[tokens]", self.name));
        for &code in self.codes() {
            if let Some(value) = self.dictionary.string_for(code) {
                for token in split_tokens(value, separator) {
                    column.append(token)?;
                }
            }
        }
        Ok(column)
    }

    /// Distinct tokens across the column, in first-seen order.
    pub fn unique_tokens(&self, separator: &str) -> Result<StringColumn> {
        Ok(self.tokens(separator)?.unique())
    }

    /// Row-wise longest common prefix. Missing in either row, or no shared
    /// prefix, gives missing.
    pub fn common_prefix(&self, other: &StringColumn) -> Result<StringColumn> {
        self.zip_strings(other, "prefix", |left, right| {
            left.chars()
                .zip(right.chars())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect()
        })
    }

    /// Row-wise longest common suffix.
    pub fn common_suffix(&self, other: &StringColumn) -> Result<StringColumn> {
        self.zip_strings(other, "suffix", |left, right| {
            let mut suffix: Vec<char> = left
                .chars()
                .rev()
                .zip(right.chars().rev())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect();
            suffix.reverse();
            suffix.into_iter().collect()
        })
    }

    fn zip_strings<F>(&self, other: &StringColumn, suffix: &str, op: F) -> Result<StringColumn>
    where
        F: Fn(&str, &str) -> String,
    {
        if self.size() != other.size() {
            return Err(Error::LengthMismatch {
                left: self.size(),
                right: other.size(),
            });
        }
        let mut column = StringColumn::new(&format!("{}{}[{}]", self.name, other.name, suffix));
        for row in 0..self.size() {
            match (self.get(row)?, other.get(row)?) {
                (Some(left), Some(right)) => {
                    column.append(&op(left, right))?;
                }
                _ => column.codes.append_missing(),
            }
        }
        Ok(column)
    }

    fn compare_codes(&self, a: i32, b: i32) -> Ordering {
        match (a.is_missing_value(), b.is_missing_value()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .dictionary
                .string_for(a)
                .cmp(&self.dictionary.string_for(b)),
        }
    }

    fn sort_codes(&mut self, descending: bool) {
        let mut codes = std::mem::take(&mut self.codes);
        codes.sort_by(|a, b| {
            let order = self.compare_codes(a, b);
            if descending {
                order.reverse()
            } else {
                order
            }
        });
        self.codes = codes;
    }
}

fn check_separator(separator: &str) -> Result<()> {
    if separator.is_empty() {
        return Err(Error::InvalidArgument(
            "token separator must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Trimmed, non-empty pieces of `value` between occurrences of `separator`.
fn split_tokens<'a>(value: &'a str, separator: &str) -> Vec<&'a str> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

impl fmt::Debug for StringColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringColumn")
            .field("name", &self.name)
            .field("size", &self.codes.len())
            .field("distinct", &self.dictionary.distinct_count())
            .finish()
    }
}

impl Column for StringColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::String
    }

    fn size(&self) -> usize {
        self.codes.len()
    }

    fn is_missing(&self, row: usize) -> Result<bool> {
        self.codes.is_missing(row)
    }

    fn count_missing(&self) -> usize {
        self.codes.count_missing()
    }

    fn count_unique(&self) -> usize {
        self.dictionary.distinct_count()
    }

    fn append_missing(&mut self) {
        self.codes.append_missing();
    }

    fn append_cell(&mut self, cell: &str, options: &ParseOptions) -> Result<()> {
        self.append_option(parse_string(cell, options))?;
        Ok(())
    }

    fn get_string(&self, row: usize) -> Result<String> {
        Ok(self.get(row)?.unwrap_or_default().to_string())
    }

    /// The row's dictionary key, big-endian.
    fn as_bytes(&self, row: usize) -> Result<Bytes> {
        self.codes.cell_bytes(row)
    }

    fn sort_ascending(&mut self) {
        self.sort_codes(false);
    }

    fn sort_descending(&mut self) {
        self.sort_codes(true);
    }

    fn clear(&mut self) {
        self.codes.clear();
        self.dictionary.clear();
    }

    fn missing(&self) -> Selection {
        self.codes.missing_rows()
    }

    fn not_missing(&self) -> Selection {
        self.codes.present_rows()
    }

    fn set_missing(&mut self, selection: &Selection) -> Result<()> {
        if let Some(max) = selection.max() {
            Error::check_index(max, self.size())?;
        }
        for row in selection {
            self.set_missing_at(row)?;
        }
        Ok(())
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
        Box::new(self.rebuild(self.codes.drop_selected(selection).into_vec()))
    }

    fn subset_column(&self, rows: &[usize]) -> Result<Box<dyn Column>> {
        Ok(Box::new(self.subset(rows)?))
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<()> {
        let other = same_type::<Self>(ColumnType::String, other)?;
        let remap = self.dictionary.merge(&other.dictionary)?;
        let mut codes = other.codes().to_vec();
        remap.apply(&mut codes);
        self.codes.extend_from_slice(&codes);
        Ok(())
    }

    fn append_row_from(&mut self, other: &dyn Column, row: usize) -> Result<()> {
        let other = same_type::<Self>(ColumnType::String, other)?;
        self.append_option(other.get(row)?)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl DictionaryBacked for StringColumn {
    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn key_at(&self, row: usize) -> Result<i32> {
        self.codes.get(row)
    }
}

impl SortableColumn for StringColumn {
    fn reorder(&mut self, rows: &[usize]) -> Result<()> {
        *self = self.subset(rows)?;
        Ok(())
    }
}

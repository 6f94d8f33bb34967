//! Dictionary encoding for string columns.
//!
//! Maps repeated strings to dense `i32` keys so a string column stores one
//! fixed-width code per row.
//!
//! Keys are assigned from a counter that starts at zero and only grows, in
//! first-seen order. A key whose last row is overwritten is removed from the
//! dictionary and never handed out again. The missing sentinel
//! (`i32::MIN`) is never a key.
//!
//! A `Dictionary` has a single owner. Key assignment is not safe under
//! concurrent appends; parallel ingestion builds one dictionary per worker
//! and folds them together with [`Dictionary::merge`], remapping each
//! shard's codes through the returned [`KeyRemap`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::missing::MissingValue;

/// Code stored in a row with no string.
pub const MISSING_KEY: i32 = i32::MISSING;

#[derive(Debug, Clone)]
struct Entry {
    value: Arc<str>,
    /// Number of rows currently using this key.
    count: usize,
}

/// Bidirectional string ↔ key map with per-key row counts.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    /// Indexed by key; `None` marks a retired key.
    entries: Vec<Option<Entry>>,
    keys: HashMap<Arc<str>, i32>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// The key for `value`, assigning the next key if it is unseen.
    ///
    /// Does not change row counts; see [`Dictionary::retain`].
    pub fn key_for(&mut self, value: &str) -> Result<i32> {
        if let Some(&key) = self.keys.get(value) {
            return Ok(key);
        }
        let next = self.entries.len();
        let key = i32::try_from(next).map_err(|_| {
            Error::InvalidArgument("dictionary key space exhausted".to_string())
        })?;
        let value: Arc<str> = Arc::from(value);
        self.entries.push(Some(Entry {
            value: value.clone(),
            count: 0,
        }));
        self.keys.insert(value, key);
        Ok(key)
    }

    /// The key for `value`, if present.
    pub fn get_key(&self, value: &str) -> Option<i32> {
        self.keys.get(value).copied()
    }

    /// The string for `key`, if the key is live.
    pub fn string_for(&self, key: i32) -> Option<&str> {
        self.entry(key).map(|e| e.value.as_ref())
    }

    /// Returns true if `value` has a live key.
    pub fn contains(&self, value: &str) -> bool {
        self.keys.contains_key(value)
    }

    /// Number of live keys.
    pub fn distinct_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if there are no live keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The next key that would be assigned.
    pub fn next_key(&self) -> i32 {
        self.entries.len() as i32
    }

    /// Live strings in key order, which is first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Iterate `(key, string)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> + '_ {
        self.entries.iter().enumerate().filter_map(|(key, entry)| {
            entry.as_ref().map(|e| (key as i32, e.value.as_ref()))
        })
    }

    /// Number of rows using `value`.
    pub fn count_occurrences(&self, value: &str) -> usize {
        self.get_key(value)
            .and_then(|key| self.entry(key))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Number of rows using `key`.
    pub fn count_for_key(&self, key: i32) -> usize {
        self.entry(key).map(|e| e.count).unwrap_or(0)
    }

    /// Record one more row using `key`.
    pub fn retain(&mut self, key: i32) {
        if let Some(entry) = self.entry_mut(key) {
            entry.count += 1;
        }
    }

    /// Record one fewer row using `key`, retiring the key at zero.
    pub fn release(&mut self, key: i32) {
        let retire = match self.entry_mut(key) {
            Some(entry) => {
                entry.count = entry.count.saturating_sub(1);
                entry.count == 0
            }
            None => false,
        };
        if retire {
            self.retire(key);
        }
    }

    /// Intern `value` and count one row for it.
    pub fn encode(&mut self, value: &str) -> Result<i32> {
        let key = self.key_for(value)?;
        self.retain(key);
        Ok(key)
    }

    /// Zero every row count, keeping all keys live until the next
    /// [`Dictionary::compact`].
    pub fn reset_counts(&mut self) {
        for entry in self.entries.iter_mut().flatten() {
            entry.count = 0;
        }
    }

    /// Retire keys that no row uses.
    pub fn compact(&mut self) {
        let unused: Vec<i32> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, Some(entry) if entry.count == 0))
            .map(|(key, _)| key as i32)
            .collect();
        for key in unused {
            self.retire(key);
        }
    }

    /// Remove every key and reset the counter.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
    }

    /// Fold `other` into this dictionary.
    ///
    /// Strings already present keep their key; new strings get fresh keys
    /// from this dictionary's counter. Row counts are added. The returned
    /// remap translates `other`'s codes into this dictionary's codes.
    pub fn merge(&mut self, other: &Dictionary) -> Result<KeyRemap> {
        let mut mapping = vec![MISSING_KEY; other.entries.len()];
        let mut added = 0usize;
        for (old_key, value) in other.iter() {
            if !self.contains(value) {
                added += 1;
            }
            let new_key = self.key_for(value)?;
            if let (Some(entry), Some(source)) = (self.entry_mut(new_key), other.entry(old_key)) {
                entry.count += source.count;
            }
            mapping[old_key as usize] = new_key;
        }
        debug!(
            merged = other.distinct_count(),
            added,
            distinct = self.distinct_count(),
            "Merged dictionary shard"
        );
        Ok(KeyRemap { mapping })
    }

    fn entry(&self, key: i32) -> Option<&Entry> {
        if key < 0 {
            return None;
        }
        self.entries.get(key as usize).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, key: i32) -> Option<&mut Entry> {
        if key < 0 {
            return None;
        }
        self.entries.get_mut(key as usize).and_then(Option::as_mut)
    }

    fn retire(&mut self, key: i32) {
        if let Some(slot) = self.entries.get_mut(key as usize) {
            if let Some(entry) = slot.take() {
                self.keys.remove(&entry.value);
            }
        }
    }
}

/// Translation of one dictionary's keys into another's, produced by
/// [`Dictionary::merge`].
#[derive(Debug, Clone)]
pub struct KeyRemap {
    mapping: Vec<i32>,
}

impl KeyRemap {
    /// The merged key for `key`. The missing code maps to itself.
    pub fn map(&self, key: i32) -> i32 {
        if key < 0 {
            return MISSING_KEY;
        }
        self.mapping
            .get(key as usize)
            .copied()
            .unwrap_or(MISSING_KEY)
    }

    /// Rewrite a slice of codes in place.
    pub fn apply(&self, codes: &mut [i32]) {
        for code in codes {
            *code = self.map(*code);
        }
    }
}

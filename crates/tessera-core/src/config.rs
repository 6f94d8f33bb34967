//! Cell parsing configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Text tokens read as a missing cell.
pub const DEFAULT_MISSING_TOKENS: &[&str] = &["", "NaN", "*", "NA", "null"];

/// Text tokens read as `true` in a boolean column.
pub const DEFAULT_TRUE_TOKENS: &[&str] = &["T", "t", "Y", "y", "TRUE", "true", "True", "1"];

/// Text tokens read as `false` in a boolean column.
pub const DEFAULT_FALSE_TOKENS: &[&str] = &["F", "f", "N", "n", "FALSE", "false", "False", "0"];

/// Date formats tried in order, as chrono format strings.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Time formats tried in order.
pub const DEFAULT_TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%H%M%S",
];

/// Date-time formats tried in order.
pub const DEFAULT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y%m%d%H%M%S",
];

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// Options controlling how text cells become column values.
///
/// Used by every `append_cell`. Formats are chrono `strftime` patterns and
/// are tried in order; the first that parses wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Tokens that append a missing value instead of failing.
    pub missing_tokens: Vec<String>,

    /// Tokens read as `true`.
    pub true_tokens: Vec<String>,

    /// Tokens read as `false`.
    pub false_tokens: Vec<String>,

    /// Accepted date formats.
    pub date_formats: Vec<String>,

    /// Accepted time formats.
    pub time_formats: Vec<String>,

    /// Accepted date-time formats. Also used for instants without an offset,
    /// which are read as UTC.
    pub datetime_formats: Vec<String>,

    /// Separator between the two ends of a date range.
    pub date_range_separator: String,

    /// Strip surrounding whitespace before matching tokens or formats.
    pub trim_whitespace: bool,

    /// Grouping character removed from numeric cells before parsing, so
    /// `1,234` reads as `1234`.
    pub grouping_separator: Option<char>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            missing_tokens: owned(DEFAULT_MISSING_TOKENS),
            true_tokens: owned(DEFAULT_TRUE_TOKENS),
            false_tokens: owned(DEFAULT_FALSE_TOKENS),
            date_formats: owned(DEFAULT_DATE_FORMATS),
            time_formats: owned(DEFAULT_TIME_FORMATS),
            datetime_formats: owned(DEFAULT_DATETIME_FORMATS),
            date_range_separator: "/".to_string(),
            trim_whitespace: true,
            grouping_separator: Some(','),
        }
    }
}

impl ParseOptions {
    /// Load options from JSON. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the options to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace the missing tokens.
    pub fn with_missing_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Add one missing token.
    pub fn with_missing_token(mut self, token: impl Into<String>) -> Self {
        self.missing_tokens.push(token.into());
        self
    }

    /// Replace the boolean tokens.
    pub fn with_boolean_tokens<I, J, S>(mut self, true_tokens: I, false_tokens: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.true_tokens = true_tokens.into_iter().map(Into::into).collect();
        self.false_tokens = false_tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Try `format` before the configured date formats.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_formats.insert(0, format.into());
        self
    }

    /// Try `format` before the configured time formats.
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_formats.insert(0, format.into());
        self
    }

    /// Try `format` before the configured date-time formats.
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_formats.insert(0, format.into());
        self
    }

    /// Set the date range separator.
    pub fn with_date_range_separator(mut self, separator: impl Into<String>) -> Self {
        self.date_range_separator = separator.into();
        self
    }

    /// Set whether surrounding whitespace is stripped.
    pub fn with_trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    /// Set or clear the numeric grouping separator.
    pub fn with_grouping_separator(mut self, separator: Option<char>) -> Self {
        self.grouping_separator = separator;
        self
    }

    /// The cell text after optional trimming.
    pub fn normalize<'a>(&self, cell: &'a str) -> &'a str {
        if self.trim_whitespace {
            cell.trim()
        } else {
            cell
        }
    }

    /// Returns true if `cell` is a missing token.
    pub fn is_missing_token(&self, cell: &str) -> bool {
        let cell = self.normalize(cell);
        self.missing_tokens.iter().any(|t| t == cell)
    }

    /// Returns true if `cell` is a true token.
    pub fn is_true(&self, cell: &str) -> bool {
        let cell = self.normalize(cell);
        self.true_tokens.iter().any(|t| t == cell)
    }

    /// Returns true if `cell` is a false token.
    pub fn is_false(&self, cell: &str) -> bool {
        let cell = self.normalize(cell);
        self.false_tokens.iter().any(|t| t == cell)
    }
}

//! Tuple tokenizer for `INSERT ... VALUES (...)` statements.
//!
//! This is not a SQL parser. It understands exactly the literal subset a
//! MySQL dump writes: `NULL`, single-quoted strings with backslash escapes,
//! and bare tokens (numbers, words).

use crate::error::{HrError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref VALUES_CLAUSE: Regex =
        Regex::new(r"(?is)VALUES\s*(\(.*\))\s*;?\s*$").expect("valid VALUES regex");
}

/// One scalar field of a dump row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    /// A quoted string with the quotes stripped and `\'` unescaped.
    Text(String),
    /// An unquoted token, trimmed (numbers, bare words).
    Raw(String),
}

impl SqlValue {
    /// Textual content of the field; `None` for `NULL`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Null => None,
            SqlValue::Text(s) | SqlValue::Raw(s) => Some(s.as_str()),
        }
    }

    fn from_field(field: &str) -> Self {
        if field == "NULL" {
            SqlValue::Null
        } else if field.len() >= 2 && field.starts_with('\'') && field.ends_with('\'') {
            SqlValue::Text(field[1..field.len() - 1].replace("\\'", "'"))
        } else {
            SqlValue::Raw(field.to_string())
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Text(s) | SqlValue::Raw(s) => write!(f, "{}", s),
        }
    }
}

/// Positional fields of one dump row, in the table's column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowTuple(Vec<SqlValue>);

impl RowTuple {
    pub fn new(fields: Vec<SqlValue>) -> Self {
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.0.get(index)
    }

    /// Text at `index`, `None` when the field is `NULL` or absent.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(SqlValue::as_str)
    }

    /// Field at `index`, or a row error naming the missing column.
    pub fn require(&self, index: usize, column: &str) -> Result<&SqlValue> {
        self.get(index).ok_or_else(|| {
            HrError::Row(format!(
                "row has {} fields, missing {} at index {}",
                self.len(),
                column,
                index
            ))
        })
    }

    pub fn fields(&self) -> &[SqlValue] {
        &self.0
    }
}

/// Extract every row of an `INSERT ... VALUES` statement.
///
/// Statements without a `VALUES (...)` clause (DDL, `SET`, comments)
/// produce no rows.
pub fn parse_insert_values(statement: &str) -> Vec<RowTuple> {
    let Some(caps) = VALUES_CLAUSE.captures(statement) else {
        return Vec::new();
    };
    let Some(values) = caps.get(1) else {
        return Vec::new();
    };
    let values = values.as_str();
    // The capture always starts with '(' and ends with ')'.
    let inner = &values[1..values.len() - 1];

    split_rows(inner)
        .into_iter()
        .map(|segment| {
            RowTuple::new(
                split_fields(segment)
                    .into_iter()
                    .map(SqlValue::from_field)
                    .collect(),
            )
        })
        .collect()
}

/// A quote directly after a backslash is a literal quote, never a toggle.
fn is_escaped(bytes: &[u8], quote: usize) -> bool {
    quote > 0 && bytes[quote - 1] == b'\\'
}

/// Split the tuple list on `),(` (whitespace allowed around the comma),
/// ignoring delimiters that occur inside quoted strings.
fn split_rows(inner: &str) -> Vec<&str> {
    let bytes = inner.as_bytes();
    let mut rows = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' if !is_escaped(bytes, i) => in_quote = !in_quote,
            b')' if !in_quote => {
                if let Some(next_start) = row_boundary_end(bytes, i) {
                    rows.push(&inner[start..i]);
                    start = next_start;
                    i = next_start;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    rows.push(&inner[start..]);
    rows
}

/// If `)` at `close` opens a `)\s*,\s*(` boundary, return the index just
/// past the `(`.
fn row_boundary_end(bytes: &[u8], close: usize) -> Option<usize> {
    let mut j = close + 1;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    if bytes.get(j) != Some(&b',') {
        return None;
    }
    j += 1;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    if bytes.get(j) != Some(&b'(') {
        return None;
    }
    Some(j + 1)
}

/// Split one row on unquoted commas; fields come back trimmed.
fn split_fields(row: &str) -> Vec<&str> {
    let bytes = row.as_bytes();
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' if !is_escaped(bytes, i) => in_quote = !in_quote,
            b',' if !in_quote => {
                fields.push(row[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    // A trailing empty remainder (e.g. after a final comma) is not a field.
    if start < bytes.len() {
        fields.push(row[start..].trim());
    }
    fields
}

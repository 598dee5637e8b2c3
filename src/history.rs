//! Temporal reconciliation of history-bearing dump tables.
//!
//! Tables such as `dept_emp` and `titles` keep one row per validity
//! interval. The reconciler resolves them to a single current value per key:
//! an open-ended row wins outright, otherwise the row with the greatest
//! date-like field.

use crate::dump::RowTuple;
use crate::error::{HrError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// End date the employees dataset uses for "still current".
pub const OPEN_ENDED_SENTINEL: &str = "9999-01-01";

lazy_static! {
    static ref DATE_LIKE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid date regex");
}

/// Column positions of a history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryColumns {
    pub key: usize,
    pub value: usize,
    pub validity_end: Option<usize>,
}

impl HistoryColumns {
    /// `(emp_no, <value>, from_date, to_date)`, the layout of both
    /// `dept_emp` and `titles`.
    pub const EMPLOYEE_HISTORY: HistoryColumns = HistoryColumns {
        key: 0,
        value: 1,
        validity_end: Some(3),
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub key: String,
    pub value: String,
    /// Rightmost date-like field of the row; compared by the latest-date
    /// fallback.
    pub reference_date: Option<String>,
    pub validity_end: Option<String>,
}

impl HistoryRecord {
    pub fn from_row(row: &RowTuple, columns: &HistoryColumns) -> Result<Self> {
        let key = row
            .require(columns.key, "key")?
            .as_str()
            .ok_or_else(|| HrError::Row("history key is NULL".to_string()))?;
        let value = row
            .require(columns.value, "value")?
            .as_str()
            .ok_or_else(|| HrError::Row(format!("history value for {} is NULL", key)))?;
        let validity_end = columns
            .validity_end
            .and_then(|index| row.text(index))
            .map(str::to_string);

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            reference_date: last_date_field(row).map(str::to_string),
            validity_end,
        })
    }

    pub fn is_open_ended(&self, sentinel: &str) -> bool {
        self.validity_end.as_deref() == Some(sentinel)
    }
}

/// Scan the row right to left and return the first date-shaped field.
fn last_date_field(row: &RowTuple) -> Option<&str> {
    row.fields()
        .iter()
        .rev()
        .filter_map(|field| field.as_str())
        .find(|text| DATE_LIKE.is_match(text))
}

pub struct TemporalReconciler {
    columns: HistoryColumns,
    sentinel: String,
}

impl TemporalReconciler {
    pub fn new(columns: HistoryColumns) -> Self {
        Self {
            columns,
            sentinel: OPEN_ENDED_SENTINEL.to_string(),
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Resolve raw rows. Rows that cannot form a record are skipped.
    pub fn resolve<I>(&self, rows: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = RowTuple>,
    {
        let records = rows.into_iter().filter_map(|row| {
            match HistoryRecord::from_row(&row, &self.columns) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Skipping history row: {}", e);
                    None
                }
            }
        });
        self.resolve_records(records)
    }

    pub fn resolve_records<I>(&self, records: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = HistoryRecord>,
    {
        let mut by_key: HashMap<String, Vec<HistoryRecord>> = HashMap::new();
        for record in records {
            by_key.entry(record.key.clone()).or_default().push(record);
        }

        by_key
            .into_iter()
            .filter_map(|(key, history)| {
                self.select(&history)
                    .map(|current| (key, current.value.clone()))
            })
            .collect()
    }

    /// Pick the current record for one key, if any can be determined.
    pub fn select<'a>(&self, history: &'a [HistoryRecord]) -> Option<&'a HistoryRecord> {
        if let Some(open) = history.iter().find(|r| r.is_open_ended(&self.sentinel)) {
            return Some(open);
        }

        // ISO dates compare chronologically as strings; ties keep the
        // earliest row.
        let mut latest: Option<(&str, &HistoryRecord)> = None;
        for record in history {
            let Some(date) = record.reference_date.as_deref() else {
                continue;
            };
            match latest {
                Some((best, _)) if date <= best => {}
                _ => latest = Some((date, record)),
            }
        }
        latest.map(|(_, record)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::SqlValue;

    fn row(fields: &[&str]) -> RowTuple {
        RowTuple::new(
            fields
                .iter()
                .map(|f| {
                    if *f == "NULL" {
                        SqlValue::Null
                    } else {
                        SqlValue::Text(f.to_string())
                    }
                })
                .collect(),
        )
    }

    fn reconciler() -> TemporalReconciler {
        TemporalReconciler::new(HistoryColumns::EMPLOYEE_HISTORY)
    }

    #[test]
    fn test_open_ended_row_wins() {
        let resolved = reconciler().resolve(vec![
            row(&["K1", "V1", "1995-01-01", "9999-01-01"]),
            row(&["K1", "V2", "1990-01-01", "2002-01-01"]),
        ]);
        assert_eq!(resolved.get("K1").map(String::as_str), Some("V1"));
    }

    #[test]
    fn test_latest_date_fallback() {
        let resolved = reconciler().resolve(vec![
            row(&["K2", "V1", "1990-01-01", "1998-01-01"]),
            row(&["K2", "V2", "1998-01-01", "2005-01-01"]),
        ]);
        assert_eq!(resolved.get("K2").map(String::as_str), Some("V2"));
    }

    #[test]
    fn test_first_open_ended_row_wins_when_several() {
        let resolved = reconciler().resolve(vec![
            row(&["K", "A", "1990-01-01", "9999-01-01"]),
            row(&["K", "B", "1991-01-01", "9999-01-01"]),
        ]);
        assert_eq!(resolved["K"], "A");
    }

    #[test]
    fn test_date_tie_keeps_first_row() {
        let resolved = reconciler().resolve(vec![
            row(&["K", "A", "1990-01-01", "2000-01-01"]),
            row(&["K", "B", "1991-01-01", "2000-01-01"]),
        ]);
        assert_eq!(resolved["K"], "A");
    }

    #[test]
    fn test_key_without_dates_is_absent() {
        let resolved = reconciler().resolve(vec![row(&["K", "A", "n/a", "NULL"])]);
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let resolved = reconciler().resolve(vec![
            row(&["K3"]),
            row(&["NULL", "X", "1990-01-01", "9999-01-01"]),
            row(&["K4", "V", "1990-01-01", "9999-01-01"]),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["K4"], "V");
    }

    #[test]
    fn test_rightmost_date_is_the_reference() {
        let record = HistoryRecord::from_row(
            &row(&["K", "V", "1990-01-01", "2001-05-05"]),
            &HistoryColumns::EMPLOYEE_HISTORY,
        )
        .unwrap();
        assert_eq!(record.reference_date.as_deref(), Some("2001-05-05"));
        assert!(!record.is_open_ended(OPEN_ENDED_SENTINEL));
    }

    #[test]
    fn test_custom_sentinel() {
        let resolved = reconciler().with_sentinel("9999-12-31").resolve(vec![
            row(&["K", "A", "1990-01-01", "9999-12-31"]),
            row(&["K", "B", "1991-01-01", "9999-01-01"]),
        ]);
        assert_eq!(resolved["K"], "A");
    }
}

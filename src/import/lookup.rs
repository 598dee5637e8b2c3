//! Lookup tables built before employees are streamed.
//!
//! Each table is built once from its dump and is read-only afterwards.

use crate::dump::{parse_insert_values, RowTuple, StatementStream};
use crate::error::Result;
use crate::history::{HistoryColumns, TemporalReconciler};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Department code to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentMap(HashMap<String, String>);

impl DepartmentMap {
    /// Read `(dept_no, dept_name)` rows from the departments dump. Only
    /// statements inserting into a `departments` table contribute.
    pub fn from_dump(path: &Path) -> Result<Self> {
        let mut names = HashMap::new();
        for statement in StatementStream::open(path)? {
            let statement = statement?;
            if !is_departments_insert(&statement) {
                continue;
            }
            for row in parse_insert_values(&statement) {
                insert_department(&mut names, &row);
            }
        }
        Ok(Self(names))
    }

    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RowTuple>,
    {
        let mut names = HashMap::new();
        for row in rows {
            insert_department(&mut names, &row);
        }
        Self(names)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Case-sensitive, the way mysqldump writes it.
fn is_departments_insert(statement: &str) -> bool {
    statement.contains("INSERT INTO") && statement.contains("departments")
}

fn insert_department(names: &mut HashMap<String, String>, row: &RowTuple) {
    if row.len() < 2 {
        debug!("Skipping department row with {} fields", row.len());
        return;
    }
    let Some(code) = row.text(0) else {
        return;
    };
    match row.text(1) {
        Some(name) => {
            names.insert(code.to_string(), name.to_string());
        }
        None => {
            names.remove(code);
        }
    }
}

/// How a history row qualifies as current when the simplified rules are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentRule {
    /// End date equals the open-ended sentinel.
    OpenEnded,
    /// End date is absent, `NULL`, or the sentinel.
    OpenEndedOrMissing,
}

impl CurrentRule {
    fn accepts(self, validity_end: Option<&str>, sentinel: &str) -> bool {
        match self {
            CurrentRule::OpenEnded => validity_end == Some(sentinel),
            CurrentRule::OpenEndedOrMissing => validity_end.map_or(true, |end| end == sentinel),
        }
    }
}

/// Employee identifier to resolved current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentValueMap(HashMap<String, String>);

/// `emp_no` to current `dept_no`.
pub type CurrentAssignmentMap = CurrentValueMap;

/// `emp_no` to current title.
pub type CurrentTitleMap = CurrentValueMap;

impl CurrentValueMap {
    /// Keep every row the rule accepts; a later accepted row for the same
    /// key replaces an earlier one, and an accepted `NULL` value clears it.
    /// Rows too short to carry a key and value are skipped. Read errors
    /// are returned.
    pub fn from_rule<I>(
        rows: I,
        columns: &HistoryColumns,
        rule: CurrentRule,
        sentinel: &str,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Result<RowTuple>>,
    {
        let mut current = HashMap::new();
        let mut skipped = 0usize;
        for row in rows {
            let row = row?;
            let key = match row.require(columns.key, "key") {
                Ok(value) => value.as_str(),
                Err(e) => {
                    debug!("Skipping history row: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            let value = match row.require(columns.value, "value") {
                Ok(value) => value.as_str(),
                Err(e) => {
                    debug!("Skipping history row: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            let Some(key) = key else {
                skipped += 1;
                continue;
            };

            let validity_end = columns.validity_end.and_then(|index| row.text(index));
            if !rule.accepts(validity_end, sentinel) {
                continue;
            }
            match value {
                Some(value) => {
                    current.insert(key.to_string(), value.to_string());
                }
                None => {
                    current.remove(key);
                }
            }
        }
        if skipped > 0 {
            debug!("Skipped {} malformed history rows", skipped);
        }
        Ok(Self(current))
    }

    /// Resolve with the full reconciler: open-ended first, otherwise the
    /// latest dated row.
    pub fn reconciled<I>(rows: I, reconciler: &TemporalReconciler) -> Result<Self>
    where
        I: IntoIterator<Item = Result<RowTuple>>,
    {
        let rows = rows.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(Self(reconciler.resolve(rows)))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for CurrentValueMap {
    fn from(values: HashMap<String, String>) -> Self {
        Self(values)
    }
}

/// The three lookups the employee join reads from.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub departments: DepartmentMap,
    pub assignments: CurrentAssignmentMap,
    pub titles: CurrentTitleMap,
}

impl LookupTables {
    /// Department name for an employee, through its current department code.
    pub fn department_for(&self, employee_id: &str) -> Option<&str> {
        self.assignments
            .get(employee_id)
            .and_then(|code| self.departments.name(code))
    }

    pub fn title_for(&self, employee_id: &str) -> Option<&str> {
        self.titles.get(employee_id)
    }
}

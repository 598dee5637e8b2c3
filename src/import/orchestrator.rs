//! Import Orchestrator - loads the employees sample dataset into the
//! `employees` table.
//!
//! Four phases, strictly in order: department names, current department
//! assignments, current titles, then the employee stream joined against
//! those lookups and upserted in batches. A failed phase never rolls back
//! an earlier one; batches already committed stay committed.

use super::lookup::{CurrentRule, CurrentValueMap, DepartmentMap, LookupTables};
use crate::db::{EmployeeRecord, EmployeeStore};
use crate::dump::{read_rows, RowTuple};
use crate::error::{HrError, Result};
use crate::history::{HistoryColumns, TemporalReconciler, OPEN_ENDED_SENTINEL};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Domain of the synthetic `<emp_no>@<domain>` email addresses.
pub const EMAIL_DOMAIN: &str = "example.local";

pub const DEPARTMENTS_DUMP: &str = "load_departments.dump";
pub const DEPT_EMP_DUMP: &str = "load_dept_emp.dump";
pub const TITLES_DUMP: &str = "load_titles.dump";
pub const EMPLOYEES_DUMP: &str = "load_employees.dump";

// Column positions in `employees`:
// (emp_no, birth_date, first_name, last_name, gender, hire_date).
const EMP_NO: usize = 0;
const FIRST_NAME: usize = 2;
const LAST_NAME: usize = 3;
const HIRE_DATE: usize = 5;

/// The four dump files of one dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFiles {
    pub departments: PathBuf,
    pub dept_emp: PathBuf,
    pub titles: PathBuf,
    pub employees: PathBuf,
}

impl DumpFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            departments: dir.join(DEPARTMENTS_DUMP),
            dept_emp: dir.join(DEPT_EMP_DUMP),
            titles: dir.join(TITLES_DUMP),
            employees: dir.join(EMPLOYEES_DUMP),
        }
    }
}

/// Which rules decide an employee's current department and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryResolution {
    /// Assignments need the open-ended sentinel; titles accept the
    /// sentinel or a missing end date. Never falls back to dates.
    #[default]
    Simplified,
    /// Both go through the temporal reconciler with its latest-date fallback.
    Reconciled,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub batch_size: usize,
    pub resolution: HistoryResolution,
    pub sentinel: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            resolution: HistoryResolution::Simplified,
            sentinel: OPEN_ENDED_SENTINEL.to_string(),
        }
    }
}

/// Counters for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub departments: usize,
    pub assignments: usize,
    pub titles: usize,
    pub rows_read: u64,
    pub rows_skipped: u64,
    /// Rows handed to the store, including ones it ignored as duplicates.
    pub rows_submitted: u64,
    /// Rows the store reports as newly inserted.
    pub rows_inserted: u64,
    pub batches: u64,
}

pub struct ImportOrchestrator<'a> {
    store: &'a dyn EmployeeStore,
    options: ImportOptions,
}

impl<'a> ImportOrchestrator<'a> {
    pub fn new(store: &'a dyn EmployeeStore, options: ImportOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(HrError::Config("batch size must be at least 1".to_string()));
        }
        Ok(Self { store, options })
    }

    /// Run all four phases against the dumps in `dir`.
    pub async fn run(&self, dir: &Path) -> Result<ImportSummary> {
        if !dir.is_dir() {
            return Err(HrError::MissingSource(dir.display().to_string()));
        }
        let files = DumpFiles::in_dir(dir);

        let lookups = self.build_lookups(&files)?;
        let mut summary = ImportSummary {
            departments: lookups.departments.len(),
            assignments: lookups.assignments.len(),
            titles: lookups.titles.len(),
            ..Default::default()
        };

        self.import_employees(&files.employees, &lookups, &mut summary)
            .await?;
        Ok(summary)
    }

    /// Phases one to three.
    pub fn build_lookups(&self, files: &DumpFiles) -> Result<LookupTables> {
        info!("Loading departments from {}", files.departments.display());
        let departments = DepartmentMap::from_dump(&files.departments)?;
        info!("Loaded {} departments", departments.len());

        info!("Resolving current departments from {}", files.dept_emp.display());
        let assignments = self.current_values(&files.dept_emp, CurrentRule::OpenEnded)?;
        info!("Resolved {} current department assignments", assignments.len());

        info!("Resolving current titles from {}", files.titles.display());
        let titles = self.current_values(&files.titles, CurrentRule::OpenEndedOrMissing)?;
        info!("Resolved {} current titles", titles.len());

        Ok(LookupTables {
            departments,
            assignments,
            titles,
        })
    }

    fn current_values(&self, path: &Path, rule: CurrentRule) -> Result<CurrentValueMap> {
        let rows = read_rows(path)?;
        let columns = HistoryColumns::EMPLOYEE_HISTORY;
        match self.options.resolution {
            HistoryResolution::Simplified => {
                CurrentValueMap::from_rule(rows, &columns, rule, &self.options.sentinel)
            }
            HistoryResolution::Reconciled => {
                let reconciler =
                    TemporalReconciler::new(columns).with_sentinel(self.options.sentinel.clone());
                CurrentValueMap::reconciled(rows, &reconciler)
            }
        }
    }

    /// Phase four: stream employees, join, and upsert in batches.
    pub async fn import_employees(
        &self,
        path: &Path,
        lookups: &LookupTables,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        info!("Importing employees from {}", path.display());
        let mut batch = Vec::with_capacity(self.options.batch_size);

        for row in read_rows(path)? {
            let row = row?;
            summary.rows_read += 1;
            let now = Utc::now().naive_utc();
            match employee_from_row(&row, lookups, now) {
                Ok(record) => batch.push(record),
                Err(e) => {
                    warn!("Skipping row due to parse error: {}", e);
                    summary.rows_skipped += 1;
                    continue;
                }
            }

            if batch.len() >= self.options.batch_size {
                self.flush(&mut batch, summary).await?;
                let line = progress_line(summary);
                info!("{}", line);
                println!("{}", line);
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, summary).await?;
        }

        info!(
            "Import complete. Total inserted (approx): {} ({} new, {} rows skipped)",
            summary.rows_submitted, summary.rows_inserted, summary.rows_skipped
        );
        Ok(())
    }

    async fn flush(&self, batch: &mut Vec<EmployeeRecord>, summary: &mut ImportSummary) -> Result<()> {
        let inserted = self.store.upsert_batch(batch).await?;
        summary.rows_submitted += batch.len() as u64;
        summary.rows_inserted += inserted;
        summary.batches += 1;
        batch.clear();
        Ok(())
    }
}

/// Operator-facing progress after each full batch.
pub fn progress_line(summary: &ImportSummary) -> String {
    format!(
        "Inserted {} employees... ({} new)",
        summary.rows_submitted, summary.rows_inserted
    )
}

/// Join one `employees` row against the lookups.
///
/// `now` becomes `created_at` when the row carries no hire date.
pub fn employee_from_row(
    row: &RowTuple,
    lookups: &LookupTables,
    now: NaiveDateTime,
) -> Result<EmployeeRecord> {
    let employee_id = required_text(row, EMP_NO, "emp_no")?;
    let first_name = required_text(row, FIRST_NAME, "first_name")?;
    let last_name = required_text(row, LAST_NAME, "last_name")?;

    let hire_date = row
        .text(HIRE_DATE)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                HrError::Row(format!("employee {}: bad hire_date {:?}: {}", employee_id, raw, e))
            })
        })
        .transpose()?;
    let created_at = hire_date
        .map(|date| date.and_time(NaiveTime::MIN))
        .unwrap_or(now);

    Ok(EmployeeRecord {
        email: format!("{}@{}", employee_id, EMAIL_DOMAIN),
        department: lookups.department_for(employee_id).map(str::to_string),
        position: lookups.title_for(employee_id).map(str::to_string),
        employee_id: employee_id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        phone: None,
        address: None,
        // The dataset has no activity status.
        is_active: true,
        hire_date,
        created_at,
    })
}

fn required_text<'r>(row: &'r RowTuple, index: usize, column: &str) -> Result<&'r str> {
    row.require(index, column)?
        .as_str()
        .ok_or_else(|| HrError::Row(format!("{} is NULL", column)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEmployeeStore;
    use crate::dump::parse_insert_values;
    use std::collections::HashMap;

    fn lookups() -> LookupTables {
        let departments = DepartmentMap::from_rows(parse_insert_values(
            "INSERT INTO `departments` VALUES ('d005','Development');",
        ));
        let assignments: HashMap<_, _> = [("10001".to_string(), "d005".to_string())].into();
        let titles: HashMap<_, _> = [("10001".to_string(), "Senior Engineer".to_string())].into();
        LookupTables {
            departments,
            assignments: assignments.into(),
            titles: titles.into(),
        }
    }

    fn employee_row(stmt: &str) -> RowTuple {
        parse_insert_values(stmt).remove(0)
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_employee_join() {
        let row = employee_row(
            "INSERT INTO `employees` VALUES (10001,'1953-09-02','Georgi','Facello','M','1986-06-26');",
        );
        let record = employee_from_row(&row, &lookups(), fixed_now()).unwrap();
        assert_eq!(record.employee_id, "10001");
        assert_eq!(record.email, "10001@example.local");
        assert_eq!(record.department.as_deref(), Some("Development"));
        assert_eq!(record.position.as_deref(), Some("Senior Engineer"));
        assert!(record.is_active);
        assert_eq!(record.hire_date, NaiveDate::from_ymd_opt(1986, 6, 26));
        assert_eq!(record.created_at.to_string(), "1986-06-26 00:00:00");
    }

    #[test]
    fn test_unmapped_employee_keeps_empty_fields() {
        let row = employee_row(
            "INSERT INTO `employees` VALUES (10002,'1964-06-02','Bezalel','Simmel','F','1985-11-21');",
        );
        let record = employee_from_row(&row, &lookups(), fixed_now()).unwrap();
        assert_eq!(record.department, None);
        assert_eq!(record.position, None);
    }

    #[test]
    fn test_missing_hire_date_uses_now() {
        let row = employee_row("INSERT INTO `employees` VALUES (10003,'1959-12-03','Parto','Bamford','M');");
        let record = employee_from_row(&row, &lookups(), fixed_now()).unwrap();
        assert_eq!(record.hire_date, None);
        assert_eq!(record.created_at, fixed_now());
    }

    #[test]
    fn test_truncated_row_is_an_error() {
        let row = employee_row("INSERT INTO `employees` VALUES (10004,'1954-05-01','Chirstian');");
        assert!(matches!(
            employee_from_row(&row, &lookups(), fixed_now()),
            Err(HrError::Row(_))
        ));
    }

    #[test]
    fn test_bad_hire_date_is_an_error() {
        let row = employee_row(
            "INSERT INTO `employees` VALUES (10005,'1955-01-21','Kyoichi','Maliniak','M','soon');",
        );
        assert!(employee_from_row(&row, &lookups(), fixed_now()).is_err());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let store = MemoryEmployeeStore::new();
        let options = ImportOptions {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            ImportOrchestrator::new(&store, options),
            Err(HrError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_directory_touches_nothing() {
        let store = MemoryEmployeeStore::new();
        let orchestrator = ImportOrchestrator::new(&store, ImportOptions::default()).unwrap();
        let result = orchestrator.run(Path::new("/no/such/test_db")).await;
        assert!(matches!(result, Err(HrError::MissingSource(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_progress_line_reports_submitted_and_new() {
        let summary = ImportSummary {
            rows_submitted: 2000,
            rows_inserted: 1500,
            ..Default::default()
        };
        assert_eq!(progress_line(&summary), "Inserted 2000 employees... (1500 new)");
    }

    #[test]
    fn test_dump_file_names() {
        let files = DumpFiles::in_dir(Path::new("test_db"));
        assert_eq!(files.employees, Path::new("test_db/load_employees.dump"));
        assert_eq!(files.dept_emp, Path::new("test_db/load_dept_emp.dump"));
    }
}

use hr_cloud::db::{EmployeeStore, MemoryEmployeeStore};
use hr_cloud::import::{HistoryResolution, ImportOptions, ImportOrchestrator};
use hr_cloud::HrError;
use std::fs;
use std::path::Path;

const DEPARTMENTS: &str = "\
--  Departments
SET NAMES utf8mb4;
INSERT INTO `departments` VALUES ('d001','Marketing'),('d004','Production'),
('d005','Development');
";

const DEPT_EMP: &str = "\
INSERT INTO `dept_emp` VALUES (10001,'d005','1986-06-26','9999-01-01'),
(10002,'d001','1990-08-05','1995-01-01'),
(10002,'d004','1995-01-01','9999-01-01'),
(10003,'d004','1995-12-03','2000-01-01'),
(10003,'d001','2000-01-01','2002-06-01');
";

const TITLES: &str = "\
INSERT INTO `titles` VALUES (10001,'Senior Engineer','1986-06-26','9999-01-01'),
(10002,'Staff','1996-08-03','9999-01-01'),
(10003,'Engineer','1995-12-03','2001-01-01');
";

const EMPLOYEES: &str = "\
INSERT INTO `employees` VALUES (10001,'1953-09-02','Georgi','Facello','M','1986-06-26'),
(10002,'1964-06-02','Bezalel','Simmel','F','1985-11-21'),
(10003,'1959-12-03','Parto','Bamford','M','1986-08-28');
INSERT INTO `employees` VALUES (10004,'1954-05-01','Chirstian'),
(10005,'1955-01-21','Kyoichi','Maliniak','M','1989-09-12'),
(10006,'1953-04-20','Anneke','O\\'Preusig','F','1989-06-02');
";

fn write_dataset(dir: &Path) {
    fs::write(dir.join("load_departments.dump"), DEPARTMENTS).unwrap();
    fs::write(dir.join("load_dept_emp.dump"), DEPT_EMP).unwrap();
    fs::write(dir.join("load_titles.dump"), TITLES).unwrap();
    fs::write(dir.join("load_employees.dump"), EMPLOYEES).unwrap();
}

fn options(batch_size: usize) -> ImportOptions {
    ImportOptions {
        batch_size,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_import_joins_lookups() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let store = MemoryEmployeeStore::new();

    let orchestrator = ImportOrchestrator::new(&store, options(2)).unwrap();
    let summary = orchestrator.run(dir.path()).await.unwrap();

    assert_eq!(summary.departments, 3);
    assert_eq!(summary.assignments, 2);
    assert_eq!(summary.titles, 2);
    assert_eq!(summary.rows_read, 6);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.rows_submitted, 5);
    assert_eq!(summary.rows_inserted, 5);
    assert_eq!(summary.batches, 3);

    let georgi = store.get("10001").await.unwrap().unwrap();
    assert_eq!(georgi.department.as_deref(), Some("Development"));
    assert_eq!(georgi.position.as_deref(), Some("Senior Engineer"));
    assert_eq!(georgi.email, "10001@example.local");

    let bezalel = store.get("10002").await.unwrap().unwrap();
    assert_eq!(bezalel.department.as_deref(), Some("Production"));

    let anneke = store.get("10006").await.unwrap().unwrap();
    assert_eq!(anneke.last_name, "O'Preusig");
}

#[tokio::test]
async fn test_employee_without_mappings_is_still_inserted() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let store = MemoryEmployeeStore::new();

    ImportOrchestrator::new(&store, options(1000))
        .unwrap()
        .run(dir.path())
        .await
        .unwrap();

    // 10003 has only closed-ended history and 10005 has none at all.
    for id in ["10003", "10005"] {
        let employee = store.get(id).await.unwrap().unwrap();
        assert_eq!(employee.department, None);
        assert_eq!(employee.position, None);
        assert!(employee.is_active);
    }
}

#[tokio::test]
async fn test_truncated_row_does_not_stop_later_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let store = MemoryEmployeeStore::new();

    ImportOrchestrator::new(&store, options(1000))
        .unwrap()
        .run(dir.path())
        .await
        .unwrap();

    assert!(store.get("10004").await.unwrap().is_none());
    assert!(store.get("10005").await.unwrap().is_some());
    assert!(store.get("10006").await.unwrap().is_some());
}

#[tokio::test]
async fn test_second_run_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let store = MemoryEmployeeStore::new();
    let orchestrator = ImportOrchestrator::new(&store, options(2)).unwrap();

    orchestrator.run(dir.path()).await.unwrap();
    let after_first = store.count().await.unwrap();

    let second = orchestrator.run(dir.path()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), after_first);
    assert_eq!(second.rows_submitted, 5);
    assert_eq!(second.rows_inserted, 0);
}

#[tokio::test]
async fn test_reconciled_history_falls_back_to_latest_dates() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let store = MemoryEmployeeStore::new();
    let options = ImportOptions {
        resolution: HistoryResolution::Reconciled,
        ..Default::default()
    };

    let summary = ImportOrchestrator::new(&store, options)
        .unwrap()
        .run(dir.path())
        .await
        .unwrap();
    assert_eq!(summary.assignments, 3);
    assert_eq!(summary.titles, 3);

    let parto = store.get("10003").await.unwrap().unwrap();
    assert_eq!(parto.department.as_deref(), Some("Marketing"));
    assert_eq!(parto.position.as_deref(), Some("Engineer"));
}

#[tokio::test]
async fn test_missing_dump_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("load_departments.dump"), DEPARTMENTS).unwrap();
    let store = MemoryEmployeeStore::new();

    let result = ImportOrchestrator::new(&store, options(10))
        .unwrap()
        .run(dir.path())
        .await;
    assert!(matches!(result, Err(HrError::Io(_))));
    assert_eq!(store.count().await.unwrap(), 0);
}

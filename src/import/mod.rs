//! Import of the MySQL employees sample dataset.

pub mod lookup;
pub mod orchestrator;

pub use lookup::{
    CurrentAssignmentMap, CurrentRule, CurrentTitleMap, CurrentValueMap, DepartmentMap,
    LookupTables,
};
pub use orchestrator::{
    employee_from_row, DumpFiles, HistoryResolution, ImportOptions, ImportOrchestrator,
    ImportSummary, DEFAULT_BATCH_SIZE, EMAIL_DOMAIN,
};

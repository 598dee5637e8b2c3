//! Employee persistence.
//!
//! `EmployeeStore` is the write/read surface the importer and the HTTP API
//! share. `EmployeeRepository` talks to PostgreSQL; `MemoryEmployeeStore`
//! backs dry runs and tests.

pub mod connection;
pub mod employee_repo;
pub mod memory;

pub use connection::init_pool;
pub use employee_repo::EmployeeRepository;
pub use memory::MemoryEmployeeStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row of the `employees` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmployeeRecord {
    pub employee_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub hire_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Insert the rows, silently ignoring identifiers that already exist.
    /// The whole batch commits or fails together. Returns rows newly inserted.
    async fn upsert_batch(&self, rows: &[EmployeeRecord]) -> Result<u64>;

    async fn count(&self) -> Result<i64>;

    /// Employees ordered by identifier.
    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<EmployeeRecord>>;

    async fn get(&self, employee_id: &str) -> Result<Option<EmployeeRecord>>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<()> {
        self.count().await.map(|_| ())
    }
}

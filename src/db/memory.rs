//! In-memory employee store with the same conflict-ignoring semantics as
//! the Postgres table.

use super::{EmployeeRecord, EmployeeStore};
use crate::error::{HrError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryEmployeeStore {
    rows: Mutex<BTreeMap<String, EmployeeRecord>>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, EmployeeRecord>>> {
        self.rows
            .lock()
            .map_err(|_| HrError::Database("employee store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn upsert_batch(&self, rows: &[EmployeeRecord]) -> Result<u64> {
        let mut table = self.lock()?;
        let mut inserted = 0;
        for row in rows {
            if !table.contains_key(&row.employee_id) {
                table.insert(row.employee_id.clone(), row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock()?.len() as i64)
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<EmployeeRecord>> {
        Ok(self
            .lock()?
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, employee_id: &str) -> Result<Option<EmployeeRecord>> {
        Ok(self.lock()?.get(employee_id).cloned())
    }
}

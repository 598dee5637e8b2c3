//! PostgreSQL-backed employee store

use super::{EmployeeRecord, EmployeeStore};
use crate::error::{HrError, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

const EMPLOYEE_COLUMNS: &str = "employee_id, email, first_name, last_name, department, \
     position, phone, address, is_active, hire_date, created_at";

const FIELDS_PER_ROW: usize = 11;

/// Postgres accepts at most 65535 bind parameters per statement.
pub const MAX_ROWS_PER_STATEMENT: usize = 65_535 / FIELDS_PER_ROW;

pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn insert_statement(rows: &[EmployeeRecord]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("INSERT INTO employees ({}) ", EMPLOYEE_COLUMNS));
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.employee_id.clone())
            .push_bind(row.email.clone())
            .push_bind(row.first_name.clone())
            .push_bind(row.last_name.clone())
            .push_bind(row.department.clone())
            .push_bind(row.position.clone())
            .push_bind(row.phone.clone())
            .push_bind(row.address.clone())
            .push_bind(row.is_active)
            .push_bind(row.hire_date)
            .push_bind(row.created_at);
    });
    builder.push(" ON CONFLICT (employee_id) DO NOTHING");
    builder
}

#[async_trait]
impl EmployeeStore for EmployeeRepository {
    async fn upsert_batch(&self, rows: &[EmployeeRecord]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HrError::Database(format!("Failed to open transaction: {}", e)))?;

        let mut inserted = 0;
        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            let result = insert_statement(chunk)
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    HrError::Database(format!("Failed to insert {} employees: {}", chunk.len(), e))
                })?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| HrError::Database(format!("Failed to commit batch: {}", e)))?;
        Ok(inserted)
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| HrError::Database(format!("Failed to count employees: {}", e)))
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<EmployeeRecord>> {
        let sql = format!(
            "SELECT {} FROM employees ORDER BY employee_id OFFSET $1 LIMIT $2",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, EmployeeRecord>(&sql)
            .bind(skip as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| HrError::Database(format!("Failed to list employees: {}", e)))
    }

    async fn get(&self, employee_id: &str) -> Result<Option<EmployeeRecord>> {
        let sql = format!(
            "SELECT {} FROM employees WHERE employee_id = $1",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, EmployeeRecord>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| HrError::Database(format!("Failed to load employee {}: {}", employee_id, e)))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

//! Storage collaborator: executes query descriptors and single-row writes for a table.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::sql::{Predicate, QueryDescriptor};
use crate::table::{TableSpec, ID_COLUMN};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One stored record keyed by column name.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch(&self, table: &TableSpec, query: &QueryDescriptor) -> Result<Vec<Row>, AppError>;

    async fn count(&self, table: &TableSpec, conditions: &[Predicate]) -> Result<u64, AppError>;

    /// Insert and return the stored row, generated id and timestamps included.
    async fn insert(&self, table: &TableSpec, row: Row) -> Result<Row, AppError>;

    /// Update by id. `None` when no row has that id.
    async fn update(&self, table: &TableSpec, id: &Value, row: Row) -> Result<Option<Row>, AppError>;

    /// Delete by id. `false` when no row had that id.
    async fn delete(&self, table: &TableSpec, id: &Value) -> Result<bool, AppError>;

    /// Update when the row carries an id that exists, insert otherwise.
    async fn upsert(&self, table: &TableSpec, row: Row) -> Result<Row, AppError> {
        match row_id(&row) {
            Some(id) => match self.update(table, &id, row.clone()).await? {
                Some(updated) => Ok(updated),
                None => self.insert(table, row).await,
            },
            None => self.insert(table, row).await,
        }
    }

    async fn upsert_many(&self, table: &TableSpec, rows: Vec<Row>) -> Result<Vec<Row>, AppError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.upsert(table, row).await?);
        }
        Ok(out)
    }
}

pub(crate) fn row_id(row: &Row) -> Option<Value> {
    row.get(ID_COLUMN).filter(|v| !v.is_null()).cloned()
}

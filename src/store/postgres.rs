//! Store execution against PostgreSQL.

use super::{row_id, Row, Store};
use crate::error::AppError;
use crate::sql::{self, PgBindValue, Predicate, QueryBuf, QueryDescriptor};
use crate::table::TableSpec;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::{Column, Executor, PgPool, Row as _, TypeInfo};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
    log_statements: bool,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
            log_statements: false,
        }
    }

    /// Log every statement at info instead of debug.
    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn trace(&self, q: &QueryBuf) {
        if self.log_statements {
            tracing::info!(sql = %q.sql, params = ?q.params, "query");
        } else {
            tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        }
    }

    async fn fetch_rows<'c, E>(executor: E, q: &QueryBuf) -> Result<Vec<Row>, AppError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(executor).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_optional_row<'c, E>(executor: E, q: &QueryBuf) -> Result<Option<Row>, AppError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(executor).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn insert_with<'c, E>(&self, executor: E, table: &TableSpec, row: &Row) -> Result<Row, AppError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let q = sql::insert(table, &self.schema, row);
        self.trace(&q);
        Self::fetch_optional_row(executor, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn fetch(&self, table: &TableSpec, query: &QueryDescriptor) -> Result<Vec<Row>, AppError> {
        let q = sql::select(table, &self.schema, query);
        self.trace(&q);
        Self::fetch_rows(&self.pool, &q).await
    }

    async fn count(&self, table: &TableSpec, conditions: &[Predicate]) -> Result<u64, AppError> {
        let q = sql::count(table, &self.schema, conditions);
        self.trace(&q);
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let n = query.fetch_one(&self.pool).await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn insert(&self, table: &TableSpec, row: Row) -> Result<Row, AppError> {
        self.insert_with(&self.pool, table, &row).await
    }

    async fn update(&self, table: &TableSpec, id: &Value, row: Row) -> Result<Option<Row>, AppError> {
        let q = sql::update(table, &self.schema, id, &row);
        self.trace(&q);
        Self::fetch_optional_row(&self.pool, &q).await
    }

    async fn delete(&self, table: &TableSpec, id: &Value) -> Result<bool, AppError> {
        let q = sql::delete(table, &self.schema, id);
        self.trace(&q);
        Ok(Self::fetch_optional_row(&self.pool, &q).await?.is_some())
    }

    /// All rows in one transaction.
    async fn upsert_many(&self, table: &TableSpec, rows: Vec<Row>) -> Result<Vec<Row>, AppError> {
        let mut out = Vec::with_capacity(rows.len());
        let mut tx = self.pool.begin().await?;
        for row in rows {
            let updated = match row_id(&row) {
                Some(id) => {
                    let q = sql::update(table, &self.schema, &id, &row);
                    self.trace(&q);
                    Self::fetch_optional_row(&mut *tx, &q).await?
                }
                None => None,
            };
            let saved = match updated {
                Some(r) => r,
                None => self.insert_with(&mut *tx, table, &row).await?,
            };
            out.push(saved);
        }
        tx.commit().await?;
        Ok(out)
    }
}

fn row_to_json(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|col| {
            let value = cell_to_value(row, col.ordinal(), col.type_info().name());
            (col.name().to_string(), value)
        })
        .collect()
}

fn nullable<T: Into<Value>>(v: Option<T>) -> Value {
    v.map(Into::into).unwrap_or(Value::Null)
}

/// Decode one cell by its PostgreSQL type name. Unknown types are read as text.
fn cell_to_value(row: &PgRow, idx: usize, type_name: &str) -> Value {
    let decoded: Result<Value, sqlx::Error> = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map(nullable),
        "INT2" => row.try_get::<Option<i16>, _>(idx).map(nullable),
        "INT4" => row.try_get::<Option<i32>, _>(idx).map(nullable),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map(nullable),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map(nullable),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map(nullable),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(idx)
            .map(|v| nullable(v.map(|u| u.to_string()))),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            .map(|v| nullable(v.map(|d| d.to_rfc3339()))),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map(|v| nullable(v.map(|d| d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .map(|v| nullable(v.map(|d| d.format("%Y-%m-%d").to_string()))),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(idx)
            .map(|v| v.unwrap_or(Value::Null)),
        _ => row.try_get::<Option<String>, _>(idx).map(nullable),
    };
    decoded.unwrap_or_else(|e| {
        tracing::warn!(column = idx, type_name, error = %e, "could not decode column");
        Value::Null
    })
}

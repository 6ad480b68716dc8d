//! Database bootstrap: create the database, then schema, enum types, and tables.
//! Every statement is idempotent so it can run on each startup.

use crate::error::AppError;
use crate::sql::{qualified_table, quoted};
use crate::table::{TableSpec, ID_COLUMN};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Ensure the database named in `database_url` exists; create it if not. Connects to the
/// `postgres` maintenance database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_database_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::InvalidInput(format!("invalid database url: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn split_database_name(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url
        .get(scheme_end..)
        .and_then(|rest| rest.find('/'))
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| AppError::InvalidInput("database url has no database path".into()))?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let (db_name, query) = match path_and_query.split_once('?') {
        Some((name, q)) => (name, Some(q)),
        None => (path_and_query, None),
    };
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    Ok((admin_url, db_name.trim().to_string()))
}

/// DDL for `tables` in dependency order: schema, enum types, tables.
pub fn schema_ddl(schema: &str, tables: &[&TableSpec]) -> Vec<String> {
    let mut statements = vec![format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))];
    let mut seen_enums: Vec<&str> = Vec::new();
    for table in tables {
        for (type_name, labels) in &table.enums {
            if seen_enums.contains(type_name) {
                continue;
            }
            seen_enums.push(*type_name);
            let values: Vec<String> = labels.iter().map(|l| format!("'{}'", l.replace('\'', "''"))).collect();
            statements.push(format!(
                "DO $$ BEGIN CREATE TYPE {}.{} AS ENUM ({}); EXCEPTION WHEN duplicate_object THEN NULL; END $$",
                quoted(schema),
                quoted(type_name),
                values.join(", ")
            ));
        }
    }
    for table in tables {
        let mut defs: Vec<String> = Vec::new();
        for c in &table.columns {
            let mut def = format!("{} {}", quoted(c.name), c.column_type.ddl(schema));
            if c.name == ID_COLUMN {
                def.push_str(" PRIMARY KEY");
            } else if !c.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(d) = &c.default {
                def.push_str(&format!(" DEFAULT {}", d.ddl()));
            }
            defs.push(def);
        }
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            qualified_table(schema, table.table_name),
            defs.join(", ")
        ));
    }
    statements
}

/// Apply [`schema_ddl`] against the pool.
pub async fn ensure_schema(pool: &PgPool, schema: &str, tables: &[&TableSpec]) -> Result<(), AppError> {
    for sql in schema_ddl(schema, tables) {
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(schema, tables = tables.len(), "schema ready");
    Ok(())
}

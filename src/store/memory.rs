//! In-process store with the same filtering, ordering, and default semantics as the
//! PostgreSQL adapter. Used by tests and the demo.

use super::{Row, Store};
use crate::criteria::SortDirection;
use crate::error::AppError;
use crate::sql::{CompareOp, OrderBy, Predicate, QueryDescriptor};
use crate::table::{ColumnDefault, ColumnSpec, ColumnType, TableSpec, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<&'static str, Vec<Row>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<&'static str, Vec<Row>>) -> Result<T, AppError>) -> Result<T, AppError> {
        let guard = self.tables.read().map_err(|_| poisoned())?;
        f(&guard)
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut HashMap<&'static str, Vec<Row>>) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut guard = self.tables.write().map_err(|_| poisoned())?;
        f(&mut guard)
    }
}

fn poisoned() -> AppError {
    AppError::Store("memory store lock poisoned".into())
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn column<'t>(table: &'t TableSpec, name: &str) -> Result<&'t ColumnSpec, AppError> {
    table
        .column(name)
        .ok_or_else(|| AppError::Store(format!("column \"{}\" of \"{}\" does not exist", name, table.table_name)))
}

/// Bring a value into the column's canonical form so stored values and
/// predicate operands compare the same way.
fn normalize(value: &Value, column_type: ColumnType) -> Value {
    match (column_type, value) {
        (ColumnType::Integer, Value::String(s)) => s.trim().parse::<i64>().map(Value::from).unwrap_or_else(|_| value.clone()),
        (ColumnType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value.clone(),
        },
        (ColumnType::Uuid, Value::String(s)) => Value::String(s.to_ascii_lowercase()),
        (ColumnType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|d| Value::String(d.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true)))
            .unwrap_or_else(|_| value.clone()),
        _ => value.clone(),
    }
}

/// Check a value against the column before it is stored.
fn admit(table: &TableSpec, spec: &ColumnSpec, value: Value) -> Result<Value, AppError> {
    if value.is_null() {
        if spec.nullable {
            return Ok(Value::Null);
        }
        return Err(AppError::Store(format!(
            "null value in column \"{}\" of \"{}\" violates not-null constraint",
            spec.name, table.table_name
        )));
    }
    if let ColumnType::Enum(type_name) = spec.column_type {
        let known = table
            .enums
            .iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, labels)| labels.iter().any(|l| Some(*l) == value.as_str()))
            .unwrap_or(false);
        if !known {
            return Err(AppError::Store(format!("invalid input value for enum {}: {}", type_name, value)));
        }
    }
    if let (ColumnType::Varchar(max), Some(s)) = (spec.column_type, value.as_str()) {
        if s.chars().count() > max as usize {
            return Err(AppError::Store(format!(
                "value too long for type character varying({}) in column \"{}\"",
                max, spec.name
            )));
        }
    }
    Ok(normalize(&value, spec.column_type))
}

fn default_value(default: &ColumnDefault) -> Value {
    match default {
        ColumnDefault::RandomUuid => Value::String(uuid::Uuid::new_v4().to_string()),
        ColumnDefault::Now => now(),
        ColumnDefault::Literal(v) => v.clone(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn like_regex(pattern: &str) -> Result<Regex, AppError> {
    let mut re = String::from("(?s)^");
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| AppError::Store(format!("invalid LIKE pattern {:?}: {}", pattern, e)))
}

/// Total order for non-null values of one column. `None` when the two are not comparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => (a == b).then_some(Ordering::Equal),
    }
}

/// SQL three-valued logic collapsed to bool: anything touching NULL is false, except IS NULL.
fn matches(table: &TableSpec, row: &Row, predicate: &Predicate) -> Result<bool, AppError> {
    let spec = column(table, predicate.column())?;
    let cell = row.get(spec.name).unwrap_or(&Value::Null);
    let operand = |v: &Value| normalize(v, spec.column_type);
    Ok(match predicate {
        Predicate::IsNull { .. } => cell.is_null(),
        _ if cell.is_null() => false,
        Predicate::Compare { op, value, .. } => {
            let Some(ord) = compare(cell, &operand(value)) else {
                return Ok(false);
            };
            match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Gte => ord != Ordering::Less,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Lte => ord != Ordering::Greater,
            }
        }
        Predicate::Like { pattern, .. } => like_regex(pattern)?.is_match(&text_of(cell)),
        Predicate::In { values, .. } => values
            .iter()
            .any(|v| compare(cell, &operand(v)) == Some(Ordering::Equal)),
        Predicate::Between { low, high, .. } => {
            compare(cell, &operand(low)).map_or(false, |o| o != Ordering::Less)
                && compare(cell, &operand(high)).map_or(false, |o| o != Ordering::Greater)
        }
    })
}

fn filter_rows<'r>(table: &TableSpec, rows: &'r [Row], conditions: &[Predicate]) -> Result<Vec<&'r Row>, AppError> {
    let mut out = Vec::new();
    for row in rows {
        let mut keep = true;
        for p in conditions {
            if !matches(table, row, p)? {
                keep = false;
                break;
            }
        }
        if keep {
            out.push(row);
        }
    }
    Ok(out)
}

/// NULLs sort last ascending and first descending, as PostgreSQL does.
fn order_rows(table: &TableSpec, rows: &mut [&Row], order: &[OrderBy]) -> Result<(), AppError> {
    for o in order {
        column(table, &o.column)?;
    }
    rows.sort_by(|a, b| {
        for o in order {
            let x = a.get(&o.column).unwrap_or(&Value::Null);
            let y = b.get(&o.column).unwrap_or(&Value::Null);
            let ord = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare(x, y).unwrap_or(Ordering::Equal),
            };
            let ord = match o.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

fn same_id(row: &Row, id: &Value) -> bool {
    let id = normalize(id, ColumnType::Uuid);
    row.get(ID_COLUMN) == Some(&id)
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch(&self, table: &TableSpec, query: &QueryDescriptor) -> Result<Vec<Row>, AppError> {
        self.read(|tables| {
            let rows = tables.get(table.table_name).map(Vec::as_slice).unwrap_or_default();
            let mut hits = filter_rows(table, rows, &query.conditions)?;
            order_rows(table, &mut hits, &query.order)?;
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
            Ok(hits.into_iter().skip(offset).take(limit).cloned().collect())
        })
    }

    async fn count(&self, table: &TableSpec, conditions: &[Predicate]) -> Result<u64, AppError> {
        self.read(|tables| {
            let rows = tables.get(table.table_name).map(Vec::as_slice).unwrap_or_default();
            Ok(filter_rows(table, rows, conditions)?.len() as u64)
        })
    }

    async fn insert(&self, table: &TableSpec, row: Row) -> Result<Row, AppError> {
        let mut stored = Row::new();
        for spec in &table.columns {
            let given = row.get(spec.name).cloned().unwrap_or(Value::Null);
            let value = match (&given, &spec.default) {
                (Value::Null, Some(default)) => default_value(default),
                _ => given,
            };
            stored.insert(spec.name.to_string(), admit(table, spec, value)?);
        }
        self.write(|tables| {
            let rows = tables.entry(table.table_name).or_default();
            if let Some(id) = stored.get(ID_COLUMN) {
                if rows.iter().any(|r| r.get(ID_COLUMN) == Some(id)) {
                    return Err(AppError::Store(format!(
                        "duplicate key value violates unique constraint on \"{}\".\"id\": {}",
                        table.table_name, id
                    )));
                }
            }
            rows.push(stored.clone());
            Ok(stored)
        })
    }

    async fn update(&self, table: &TableSpec, id: &Value, row: Row) -> Result<Option<Row>, AppError> {
        let mut changes = Vec::new();
        for spec in &table.columns {
            if [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN].contains(&spec.name) {
                continue;
            }
            if let Some(v) = row.get(spec.name) {
                changes.push((spec.name, admit(table, spec, v.clone())?));
            }
        }
        self.write(|tables| {
            let Some(target) = tables
                .get_mut(table.table_name)
                .and_then(|rows| rows.iter_mut().find(|r| same_id(r, id)))
            else {
                return Ok(None);
            };
            for (name, value) in changes {
                target.insert(name.to_string(), value);
            }
            target.insert(UPDATED_AT_COLUMN.to_string(), now());
            Ok(Some(target.clone()))
        })
    }

    async fn delete(&self, table: &TableSpec, id: &Value) -> Result<bool, AppError> {
        self.write(|tables| {
            let Some(rows) = tables.get_mut(table.table_name) else {
                return Ok(false);
            };
            let before = rows.len();
            rows.retain(|r| !same_id(r, id));
            Ok(rows.len() != before)
        })
    }
}

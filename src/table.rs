//! Static table metadata shared by SQL rendering, DDL, and the in-memory store.

use crate::sql::quoted;
use serde_json::Value;

/// Column storage type. Drives parameter casts, DDL, and how the column is selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Varchar(u32),
    Text,
    Integer,
    Boolean,
    /// timestamptz
    Timestamp,
    Jsonb,
    /// Named PostgreSQL enum type, created alongside the table.
    Enum(&'static str),
}

impl ColumnType {
    /// Cast appended to a bound parameter so text-encoded values reach the right type.
    /// Enum types live in the table's schema.
    pub fn cast(&self, schema: &str) -> Option<String> {
        match self {
            ColumnType::Uuid => Some("uuid".into()),
            ColumnType::Varchar(_) | ColumnType::Text => None,
            ColumnType::Integer => Some("int4".into()),
            ColumnType::Boolean => Some("bool".into()),
            ColumnType::Timestamp => Some("timestamptz".into()),
            ColumnType::Jsonb => Some("jsonb".into()),
            ColumnType::Enum(name) => Some(format!("{}.{}", quoted(schema), quoted(name))),
        }
    }

    pub fn ddl(&self, schema: &str) -> String {
        match self {
            ColumnType::Uuid => "UUID".into(),
            ColumnType::Varchar(n) => format!("VARCHAR({})", n),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::Boolean => "BOOLEAN".into(),
            ColumnType::Timestamp => "TIMESTAMPTZ".into(),
            ColumnType::Jsonb => "JSONB".into(),
            ColumnType::Enum(name) => format!("{}.{}", quoted(schema), quoted(name)),
        }
    }

    /// Enum columns are selected as `col::text` so rows decode as strings.
    pub fn select_as_text(&self) -> bool {
        matches!(self, ColumnType::Enum(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnDefault {
    RandomUuid,
    Now,
    Literal(Value),
}

impl ColumnDefault {
    pub fn ddl(&self) -> String {
        match self {
            ColumnDefault::RandomUuid => "gen_random_uuid()".into(),
            ColumnDefault::Now => "NOW()".into(),
            ColumnDefault::Literal(Value::String(s)) => format!("'{}'", s.replace('\'', "''")),
            ColumnDefault::Literal(v) => v.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnSpec {
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        ColumnSpec {
            name,
            column_type,
            nullable: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Primary key column name shared by every table.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

#[derive(Clone, Debug, PartialEq)]
pub struct TableSpec {
    pub table_name: &'static str,
    /// Enum types this table depends on: (type name, labels).
    pub enums: Vec<(&'static str, Vec<&'static str>)>,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    /// Table with the shared `id` / `created_at` / `updated_at` columns followed by `columns`.
    pub fn with_base_columns(table_name: &'static str, columns: Vec<ColumnSpec>) -> Self {
        let mut all = vec![
            ColumnSpec::new(ID_COLUMN, ColumnType::Uuid).with_default(ColumnDefault::RandomUuid),
            ColumnSpec::new(CREATED_AT_COLUMN, ColumnType::Timestamp).with_default(ColumnDefault::Now),
            ColumnSpec::new(UPDATED_AT_COLUMN, ColumnType::Timestamp).with_default(ColumnDefault::Now),
        ];
        all.extend(columns);
        TableSpec {
            table_name,
            enums: Vec::new(),
            columns: all,
        }
    }

    pub fn with_enum(mut self, type_name: &'static str, labels: Vec<&'static str>) -> Self {
        self.enums.push((type_name, labels));
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_columns_come_first() {
        let t = TableSpec::with_base_columns("things", vec![ColumnSpec::new("label", ColumnType::Text)]);
        let names: Vec<_> = t.columns.iter().map(|c| c.name).collect();
        assert_eq!(names, ["id", "created_at", "updated_at", "label"]);
        assert!(t.column("id").map(ColumnSpec::has_default).unwrap_or(false));
        assert!(t.column("missing").is_none());
    }

    #[test]
    fn enum_casts_are_schema_qualified() {
        let t = ColumnType::Enum("event_status");
        assert_eq!(t.cast("app").as_deref(), Some(r#""app"."event_status""#));
        assert_eq!(t.ddl("app"), r#""app"."event_status""#);
        assert_eq!(ColumnType::Text.cast("app"), None);
        assert_eq!(ColumnType::Integer.cast("app").as_deref(), Some("int4"));
    }

    #[test]
    fn literal_defaults_render_as_sql() {
        assert_eq!(ColumnDefault::Literal(json!("pending")).ddl(), "'pending'");
        assert_eq!(ColumnDefault::Literal(json!(0)).ddl(), "0");
        assert_eq!(ColumnDefault::Literal(json!(true)).ddl(), "true");
    }
}

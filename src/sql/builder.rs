//! Renders parameterized SELECT, COUNT, INSERT, UPDATE, DELETE for a table.
//! Identifiers are quoted, every value travels as a positional parameter.

use super::descriptor::{Predicate, QueryDescriptor};
use crate::table::{ColumnType, TableSpec, ID_COLUMN, UPDATED_AT_COLUMN, CREATED_AT_COLUMN};
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL.
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub(crate) fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Push `v` and return its placeholder, cast by the column's type when known.
    fn placeholder(&mut self, table: &TableSpec, schema: &str, column: &str, v: Value) -> String {
        let n = self.push_param(v);
        table
            .column(column)
            .and_then(|c| c.column_type.cast(schema))
            .map(|t| format!("${}::{}", n, t))
            .unwrap_or_else(|| format!("${}", n))
    }
}

/// SELECT list: enum columns as `col::text` so rows decode as strings.
fn select_column_list(table: &TableSpec) -> String {
    table
        .columns
        .iter()
        .map(|c| {
            let q = quoted(c.name);
            if c.column_type.select_as_text() {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_textual(table: &TableSpec, column: &str) -> bool {
    table
        .column(column)
        .map(|c| matches!(c.column_type, ColumnType::Text | ColumnType::Varchar(_)))
        .unwrap_or(true)
}

fn render_predicate(q: &mut QueryBuf, table: &TableSpec, schema: &str, predicate: &Predicate) -> String {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let ph = q.placeholder(table, schema, column, value.clone());
            format!("{} {} {}", quoted(column), op.as_sql(), ph)
        }
        Predicate::Like { column, pattern } => {
            let n = q.push_param(Value::String(pattern.clone()));
            if is_textual(table, column) {
                format!("{} LIKE ${}", quoted(column), n)
            } else {
                format!("{}::text LIKE ${}", quoted(column), n)
            }
        }
        Predicate::In { column, values } => {
            if values.is_empty() {
                return "1 = 0".to_string();
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| q.placeholder(table, schema, column, v.clone()))
                .collect();
            format!("{} IN ({})", quoted(column), placeholders.join(", "))
        }
        Predicate::Between { column, low, high } => {
            let lo = q.placeholder(table, schema, column, low.clone());
            let hi = q.placeholder(table, schema, column, high.clone());
            format!("{} BETWEEN {} AND {}", quoted(column), lo, hi)
        }
        Predicate::IsNull { column } => format!("{} IS NULL", quoted(column)),
    }
}

fn where_clause(q: &mut QueryBuf, table: &TableSpec, schema: &str, conditions: &[Predicate]) -> String {
    if conditions.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = conditions
        .iter()
        .map(|p| render_predicate(q, table, schema, p))
        .collect();
    format!(" WHERE {}", parts.join(" AND "))
}

/// SELECT with AND-combined conditions, ORDER BY in declaration order, LIMIT/OFFSET.
pub fn select(table: &TableSpec, schema: &str, query: &QueryDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let from = qualified_table(schema, table.table_name);
    let where_sql = where_clause(&mut q, table, schema, &query.conditions);
    let order_sql = if query.order.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = query
            .order
            .iter()
            .map(|o| format!("{} {}", quoted(&o.column), o.direction.as_sql()))
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    };
    let limit_sql = query.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_sql = query.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        select_column_list(table),
        from,
        where_sql,
        order_sql,
        limit_sql,
        offset_sql
    );
    q
}

/// COUNT(*) over the same conditions, ignoring order and window.
pub fn count(table: &TableSpec, schema: &str, conditions: &[Predicate]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let from = qualified_table(schema, table.table_name);
    let where_sql = where_clause(&mut q, table, schema, conditions);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", from, where_sql);
    q
}

/// INSERT known columns from `row`. Null or missing values for columns with a
/// default are omitted so the database fills them.
pub fn insert(table: &TableSpec, schema: &str, row: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let into = qualified_table(schema, table.table_name);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &table.columns {
        let val = row.get(c.name).cloned().unwrap_or(Value::Null);
        if val.is_null() && c.has_default() {
            continue;
        }
        placeholders.push(q.placeholder(table, schema, c.name, val));
        cols.push(quoted(c.name));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", into, select_column_list(table))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            into,
            cols.join(", "),
            placeholders.join(", "),
            select_column_list(table)
        )
    };
    q
}

/// UPDATE by id: SET every known column present in `row`, plus `updated_at = NOW()`.
pub fn update(table: &TableSpec, schema: &str, id: &Value, row: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified_table(schema, table.table_name);
    let mut sets = Vec::new();
    for c in &table.columns {
        if [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN].contains(&c.name) {
            continue;
        }
        let Some(v) = row.get(c.name) else { continue };
        let rhs = q.placeholder(table, schema, c.name, v.clone());
        sets.push(format!("{} = {}", quoted(c.name), rhs));
    }
    sets.push(format!("{} = NOW()", quoted(UPDATED_AT_COLUMN)));
    let id_ph = q.placeholder(table, schema, ID_COLUMN, id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        target,
        sets.join(", "),
        quoted(ID_COLUMN),
        id_ph,
        select_column_list(table)
    );
    q
}

/// DELETE by id.
pub fn delete(table: &TableSpec, schema: &str, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let from = qualified_table(schema, table.table_name);
    let id_ph = q.placeholder(table, schema, ID_COLUMN, id.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        from,
        quoted(ID_COLUMN),
        id_ph,
        quoted(ID_COLUMN)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::SortDirection;
    use crate::sql::descriptor::{CompareOp, OrderBy};
    use crate::table::{ColumnDefault, ColumnSpec};
    use serde_json::json;

    fn jobs() -> TableSpec {
        TableSpec::with_base_columns(
            "jobs",
            vec![
                ColumnSpec::new("name", ColumnType::Varchar(255)),
                ColumnSpec::new("status", ColumnType::Enum("job_status"))
                    .with_default(ColumnDefault::Literal(json!("pending"))),
                ColumnSpec::new("attempts", ColumnType::Integer).with_default(ColumnDefault::Literal(json!(0))),
                ColumnSpec::new("finished_at", ColumnType::Timestamp).nullable(),
            ],
        )
        .with_enum("job_status", vec!["pending", "done"])
    }

    const COLS: &str = r#""id", "created_at", "updated_at", "name", "status"::text AS "status", "attempts", "finished_at""#;

    #[test]
    fn select_renders_conditions_order_and_window() {
        let query = QueryDescriptor {
            conditions: vec![
                Predicate::eq("status", json!("pending")),
                Predicate::Like {
                    column: "name".into(),
                    pattern: "%ship%".into(),
                },
                Predicate::Between {
                    column: "attempts".into(),
                    low: json!(1),
                    high: json!(3),
                },
                Predicate::IsNull {
                    column: "finished_at".into(),
                },
            ],
            order: vec![OrderBy {
                column: "created_at".into(),
                direction: SortDirection::Descending,
            }],
            limit: Some(10),
            offset: Some(20),
        };
        let q = select(&jobs(), "public", &query);
        assert_eq!(
            q.sql,
            format!(
                r#"SELECT {} FROM "public"."jobs" WHERE "status" = $1::"public"."job_status" AND "name" LIKE $2 AND "attempts" BETWEEN $3::int4 AND $4::int4 AND "finished_at" IS NULL ORDER BY "created_at" DESC LIMIT 10 OFFSET 20"#,
                COLS
            )
        );
        assert_eq!(q.params, vec![json!("pending"), json!("%ship%"), json!(1), json!(3)]);
    }

    #[test]
    fn in_and_like_on_non_text_columns() {
        let query = QueryDescriptor::matching(vec![
            Predicate::In {
                column: "status".into(),
                values: vec![json!("pending"), json!("done")],
            },
            Predicate::Like {
                column: "attempts".into(),
                pattern: "%2%".into(),
            },
        ]);
        let q = select(&jobs(), "s", &query);
        assert!(q
            .sql
            .ends_with(r#"WHERE "status" IN ($1::"s"."job_status", $2::"s"."job_status") AND "attempts"::text LIKE $3"#));
    }

    #[test]
    fn empty_in_matches_nothing() {
        let query = QueryDescriptor::matching(vec![Predicate::In {
            column: "status".into(),
            values: vec![],
        }]);
        let q = select(&jobs(), "public", &query);
        assert!(q.sql.ends_with("WHERE 1 = 0"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn count_ignores_window() {
        let conditions = vec![Predicate::Compare {
            column: "attempts".into(),
            op: CompareOp::Gte,
            value: json!(5),
        }];
        let q = count(&jobs(), "public", &conditions);
        assert_eq!(q.sql, r#"SELECT COUNT(*) FROM "public"."jobs" WHERE "attempts" >= $1::int4"#);
        assert_eq!(q.params, vec![json!(5)]);
    }

    #[test]
    fn insert_skips_null_defaults() {
        let row = json!({ "id": null, "name": "a", "status": null, "attempts": 2, "finished_at": null, "bogus": 1 });
        let Value::Object(row) = row else { unreachable!() };
        let q = insert(&jobs(), "public", &row);
        assert_eq!(
            q.sql,
            format!(
                r#"INSERT INTO "public"."jobs" ("name", "attempts", "finished_at") VALUES ($1, $2::int4, $3::timestamptz) RETURNING {}"#,
                COLS
            )
        );
        assert_eq!(q.params, vec![json!("a"), json!(2), Value::Null]);
    }

    #[test]
    fn update_sets_present_columns_and_touches_updated_at() {
        let row = json!({ "id": "ignored", "created_at": "x", "status": "done", "finished_at": null });
        let Value::Object(row) = row else { unreachable!() };
        let id = json!("1b4e28ba-2fa1-11d2-883f-0016d3cca427");
        let q = update(&jobs(), "public", &id, &row);
        assert_eq!(
            q.sql,
            format!(
                r#"UPDATE "public"."jobs" SET "status" = $1::"public"."job_status", "finished_at" = $2::timestamptz, "updated_at" = NOW() WHERE "id" = $3::uuid RETURNING {}"#,
                COLS
            )
        );
        assert_eq!(q.params[2], id);
    }

    #[test]
    fn delete_by_id() {
        let q = delete(&jobs(), "public", &json!("abc"));
        assert_eq!(q.sql, r#"DELETE FROM "public"."jobs" WHERE "id" = $1::uuid RETURNING "id""#);
    }
}

use crate::error::Resource;
use crate::repository::Entity;
use crate::table::{ColumnDefault, ColumnSpec, ColumnType, TableSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Example {
    fn default() -> Self {
        Example {
            id: None,
            name: String::new(),
            description: None,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }
}

pub fn examples_table() -> &'static TableSpec {
    static TABLE: OnceLock<TableSpec> = OnceLock::new();
    TABLE.get_or_init(|| {
        TableSpec::with_base_columns(
            "examples",
            vec![
                ColumnSpec::new("name", ColumnType::Varchar(255)),
                ColumnSpec::new("description", ColumnType::Text).nullable(),
                ColumnSpec::new("active", ColumnType::Boolean).with_default(ColumnDefault::Literal(json!(true))),
            ],
        )
    })
}

impl Entity for Example {
    const RESOURCE: Resource = Resource::Example;

    fn table() -> &'static TableSpec {
        examples_table()
    }

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

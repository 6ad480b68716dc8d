use crate::error::Resource;
use crate::repository::Entity;
use crate::table::{ColumnDefault, ColumnSpec, ColumnType, TableSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Success,
    Error,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Pending,
        EventStatus::Success,
        EventStatus::Error,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Success => "success",
            EventStatus::Error => "error",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses that close an attempt and stamp `endTime`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventStatus::Pending)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Option<Uuid>,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Opaque payload handed to listeners.
    pub data: Option<Value>,
    pub status: EventStatus,
    pub retry_count: u32,
    pub error: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// What listeners receive: the payload, or null.
    pub fn payload(&self) -> Value {
        self.data.clone().unwrap_or(Value::Null)
    }
}

pub const EVENT_STATUS_TYPE: &str = "event_status";

pub fn events_table() -> &'static TableSpec {
    static TABLE: OnceLock<TableSpec> = OnceLock::new();
    TABLE.get_or_init(|| {
        TableSpec::with_base_columns(
            "events",
            vec![
                ColumnSpec::new("name", ColumnType::Varchar(255)),
                ColumnSpec::new("start_time", ColumnType::Timestamp).nullable(),
                ColumnSpec::new("end_time", ColumnType::Timestamp).nullable(),
                ColumnSpec::new("data", ColumnType::Jsonb).nullable(),
                ColumnSpec::new("status", ColumnType::Enum(EVENT_STATUS_TYPE))
                    .with_default(ColumnDefault::Literal(json!(EventStatus::Pending.as_str()))),
                ColumnSpec::new("retry_count", ColumnType::Integer).with_default(ColumnDefault::Literal(json!(0))),
                ColumnSpec::new("error", ColumnType::Text).nullable(),
                ColumnSpec::new("cancellation_reason", ColumnType::Text).nullable(),
            ],
        )
        .with_enum(EVENT_STATUS_TYPE, EventStatus::ALL.iter().map(EventStatus::as_str).collect())
    })
}

impl Entity for Event {
    const RESOURCE: Resource = Resource::Event;

    fn table() -> &'static TableSpec {
        events_table()
    }

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(EventStatus::Cancelled).unwrap(), json!("cancelled"));
        let s: EventStatus = serde_json::from_value(json!("error")).unwrap();
        assert_eq!(s, EventStatus::Error);
        assert!(!EventStatus::Pending.is_terminal());
        assert!(EventStatus::Success.is_terminal());
    }

    #[test]
    fn serializes_camel_case_fields() {
        let e = Event {
            name: "order.shipped".into(),
            retry_count: 2,
            ..Default::default()
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["retryCount"], json!(2));
        assert_eq!(v["status"], json!("pending"));
        assert!(v["cancellationReason"].is_null());
        assert_eq!(e.payload(), Value::Null);
    }

    #[test]
    fn table_declares_status_enum() {
        let t = events_table();
        assert_eq!(t.table_name, "events");
        assert_eq!(t.enums, vec![(EVENT_STATUS_TYPE, vec!["pending", "success", "error", "cancelled"])]);
        assert!(t.column("retry_count").is_some());
    }
}

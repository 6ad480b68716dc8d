//! Field <-> column naming: entity fields are camelCase, columns snake_case.

use serde_json::{Map, Value};

/// "retry_count" -> "retryCount"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// "retryCount" -> "retry_count". Already snake_case input is returned unchanged.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Entity JSON (camelCase keys) into a storage row (column keys). Nested values are left alone.
pub fn fields_to_row(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(k, v)| (to_snake_case(&k), v))
        .collect()
}

/// Storage row into entity JSON. Only top-level keys are renamed so `data` payloads keep their shape.
pub fn row_to_fields(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter()
        .map(|(k, v)| (to_camel_case(&k), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_identifiers() {
        assert_eq!(to_snake_case("cancellationReason"), "cancellation_reason");
        assert_eq!(to_snake_case("status"), "status");
        assert_eq!(to_snake_case("retry_count"), "retry_count");
        assert_eq!(to_camel_case("created_at"), "createdAt");
        assert_eq!(to_camel_case("id"), "id");
    }

    #[test]
    fn nested_payload_keys_survive_round_trip() {
        let fields = json!({ "startTime": null, "data": { "order_id": 42, "shipTo": "x" } });
        let Value::Object(fields) = fields else { unreachable!() };
        let row = fields_to_row(fields);
        assert!(row.contains_key("start_time"));
        assert_eq!(row["data"], json!({ "order_id": 42, "shipTo": "x" }));
        let back = row_to_fields(row);
        assert!(back.contains_key("startTime"));
        assert_eq!(back["data"], json!({ "order_id": 42, "shipTo": "x" }));
    }
}

use super::Operator;
use crate::error::CriteriaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field comparison. `value` is a scalar, a two-element array for `Between`,
/// or an array (or scalar) for `In`. `IsNull` ignores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    /// Build a filter, rejecting a `Between` whose value is not exactly two elements.
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Result<Self, CriteriaError> {
        let field = field.into();
        if operator == Operator::Between {
            check_between(&field, &value)?;
        }
        Ok(Filter { field, operator, value })
    }

    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::Equal,
            value: value.into(),
        }
    }

    pub fn not_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::NotEqual,
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::Contains,
            value: value.into(),
        }
    }

    pub fn one_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::In,
            value: Value::Array(values),
        }
    }

    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::Between,
            value: Value::Array(vec![low.into(), high.into()]),
        }
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::GreaterThan,
            value: value.into(),
        }
    }

    pub fn less_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::LessThan,
            value: value.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Filter {
            field: field.into(),
            operator: Operator::IsNull,
            value: Value::Null,
        }
    }
}

/// `Between` bounds, or `InvalidFilter` when the value is not a two-element array.
pub(crate) fn between_bounds<'a>(field: &str, value: &'a Value) -> Result<(&'a Value, &'a Value), CriteriaError> {
    match value {
        Value::Array(items) if items.len() == 2 => Ok((&items[0], &items[1])),
        _ => Err(CriteriaError::InvalidFilter(format!(
            "between on '{}' requires an array with exactly 2 values",
            field
        ))),
    }
}

fn check_between(field: &str, value: &Value) -> Result<(), CriteriaError> {
    between_bounds(field, value).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn between_needs_exactly_two_values() {
        for bad in [json!([]), json!([1]), json!([1, 2, 3]), json!(5), json!(null)] {
            let err = Filter::new("retryCount", Operator::Between, bad).unwrap_err();
            assert!(matches!(err, CriteriaError::InvalidFilter(_)));
        }
        let ok = Filter::new("retryCount", Operator::Between, json!([1, 4])).unwrap();
        assert_eq!(ok, Filter::between("retryCount", 1, 4));
    }

    #[test]
    fn other_operators_accept_any_value() {
        assert!(Filter::new("name", Operator::In, json!("a")).is_ok());
        assert!(Filter::new("name", Operator::IsNull, json!([1, 2, 3])).is_ok());
    }
}

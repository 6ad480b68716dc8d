//! Lowers a [`Criteria`] into a [`QueryDescriptor`].

use super::descriptor::{CompareOp, OrderBy, Predicate, QueryDescriptor};
use crate::case::to_snake_case;
use crate::criteria::{between_bounds, Criteria, Filter, Operator};
use crate::error::CriteriaError;
use serde_json::Value;

/// Stateless: the same criteria always lowers to the same descriptor.
#[derive(Clone, Copy, Debug, Default)]
pub struct CriteriaConverter;

impl CriteriaConverter {
    pub fn convert(&self, criteria: &Criteria) -> Result<QueryDescriptor, CriteriaError> {
        let conditions = self.conditions(criteria)?;
        let order = criteria
            .sorts
            .iter()
            .map(|s| OrderBy {
                column: to_snake_case(&s.field),
                direction: s.direction,
            })
            .collect();
        Ok(QueryDescriptor {
            conditions,
            order,
            limit: Some(criteria.pagination.take()),
            offset: Some(criteria.pagination.skip()),
        })
    }

    /// Filter conditions only; used for the count that accompanies a page.
    pub fn conditions(&self, criteria: &Criteria) -> Result<Vec<Predicate>, CriteriaError> {
        criteria.filters.iter().map(|f| self.lower_filter(f)).collect()
    }

    pub fn lower_filter(&self, filter: &Filter) -> Result<Predicate, CriteriaError> {
        let column = to_snake_case(&filter.field);
        let value = &filter.value;
        Ok(match filter.operator {
            Operator::Equal => compare(column, CompareOp::Eq, value),
            Operator::NotEqual => compare(column, CompareOp::Ne, value),
            Operator::Like | Operator::Contains => Predicate::Like {
                column,
                pattern: format!("%{}%", pattern_text(value)),
            },
            Operator::StartsWith => Predicate::Like {
                column,
                pattern: format!("{}%", pattern_text(value)),
            },
            Operator::EndsWith => Predicate::Like {
                column,
                pattern: format!("%{}", pattern_text(value)),
            },
            Operator::In => Predicate::In {
                column,
                values: match value {
                    Value::Array(items) => items.clone(),
                    scalar => vec![scalar.clone()],
                },
            },
            Operator::Between => {
                let (low, high) = between_bounds(&filter.field, value)?;
                Predicate::Between {
                    column,
                    low: low.clone(),
                    high: high.clone(),
                }
            }
            Operator::GreaterThan => compare(column, CompareOp::Gt, value),
            Operator::LessThan => compare(column, CompareOp::Lt, value),
            Operator::IsNull => Predicate::IsNull { column },
        })
    }
}

fn compare(column: String, op: CompareOp, value: &Value) -> Predicate {
    Predicate::Compare {
        column,
        op,
        value: value.clone(),
    }
}

fn pattern_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

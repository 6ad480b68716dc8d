//! Closed set of filter comparison semantics.

use crate::error::CriteriaError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    #[serde(rename = "equals")]
    Equal,
    #[serde(rename = "notEquals")]
    NotEqual,
    Like,
    Contains,
    StartsWith,
    EndsWith,
    In,
    Between,
    GreaterThan,
    LessThan,
    IsNull,
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::Like,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::In,
        Operator::Between,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::IsNull,
    ];

    /// Wire tag, e.g. `notEquals`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "equals",
            Operator::NotEqual => "notEquals",
            Operator::Like => "like",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::In => "in",
            Operator::Between => "between",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::IsNull => "isNull",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operator {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CriteriaError::InvalidFilter(format!("unknown operator: {}", s)))
    }
}

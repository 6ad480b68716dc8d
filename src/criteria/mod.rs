//! Persistence-agnostic filters, sorts, and pagination.
//!
//! A [`Criteria`] is built by appends and then handed to a repository by
//! reference. Field names are entity field names (camelCase); lowering them to
//! columns is the converter's job.

mod filter;
mod operator;
mod pagination;
mod sort;

pub use filter::Filter;
pub(crate) use filter::between_bounds;
pub use operator::Operator;
pub use pagination::{Pagination, DEFAULT_TAKE};
pub use sort::{Sort, SortDirection};

use crate::error::CriteriaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PAGE_PARAM: &str = "page";
const LIMIT_PARAM: &str = "limit";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub sorts: Vec<Sort>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl Criteria {
    pub fn new() -> Self {
        Criteria::default()
    }

    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn add_sort(&mut self, sort: Sort) {
        self.sorts.push(sort);
    }

    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.pagination = pagination;
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.add_filter(filter);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.add_sort(sort);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.set_pagination(pagination);
        self
    }

    /// Build criteria from untyped query parameters.
    ///
    /// Every key except `page`/`limit` becomes an `Equal` filter, in iteration order.
    /// `page` and `limit` only apply when both are present. Null values are skipped.
    pub fn from_query_params<I, K>(params: I) -> Result<Self, CriteriaError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut criteria = Criteria::new();
        let mut page = None;
        let mut limit = None;
        for (key, value) in params {
            let key = key.into();
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                PAGE_PARAM => page = Some(positive_param(PAGE_PARAM, &value)?),
                LIMIT_PARAM => limit = Some(positive_param(LIMIT_PARAM, &value)?),
                _ => criteria.add_filter(Filter::equal(key, value)),
            }
        }
        if let (Some(page), Some(limit)) = (page, limit) {
            criteria.set_pagination(Pagination::from_page(page, limit)?);
        }
        Ok(criteria)
    }
}

fn positive_param(name: &str, value: &Value) -> Result<u64, CriteriaError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(CriteriaError::InvalidPagination(format!(
            "{} must be a positive integer, got {}",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_has_no_filters_or_sorts() {
        let c = Criteria::new();
        assert!(c.filters.is_empty());
        assert!(c.sorts.is_empty());
        assert_eq!(c.pagination, Pagination::default());
    }

    #[test]
    fn appends_keep_order() {
        let mut c = Criteria::new();
        c.add_filter(Filter::equal("status", "pending"));
        c.add_filter(Filter::greater_than("retryCount", 1));
        c.add_sort(Sort::desc("startTime"));
        c.add_sort(Sort::asc("name"));
        assert_eq!(c.filters[0].field, "status");
        assert_eq!(c.filters[1].operator, Operator::GreaterThan);
        assert_eq!(c.sorts[0], Sort::desc("startTime"));
        assert_eq!(c.sorts[1].direction, SortDirection::Ascending);
    }

    #[test]
    fn query_params_become_equal_filters_and_page() {
        let c = Criteria::from_query_params(vec![
            ("status", json!("error")),
            ("page", json!("3")),
            ("name", Value::Null),
            ("limit", json!(20)),
            ("retryCount", json!(2)),
        ])
        .unwrap();
        assert_eq!(
            c.filters,
            vec![Filter::equal("status", "error"), Filter::equal("retryCount", 2)]
        );
        assert_eq!(c.pagination.skip(), 40);
        assert_eq!(c.pagination.take(), 20);
    }

    #[test]
    fn page_without_limit_keeps_default() {
        let c = Criteria::from_query_params(vec![("page", json!(4))]).unwrap();
        assert_eq!(c.pagination, Pagination::default());
        assert!(c.filters.is_empty());
    }

    #[test]
    fn bad_page_is_rejected() {
        let err = Criteria::from_query_params(vec![("page", json!(0)), ("limit", json!(10))]).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidPagination(_)));
        assert!(Criteria::from_query_params(vec![("limit", json!("ten"))]).is_err());
    }
}

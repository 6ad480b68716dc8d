//! Paginated result envelope returned by criteria queries.

use crate::criteria::Pagination;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// `{ data, pagination: { total, page, limit, totalPages } }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> PaginatedResult<T> {
    /// `total` counts every match, ignoring the window in `pagination`.
    pub fn new(data: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        let limit = pagination.take();
        PaginatedResult {
            data,
            pagination: PageMeta {
                total,
                page: pagination.page(),
                limit,
                total_pages: total.div_ceil(limit),
            },
        }
    }

    /// Everything in one page. An empty list reports a limit and page count of zero.
    pub fn single_page(data: Vec<T>) -> Self {
        let len = data.len() as u64;
        PaginatedResult {
            data,
            pagination: PageMeta {
                total: len,
                page: 1,
                limit: len,
                total_pages: u64::from(len > 0),
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

impl<T: Serialize> IntoResponse for PaginatedResult<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

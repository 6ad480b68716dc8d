use crate::error::CriteriaError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TAKE: u64 = 10;

/// Window over a result set. `take` is always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPagination")]
pub struct Pagination {
    take: u64,
    skip: u64,
}

#[derive(Deserialize)]
struct RawPagination {
    take: u64,
    #[serde(default)]
    skip: u64,
}

impl TryFrom<RawPagination> for Pagination {
    type Error = CriteriaError;

    fn try_from(raw: RawPagination) -> Result<Self, Self::Error> {
        Pagination::new(raw.take, raw.skip)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            take: DEFAULT_TAKE,
            skip: 0,
        }
    }
}

impl Pagination {
    pub fn new(take: u64, skip: u64) -> Result<Self, CriteriaError> {
        if take == 0 {
            return Err(CriteriaError::InvalidPagination("take must be positive".into()));
        }
        Ok(Pagination { take, skip })
    }

    /// 1-based page of `limit` rows: `skip = (page - 1) * limit`, `take = limit`.
    pub fn from_page(page: u64, limit: u64) -> Result<Self, CriteriaError> {
        if page == 0 {
            return Err(CriteriaError::InvalidPagination("page must be at least 1".into()));
        }
        if limit == 0 {
            return Err(CriteriaError::InvalidPagination("limit must be at least 1".into()));
        }
        let skip = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| CriteriaError::InvalidPagination("page out of range".into()))?;
        Ok(Pagination { take: limit, skip })
    }

    pub fn take(&self) -> u64 {
        self.take
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    /// 1-based page this window starts on.
    pub fn page(&self) -> u64 {
        self.skip / self.take + 1
    }
}

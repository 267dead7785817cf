//! Page-based pagination (`page=2&limit=10`).

use serde::Serialize;

use super::spec::QuerySpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: u64,

    /// Records per page
    pub limit: u64,
}

impl Pagination {
    /// Read `page` and `limit`, falling back to the given defaults for
    /// anything that is not a positive integer
    pub fn from_spec(spec: &QuerySpec, default_page: u64, default_limit: u64) -> Self {
        Self {
            page: parse_positive(spec.text("page")).unwrap_or(default_page),
            limit: parse_positive(spec.text("limit")).unwrap_or(default_limit),
        }
    }

    /// Records skipped before this page
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|text| text.parse::<u64>().ok())
        .filter(|n| *n > 0)
}

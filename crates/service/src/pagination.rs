//! Pagination utilities for service layer
//!
//! Raw `page`/`limit` query strings are normalized here; malformed input falls
//! back to defaults instead of failing.

/// Bounds applied when normalizing pagination input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationPolicy {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationPolicy {
    fn default() -> Self { Self { default_limit: 12, max_limit: 100 } }
}

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page
    pub limit: u64,
}

impl Pagination {
    /// Parse `page`/`limit`; anything unparsable or `< 1` takes the default,
    /// and `limit` is capped at `policy.max_limit`.
    ///
    /// `page` is capped so that `skip()` stays within `i64`, the widest offset
    /// the store accepts.
    pub fn from_params(page: Option<&str>, limit: Option<&str>, policy: PaginationPolicy) -> Self {
        let limit = parse_positive(limit)
            .unwrap_or(policy.default_limit)
            .min(policy.max_limit)
            .max(1);
        let page = parse_positive(page).unwrap_or(1).min(Self::max_page(limit));
        Self { page, limit }
    }

    fn max_page(limit: u64) -> u64 {
        MAX_SKIP / limit + 1
    }

    /// Rows to skip before this page, never above `i64::MAX`.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit).min(MAX_SKIP)
    }
}

const MAX_SKIP: u64 = i64::MAX as u64;

impl Default for Pagination {
    fn default() -> Self {
        let policy = PaginationPolicy::default();
        Self { page: 1, limit: policy.default_limit }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n >= 1)
}

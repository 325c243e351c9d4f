//! Query-string → `(AnketaFilter, QueryOptions)`.
//!
//! The builder is total: malformed values degrade to "no constraint" or to the
//! pagination defaults, never to an error.

use serde::Deserialize;
use uuid::Uuid;

use super::domain::{AnketaFilter, QueryOptions, SortKey};
use crate::pagination::{Pagination, PaginationPolicy};

/// Raw listing query parameters, exactly as they arrive on the URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnketaQueryParams {
    pub city_id: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_rating: Option<String>,
    pub only_with_reviews: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub fn build_anketa_filters(params: &AnketaQueryParams, policy: PaginationPolicy) -> (AnketaFilter, QueryOptions) {
    let filter = AnketaFilter {
        city_id: parse_uuid(params.city_id.as_deref()),
        category: non_empty(params.category.as_deref()).map(str::to_string),
        search: parse_search(params.search.as_deref()),
        min_rating: parse_min_rating(params.min_rating.as_deref()),
        only_with_reviews: parse_flag(params.only_with_reviews.as_deref()),
    };

    let paging = Pagination::from_params(params.page.as_deref(), params.limit.as_deref(), policy);
    let options = QueryOptions {
        page: paging.page,
        limit: paging.limit,
        skip: paging.skip(),
        take: paging.limit,
        sort: SortKey::parse(params.sort_by.as_deref()),
    };
    (filter, options)
}

pub(crate) fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_uuid(raw: Option<&str>) -> Option<Uuid> {
    non_empty(raw).and_then(|s| Uuid::parse_str(s).ok())
}

pub(crate) fn parse_search(raw: Option<&str>) -> Option<String> {
    non_empty(raw).map(str::to_lowercase)
}

/// Finite, non-negative numbers only.
fn parse_min_rating(raw: Option<&str>) -> Option<f64> {
    non_empty(raw)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(|s| s.trim().eq_ignore_ascii_case("true")).unwrap_or(false)
}

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Raw `page`/`limit` query parameters.
///
/// Kept as strings so that malformed values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    #[param(example = "1")]
    pub page: Option<String>,
    #[param(example = "10")]
    pub limit: Option<String>,
}

/// Resolved pagination window. `page` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Resolve raw query parameters against an endpoint-specific default
    /// limit. Non-numeric or non-positive values default rather than error.
    pub fn from_query(query: &PageQuery, default_limit: i64) -> Self {
        Self {
            page: parse_or(query.page.as_deref(), 1),
            limit: parse_or(query.limit.as_deref(), default_limit),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

/// Page metadata attached to every list response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[schema(example = "1")]
    pub current_page: i64,
    #[schema(example = "3")]
    pub total_pages: i64,
    #[schema(example = "25")]
    pub total_count: i64,
    pub has_more: bool,
    #[schema(example = "10")]
    pub limit: i64,
}

impl PageMeta {
    pub fn new(pagination: Pagination, total_count: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + pagination.limit - 1) / pagination.limit
        };
        Self {
            current_page: pagination.page,
            total_pages,
            total_count,
            has_more: pagination.page < total_pages,
            limit: pagination.limit,
        }
    }
}

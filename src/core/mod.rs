//! Core business logic, independent of the HTTP layer.
//!
//! Every function takes a database connection (or transaction) explicitly;
//! there is no global state.

/// Product catalog: categories and products
pub mod catalog;
/// Client management
pub mod client;
/// Password hashing and token generation
pub mod credentials;
/// Ingredient inventory and recipes
pub mod ingredient;
/// Invoice emission, numbering and annulment
pub mod invoice;
/// Order building and queries
pub mod order;
/// Document snapshots and text rendering
pub mod report;
/// Startup seeding from configuration
pub mod seed;
/// Login sessions
pub mod session;
/// Order status lookup and seeding
pub mod status;
/// Ingredient stock consumption for orders
pub mod stock;
/// Order status transitions and their side effects
pub mod transition;
/// User accounts
pub mod user;

use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for paginated listings
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Largest row offset a page request may reach (SQLite offsets are `i64`)
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Page request for list endpoints (1-based page number).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Page number clamped to at least 1 and to pages whose offset fits in SQL
    #[must_use]
    pub fn page(self) -> u64 {
        self.page.clamp(1, MAX_OFFSET / self.limit() + 1)
    }

    /// Page size clamped to `1..=100`
    #[must_use]
    pub fn limit(self) -> u64 {
        self.limit.clamp(1, 100)
    }
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Pagination metadata returned alongside a page of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Builds pagination metadata for `total` items split by `request`.
    #[must_use]
    pub fn new(total: u64, request: PageRequest) -> Self {
        let limit = request.limit();
        Self {
            total,
            total_pages: total.div_ceil(limit),
            current_page: request.page(),
            limit,
        }
    }
}

/// Wraps a user-provided search term into a SQL `LIKE` pattern.
#[must_use]
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

/// Trims an optional string, mapping blank input to `None`.
#[must_use]
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a date filter bound given either as RFC 3339 or as `YYYY-MM-DD`.
///
/// A bare date maps to the start of that day, or to its last second when
/// `end_of_day` is set, so date ranges are inclusive on both ends.
pub fn parse_date_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::invalid_input(format!("Invalid date '{value}'")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| Error::invalid_input(format!("Invalid date '{value}'")))?;
    Ok(date.and_time(time).and_utc())
}

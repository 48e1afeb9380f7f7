//! This modules defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A page request after clamping to the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The 1-based page number.
    pub page: u64,
    /// The number of items per page, at least 1.
    pub page_size: u64,
}

impl Pagination {
    /// Clamp the requested `page` and `page_size` to valid values.
    ///
    /// Out of range values are corrected rather than rejected: a missing or
    /// non-positive page becomes the default page, a missing or non-positive
    /// page size becomes the default page size and an oversized page size is
    /// capped at the maximum.
    pub fn clamp(page: Option<i64>, page_size: Option<i64>, config: &PaginationConfig) -> Self {
        let page = match page {
            Some(page) if page >= 1 => page as u64,
            _ => config.default_page.max(1),
        };

        let max_page_size = config.max_page_size.max(1);
        let page_size = match page_size {
            Some(page_size) if page_size >= 1 => (page_size as u64).min(max_page_size),
            _ => config.default_page_size.clamp(1, max_page_size),
        };

        Self { page, page_size }
    }

    /// The number of items to skip to reach this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Describe this page given the `total` number of matching items.
    pub fn info(&self, total: u64) -> PageInfo {
        PageInfo {
            page: self.page,
            page_size: self.page_size,
            total,
            total_pages: total.div_ceil(self.page_size),
        }
    }
}

/// Page metadata returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// The 1-based page number.
    pub page: u64,
    /// The number of items per page.
    pub page_size: u64,
    /// The number of items matching the query, ignoring pagination.
    pub total: u64,
    /// `ceil(total / page_size)`.
    pub total_pages: u64,
}

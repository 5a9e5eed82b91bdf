//! Query and result types shared by both catalog backends.

use serde::{Deserialize, Serialize};

use crate::record::CatalogRecord;

/// Page size used when a query does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a query may request.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Bounds applied when normalizing a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Filters plus the requested page.
///
/// Build it with [`Query::normalized`] (or [`QueryRequest::into_query`]) so
/// that page and size are already clamped when a backend sees it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    /// Case-insensitive title substring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Query {
    /// Clamp page to at least 1 and size to `[1, max_page_size]`, and drop
    /// non-finite price bounds and blank search text.
    pub fn normalized(mut self, limits: &QueryLimits) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, limits.max_page_size.max(1));
        self.min_price = self.min_price.filter(|p| p.is_finite());
        self.max_price = self.max_price.filter(|p| p.is_finite());
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// Number of matching rows skipped before the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// True when no filter is set.
    pub fn is_unfiltered(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_rating.is_none()
            && self.in_stock.is_none()
            && self.search.is_none()
    }
}

/// Query as it arrives from a caller, with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<u8>,
    pub in_stock: Option<bool>,
    pub search: Option<String>,
}

impl QueryRequest {
    /// Fill defaults and clamp against `limits`.
    pub fn into_query(self, limits: &QueryLimits) -> Query {
        Query {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(limits.default_page_size),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            in_stock: self.in_stock,
            search: self.search,
        }
        .normalized(limits)
    }
}

/// One page of matching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Matches across all pages, computed over the same generation as `items`.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    /// Matching records for the requested page, in crawl order.
    pub items: Vec<CatalogRecord>,
    /// Generation the result was computed against.
    pub generation: u64,
}

impl QueryResult {
    /// Number of pages needed to show every match.
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

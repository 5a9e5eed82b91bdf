//! Book listing and lookup handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shelfscan_core::{CatalogRecord, QueryRequest, QueryResult};

use super::handlers::{catalog_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Raw query string of `GET /books`.
///
/// Values stay strings so that malformed numbers are ignored instead of
/// rejecting the whole request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQueryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub rating: Option<String>,
    pub in_stock: Option<String>,
    pub search: Option<String>,
}

impl BookQueryParams {
    pub fn into_request(self) -> QueryRequest {
        QueryRequest {
            page: parse_positive(self.page.as_deref()),
            // Zero means "use the default", not "one row".
            limit: parse_positive(self.limit.as_deref()),
            min_price: parse_number(self.min_price.as_deref()),
            max_price: parse_number(self.max_price.as_deref()),
            min_rating: parse_rating(self.rating.as_deref()),
            // Any value other than "true" selects out-of-stock records.
            in_stock: self.in_stock.map(|v| v == "true"),
            search: self.search,
        }
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    parse_number(raw)
        .map(f64::floor)
        .filter(|n| *n >= 1.0)
        .map(|n| n.min(f64::from(u32::MAX)) as u32)
}

/// Ratings are whole stars, so `rating=3.5` behaves like `rating=4`.
fn parse_rating(raw: Option<&str>) -> Option<u8> {
    parse_number(raw)
        .filter(|n| *n > 0.0)
        .map(|n| n.ceil().min(f64::from(u8::MAX)) as u8)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/books
///
/// Filtered, paginated listing of the current generation.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookQueryParams>,
) -> Result<Json<QueryResult>, ApiError> {
    state
        .engine()
        .search(params.into_request())
        .map(Json)
        .map_err(catalog_error)
}

/// GET /api/v1/books/{id}
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CatalogRecord>, ApiError> {
    state.engine().lookup(&id).map(Json).map_err(catalog_error)
}

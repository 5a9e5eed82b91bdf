//! Catalog API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use shelfscan_core::CatalogStats;

use super::handlers::{catalog_error, ApiError};
use crate::state::AppState;

/// GET /api/v1/catalog/stats
///
/// Summary of the currently published generation.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<CatalogStats>, ApiError> {
    state.engine().stats().map(Json).map_err(catalog_error)
}

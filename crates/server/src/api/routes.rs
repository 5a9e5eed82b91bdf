use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{books, catalog, handlers, refresh};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Refresh trigger and cancel require the shared secret
    let gated_routes = Router::new()
        .route(
            "/refresh",
            post(refresh::trigger_refresh).delete(refresh::cancel_refresh),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Catalog reads
        .route("/books", get(books::list_books))
        .route("/books/{id}", get(books::get_book))
        .route("/catalog/stats", get(catalog::get_stats))
        // Refresh
        .route("/refresh/status", get(refresh::get_status))
        .merge(gated_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

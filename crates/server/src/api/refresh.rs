//! Refresh API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use shelfscan_core::{RefreshError, RefreshOutcome, RefreshStatus};
use tracing::{error, info, warn};

use super::handlers::{api_error, ApiError};
use super::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// POST /api/v1/refresh
///
/// Run a full refresh and wait for its outcome. A failed crawl answers 502
/// with the failure body; the previous generation keeps serving. A client
/// that hangs up does not stop the refresh.
pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
    AuthUser(subject): AuthUser,
) -> Result<(StatusCode, Json<RefreshOutcome>), ApiError> {
    info!(subject = %subject, "Refresh requested");

    match state.orchestrator().refresh().await {
        Ok(outcome) => {
            let status = if outcome.is_published() {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            Ok((status, Json(outcome)))
        }
        Err(err @ RefreshError::InProgress { .. }) => {
            warn!(subject = %subject, "Refresh rejected: {}", err);
            Err(api_error(StatusCode::CONFLICT, err.to_string()))
        }
        Err(err @ RefreshError::TaskFailed(_)) => {
            error!(subject = %subject, "Refresh did not report an outcome: {}", err);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}

/// DELETE /api/v1/refresh
///
/// Ask the running refresh to stop; the catalog is left as it was.
pub async fn cancel_refresh(State(state): State<Arc<AppState>>) -> Json<CancelResponse> {
    let cancelled = state.orchestrator().cancel();
    if cancelled {
        info!("Refresh cancellation requested");
    }
    Json(CancelResponse { cancelled })
}

/// GET /api/v1/refresh/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RefreshStatus> {
    Json(state.orchestrator().status())
}

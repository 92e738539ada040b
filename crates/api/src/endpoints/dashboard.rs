//! Dashboards and statistics.

use axum::{Router, extract::State, routing::get};
use safenet_common::AppResult;
use safenet_core::{Dashboard, Stats};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Role-conditional landing data.
async fn dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Dashboard>> {
    let dashboard = state.stats_service.dashboard(&auth.actor()).await?;
    Ok(ApiResponse::ok(dashboard))
}

async fn stats(auth: AuthUser, State(state): State<AppState>) -> AppResult<ApiResponse<Stats>> {
    let stats = state.stats_service.stats(&auth.actor()).await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/api/stats", get(stats))
}

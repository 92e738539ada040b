//! Public directory of verified organizations.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use safenet_common::AppResult;
use safenet_db::entities::organization;
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub category: Option<String>,
}

async fn directory(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> AppResult<ApiResponse<Vec<organization::Model>>> {
    let organizations = state
        .organization_service
        .directory(query.category.as_deref())
        .await?;
    Ok(ApiResponse::ok(organizations))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/directory", get(directory))
}

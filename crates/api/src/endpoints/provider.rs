//! Provider endpoints.

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use safenet_common::AppResult;
use safenet_core::{ReportDetail, StatusUpdateInput, UpdateOrganizationInput};
use safenet_db::entities::{aid_request, organization, report};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, ClientIp},
    middleware::AppState,
    response::ApiResponse,
};

async fn list_reports(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<report::Model>>> {
    let reports = state
        .report_service
        .list_for_provider(&auth.actor())
        .await?;
    Ok(ApiResponse::ok(reports))
}

async fn get_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<ReportDetail>> {
    let detail = state.report_service.detail(&auth.actor(), id).await?;
    Ok(ApiResponse::ok(detail))
}

/// Form post from the provider report page.
async fn update_report_form(
    auth: AuthUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<i32>,
    Form(input): Form<StatusUpdateInput>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .update_status(&auth.actor(), id, input, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::ok(report))
}

async fn update_report_json(
    auth: AuthUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<i32>,
    Json(input): Json<StatusUpdateInput>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .update_status(&auth.actor(), id, input, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::ok(report))
}

async fn list_aid_requests(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i32>,
) -> AppResult<ApiResponse<Vec<aid_request::Model>>> {
    let aid_requests = state
        .aid_request_service
        .list_for_report(&auth.actor(), report_id)
        .await?;
    Ok(ApiResponse::ok(aid_requests))
}

#[derive(Debug, Deserialize)]
pub struct AidStatusRequest {
    pub status: String,
}

async fn update_aid_request(
    auth: AuthUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<i32>,
    Json(req): Json<AidStatusRequest>,
) -> AppResult<ApiResponse<aid_request::Model>> {
    let aid_request = state
        .aid_request_service
        .update_status(&auth.actor(), id, &req.status, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::ok(aid_request))
}

async fn get_organization(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<organization::Model>> {
    let organization = state.organization_service.own(&auth.actor()).await?;
    Ok(ApiResponse::ok(organization))
}

async fn update_organization(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateOrganizationInput>,
) -> AppResult<ApiResponse<organization::Model>> {
    let organization = state
        .organization_service
        .update_profile(&auth.actor(), input)
        .await?;
    Ok(ApiResponse::ok(organization))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/provider/reports", get(list_reports))
        .route("/provider/reports/{id}", get(get_report))
        .route("/provider/reports/{id}/aid_requests", get(list_aid_requests))
        .route("/provider/update_report/{id}", post(update_report_form))
        .route("/api/reports/{id}/status", post(update_report_json))
        .route("/provider/aid_requests/{id}", post(update_aid_request))
        .route(
            "/provider/organization",
            get(get_organization).put(update_organization),
        )
}

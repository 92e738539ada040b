//! Administrator endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use safenet_common::{AppError, AppResult};
use safenet_core::{OrganizationDetail, ReportDetail, VerifyOrganizationInput};
use safenet_db::{
    entities::{
        organization,
        report::{self, ReportStatus},
        system_log,
    },
    repositories::ReportFilter,
};
use serde::{Deserialize, Serialize};

use super::Page;
use crate::{
    extractors::{AuthUser, ClientIp},
    middleware::AppState,
    response::ApiResponse,
};

/// A page of results with the unpaged total.
#[derive(Debug, Serialize)]
pub struct Paged<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub provider_id: Option<i32>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ReportListQuery {
    const fn page(&self) -> Page {
        Page {
            limit: self.limit,
            offset: self.offset,
        }
    }

    fn filter(&self) -> AppResult<ReportFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                ReportStatus::parse(raw)
                    .ok_or_else(|| AppError::Validation(format!("Invalid status: {raw}")))?,
            ),
        };
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(ReportFilter {
            status,
            category,
            provider_id: self.provider_id,
        })
    }
}

async fn list_reports(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ReportListQuery>,
) -> AppResult<ApiResponse<Paged<report::Model>>> {
    let filter = query.filter()?;
    let page = query.page();
    let (limit, offset) = (page.limit(), page.offset());
    let (items, total) = state
        .report_service
        .list(&auth.actor(), &filter, limit, offset)
        .await?;

    Ok(ApiResponse::ok(Paged {
        items,
        total,
        limit,
        offset,
    }))
}

async fn get_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<ReportDetail>> {
    let detail = state.report_service.detail(&auth.actor(), id).await?;
    Ok(ApiResponse::ok(detail))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub organization_id: i32,
}

async fn assign_report(
    auth: AuthUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<i32>,
    Json(req): Json<AssignRequest>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .assign(&auth.actor(), id, req.organization_id, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::ok(report))
}

#[derive(Debug, Deserialize)]
pub struct PriorityRequest {
    pub priority: String,
}

async fn set_priority(
    auth: AuthUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<i32>,
    Json(req): Json<PriorityRequest>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .set_priority(&auth.actor(), id, &req.priority, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::ok(report))
}

#[derive(Debug, Deserialize)]
pub struct OrganizationListQuery {
    pub verified: Option<bool>,
}

async fn list_organizations(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<OrganizationListQuery>,
) -> AppResult<ApiResponse<Vec<organization::Model>>> {
    let organizations = state
        .organization_service
        .list(&auth.actor(), query.verified)
        .await?;
    Ok(ApiResponse::ok(organizations))
}

async fn get_organization(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<OrganizationDetail>> {
    let detail = state
        .organization_service
        .get_detail(&auth.actor(), id)
        .await?;
    Ok(ApiResponse::ok(detail))
}

async fn verify_provider(
    auth: AuthUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<i32>,
    Json(input): Json<VerifyOrganizationInput>,
) -> AppResult<ApiResponse<organization::Model>> {
    let organization = state
        .organization_service
        .verify(&auth.actor(), id, input, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::ok(organization))
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub event_type: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

async fn list_logs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> AppResult<ApiResponse<Paged<system_log::Model>>> {
    let page = Page {
        limit: query.limit,
        offset: query.offset,
    };
    let (limit, offset) = (page.limit(), page.offset());
    let event_type = query
        .event_type
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let (items, total) = state
        .audit
        .list(&auth.actor(), event_type, limit, offset)
        .await?;

    Ok(ApiResponse::ok(Paged {
        items,
        total,
        limit,
        offset,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/{id}", get(get_report))
        .route("/reports/{id}/priority", post(set_priority))
        .route("/assign_report/{id}", post(assign_report))
        .route("/organizations", get(list_organizations))
        .route("/organizations/{id}", get(get_organization))
        .route("/verify_provider/{id}", post(verify_provider))
        .route("/logs", get(list_logs))
}

//! Anonymous report intake and tracking.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use safenet_common::{AppError, AppResult};
use safenet_core::{
    AidRequestInput, AttachmentUpload, SubmissionOptions, SubmitReportInput, TrackedReport,
};
use safenet_db::entities::report::{self, ReportStatus};
use serde::Serialize;

use crate::{extractors::ClientIp, middleware::AppState, response::ApiResponse};

/// Returned once to the submitter; the tracking code is never shown again.
#[derive(Debug, Serialize)]
pub struct SubmitReportResponse {
    pub tracking_code: String,
    pub status: ReportStatus,
    pub submitted_at: DateTime<Utc>,
}

impl From<report::Model> for SubmitReportResponse {
    fn from(report: report::Model) -> Self {
        Self {
            tracking_code: report.tracking_code,
            status: report.status,
            submitted_at: report.submitted_at.with_timezone(&Utc),
        }
    }
}

async fn submission_options(State(state): State<AppState>) -> ApiResponse<SubmissionOptions> {
    ApiResponse::ok(state.report_service.submission_options())
}

/// Multipart submission with attachments.
async fn submit_form(
    State(state): State<AppState>,
    client_ip: ClientIp,
    multipart: Multipart,
) -> AppResult<ApiResponse<SubmitReportResponse>> {
    let (input, attachments) = read_submission(multipart).await?;
    let report = state
        .report_service
        .submit(input, attachments, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::created(report.into()))
}

/// JSON submission without attachments.
async fn submit_json(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(input): Json<SubmitReportInput>,
) -> AppResult<ApiResponse<SubmitReportResponse>> {
    let report = state
        .report_service
        .submit(input, Vec::new(), client_ip.as_deref())
        .await?;
    Ok(ApiResponse::created(report.into()))
}

async fn track(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<TrackedReport>> {
    let tracked = state.report_service.track(&code).await?;
    Ok(ApiResponse::ok(tracked))
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed form data: {err}"))
}

async fn read_submission(
    mut multipart: Multipart,
) -> AppResult<(SubmitReportInput, Vec<AttachmentUpload>)> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut aid_types = Vec::new();
    let mut aid_descriptions = Vec::new();
    let mut aid_urgencies = Vec::new();
    let mut attachments = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field
            .name()
            .unwrap_or_default()
            .trim_end_matches("[]")
            .to_string();

        match name.as_str() {
            "file" | "files" | "attachments" => {
                let original_filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                // An untouched file input still sends an empty part.
                if original_filename.is_empty() && data.is_empty() {
                    continue;
                }
                attachments.push(AttachmentUpload {
                    original_filename,
                    data: data.to_vec(),
                });
            }
            "aid_type" => aid_types.push(field.text().await.map_err(bad_multipart)?),
            "aid_description" => aid_descriptions.push(field.text().await.map_err(bad_multipart)?),
            "aid_urgency" => aid_urgencies.push(field.text().await.map_err(bad_multipart)?),
            _ => {
                let value = field.text().await.map_err(bad_multipart)?;
                fields.insert(name, value);
            }
        }
    }

    let aid_requests = aid_types
        .into_iter()
        .enumerate()
        .filter(|(_, aid_type)| !aid_type.trim().is_empty())
        .map(|(i, aid_type)| AidRequestInput {
            aid_type,
            description: aid_descriptions.get(i).cloned(),
            urgency: aid_urgencies.get(i).cloned(),
        })
        .collect();

    let input = SubmitReportInput {
        category: fields.remove("category").unwrap_or_default(),
        description: fields.remove("description").unwrap_or_default(),
        location: fields.remove("location").unwrap_or_default(),
        incident_date: fields.remove("incident_date").unwrap_or_default(),
        latitude: parse_coordinate("latitude", fields.remove("latitude"))?,
        longitude: parse_coordinate("longitude", fields.remove("longitude"))?,
        priority: fields.remove("priority"),
        aid_requests,
    };

    Ok((input, attachments))
}

fn parse_coordinate(name: &str, raw: Option<String>) -> AppResult<Option<f64>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid {name}: {value}"))),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/report",
            get(submission_options)
                .post(submit_form)
                // Upload size is bounded by the request body limit and the
                // per-file checks in the report service.
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/api/reports", post(submit_json))
        .route("/track/{code}", get(track))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("latitude", None).ok(), Some(None));
        assert_eq!(
            parse_coordinate("latitude", Some("  ".to_string())).ok(),
            Some(None)
        );
        assert_eq!(
            parse_coordinate("latitude", Some("6.5244".to_string())).ok(),
            Some(Some(6.5244))
        );
        assert!(parse_coordinate("latitude", Some("north".to_string())).is_err());
        assert!(parse_coordinate("latitude", Some("NaN".to_string())).is_err());
    }
}

//! Application state and session middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use safenet_common::{Config, IpHasher, StorageBackend};
use safenet_core::{
    AccountService, AidRequestService, AuditLogger, LifecyclePolicy, OrganizationService,
    ReportService, StatsService,
};
use safenet_db::repositories::{
    AidRequestRepository, OrganizationRepository, ReportAttachmentRepository, ReportRepository,
    ReportUpdateRepository, SessionRepository, SystemLogRepository, UserRepository,
    VerificationRecordRepository,
};
use sea_orm::DatabaseConnection;

use crate::{extractors::SessionToken, rate_limit::RateLimiterState};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "safenet_session";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub organization_service: OrganizationService,
    pub report_service: ReportService,
    pub aid_request_service: AidRequestService,
    pub stats_service: StatsService,
    pub audit: AuditLogger,
    pub rate_limiter: RateLimiterState,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<Config>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let hasher = IpHasher::new(&config.security.ip_hash_secret);
        let policy = LifecyclePolicy::new(config.reports.allow_reopen);

        let user_repo = UserRepository::new(Arc::clone(&db));
        let session_repo = SessionRepository::new(Arc::clone(&db));
        let org_repo = OrganizationRepository::new(Arc::clone(&db));
        let report_repo = ReportRepository::new(Arc::clone(&db));
        let update_repo = ReportUpdateRepository::new(Arc::clone(&db));
        let attachment_repo = ReportAttachmentRepository::new(Arc::clone(&db));
        let aid_repo = AidRequestRepository::new(Arc::clone(&db));
        let verification_repo = VerificationRecordRepository::new(Arc::clone(&db));
        let log_repo = SystemLogRepository::new(Arc::clone(&db));

        let audit = AuditLogger::new(log_repo, hasher.clone());

        let account_service = AccountService::new(
            Arc::clone(&db),
            user_repo,
            org_repo.clone(),
            session_repo,
            audit.clone(),
            config.security.session_ttl_hours,
        );
        let organization_service = OrganizationService::new(
            Arc::clone(&db),
            org_repo.clone(),
            verification_repo,
            audit.clone(),
        );
        let report_service = ReportService::new(
            Arc::clone(&db),
            report_repo.clone(),
            update_repo,
            attachment_repo,
            aid_repo.clone(),
            org_repo.clone(),
            storage,
            audit.clone(),
            hasher,
            policy,
            &config.uploads,
        );
        let aid_request_service =
            AidRequestService::new(aid_repo.clone(), report_repo.clone(), audit.clone(), policy);
        let stats_service = StatsService::new(report_repo, org_repo, aid_repo);

        Self {
            account_service,
            organization_service,
            report_service,
            aid_request_service,
            stats_service,
            audit,
            rate_limiter: RateLimiterState::new(&config.rate_limit, config.server.trust_proxy),
            config,
        }
    }
}

/// Session token carried by the request, cookie first.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Authentication middleware.
///
/// Attaches the session user to the request when the token is valid. Requests
/// without a valid session pass through anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(req.headers()) {
        match state.account_service.authenticate_session(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
                req.extensions_mut().insert(SessionToken(token));
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Session lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; safenet_session=abc123"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz789"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz789"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(session_token(&headers), None);
    }
}

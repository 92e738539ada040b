//! Audit logging.
//!
//! Entries are written after the business transaction has committed. A failed
//! audit write is logged and swallowed; it never fails the operation that
//! triggered it.

use std::fmt;

use chrono::Utc;
use safenet_common::{AppError, AppResult, IpHasher};
use safenet_db::{entities::system_log, repositories::SystemLogRepository};
use sea_orm::Set;
use serde::Serialize;

use super::access::{Action, Actor, authorize};

/// Closed set of audit event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    AdminLoginSuccess,
    AdminLoginFailure,
    ProviderLoginSuccess,
    ProviderLoginFailure,
    ProviderRegistered,
    Logout,
    PasswordChanged,
    ReportSubmitted,
    ProviderVerified,
    ProviderRejected,
    ReportAssigned,
    ReportStatusUpdated,
    ReportPriorityChanged,
    AidRequestUpdated,
    AdminBootstrapped,
}

impl AuditEvent {
    pub const ALL: [Self; 15] = [
        Self::AdminLoginSuccess,
        Self::AdminLoginFailure,
        Self::ProviderLoginSuccess,
        Self::ProviderLoginFailure,
        Self::ProviderRegistered,
        Self::Logout,
        Self::PasswordChanged,
        Self::ReportSubmitted,
        Self::ProviderVerified,
        Self::ProviderRejected,
        Self::ReportAssigned,
        Self::ReportStatusUpdated,
        Self::ReportPriorityChanged,
        Self::AidRequestUpdated,
        Self::AdminBootstrapped,
    ];

    /// Stored name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AdminLoginSuccess => "admin_login_success",
            Self::AdminLoginFailure => "admin_login_failure",
            Self::ProviderLoginSuccess => "provider_login_success",
            Self::ProviderLoginFailure => "provider_login_failure",
            Self::ProviderRegistered => "provider_registered",
            Self::Logout => "logout",
            Self::PasswordChanged => "password_changed",
            Self::ReportSubmitted => "report_submitted",
            Self::ProviderVerified => "provider_verified",
            Self::ProviderRejected => "provider_rejected",
            Self::ReportAssigned => "report_assigned",
            Self::ReportStatusUpdated => "report_status_updated",
            Self::ReportPriorityChanged => "report_priority_changed",
            Self::AidRequestUpdated => "aid_request_updated",
            Self::AdminBootstrapped => "admin_bootstrapped",
        }
    }

    /// Parse a stored event name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == raw)
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit sink.
#[derive(Clone)]
pub struct AuditLogger {
    repo: SystemLogRepository,
    hasher: IpHasher,
}

impl AuditLogger {
    /// Create a new audit logger.
    #[must_use]
    pub const fn new(repo: SystemLogRepository, hasher: IpHasher) -> Self {
        Self { repo, hasher }
    }

    /// Record an event. The client address is hashed before it is stored.
    pub async fn record(
        &self,
        event: AuditEvent,
        user_id: Option<i32>,
        client_ip: Option<&str>,
        details: impl Into<String>,
    ) {
        let model = system_log::ActiveModel {
            event_type: Set(event.as_str().to_string()),
            user_id: Set(user_id),
            ip_hash: Set(self.hasher.hash_opt(client_ip)),
            details: Set(Some(details.into())),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match self.repo.create(model).await {
            Ok(entry) => {
                tracing::debug!(event = %event, entry_id = entry.id, "Audit entry recorded");
            }
            Err(e) => {
                tracing::warn!(event = %event, ?user_id, error = %e, "Failed to write audit entry");
            }
        }
    }

    /// Page through the audit log, newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        event_type: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<system_log::Model>, u64)> {
        authorize(actor, Action::ViewAuditLog)?;

        if let Some(raw) = event_type
            && AuditEvent::parse(raw).is_none()
        {
            return Err(AppError::Validation(format!("Unknown event type: {raw}")));
        }

        let entries = self.repo.list(event_type, limit, offset).await?;
        let total = self.repo.count(event_type).await?;
        Ok((entries, total))
    }
}

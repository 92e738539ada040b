//! Aid request ledger.

use chrono::Utc;
use safenet_common::{AppError, AppResult};
use safenet_db::{
    entities::aid_request::{self, AidStatus},
    repositories::{AidRequestRepository, ReportRepository},
};
use sea_orm::Set;

use super::{
    access::{Action, Actor, authorize},
    audit::{AuditEvent, AuditLogger},
    lifecycle::LifecyclePolicy,
};

/// Aid request service for business logic.
#[derive(Clone)]
pub struct AidRequestService {
    aid_repo: AidRequestRepository,
    report_repo: ReportRepository,
    audit: AuditLogger,
    policy: LifecyclePolicy,
}

impl AidRequestService {
    /// Create a new aid request service.
    #[must_use]
    pub const fn new(
        aid_repo: AidRequestRepository,
        report_repo: ReportRepository,
        audit: AuditLogger,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            aid_repo,
            report_repo,
            audit,
            policy,
        }
    }

    /// Aid requests of one report, for an administrator or the assigned provider.
    pub async fn list_for_report(
        &self,
        actor: &Actor,
        report_id: i32,
    ) -> AppResult<Vec<aid_request::Model>> {
        let report = self.report_repo.find_by_id(report_id).await?;
        authorize(
            actor,
            Action::ViewReport {
                assigned_org: report.as_ref().and_then(|r| r.assigned_provider_id),
            },
        )?;
        if report.is_none() {
            return Err(AppError::NotFound(format!("Report {report_id} not found")));
        }

        self.aid_repo.list_for_report(report_id).await
    }

    /// Move an aid request along its lifecycle.
    pub async fn update_status(
        &self,
        actor: &Actor,
        aid_request_id: i32,
        status: &str,
        client_ip: Option<&str>,
    ) -> AppResult<aid_request::Model> {
        let aid = self.aid_repo.find_by_id(aid_request_id).await?;
        let report = match &aid {
            Some(aid) => self.report_repo.find_by_id(aid.report_id).await?,
            None => None,
        };
        authorize(
            actor,
            Action::UpdateAidRequest {
                assigned_org: report.and_then(|r| r.assigned_provider_id),
            },
        )?;
        let aid = aid.ok_or_else(|| {
            AppError::NotFound(format!("Aid request {aid_request_id} not found"))
        })?;

        let target = AidStatus::parse(status)
            .ok_or_else(|| AppError::Validation(format!("Invalid aid request status: {status}")))?;
        let previous = aid.status;
        self.policy.check_aid_transition(previous, target)?;

        let mut active: aid_request::ActiveModel = aid.into();
        active.status = Set(target);
        if target == AidStatus::Fulfilled {
            active.fulfilled_at = Set(Some(Utc::now().into()));
        }
        let aid = self.aid_repo.update(active).await?;

        tracing::info!(
            aid_request_id,
            report_id = aid.report_id,
            user_id = actor.user_id,
            status = target.as_str(),
            "Aid request updated"
        );
        self.audit
            .record(
                AuditEvent::AidRequestUpdated,
                Some(actor.user_id),
                client_ip,
                format!(
                    "Aid request {aid_request_id} ({}) {} -> {}",
                    aid.aid_type,
                    previous.as_str(),
                    target.as_str()
                ),
            )
            .await;

        Ok(aid)
    }
}

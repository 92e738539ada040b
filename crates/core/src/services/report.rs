//! Report lifecycle service.
//!
//! Anonymous submission, public tracking, administrator assignment and
//! provider status updates. Every status change writes exactly one
//! [`report_update`] row inside the same transaction as the report itself.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use safenet_common::{
    AppError, AppResult, IdGenerator, IpHasher, StorageBackend, StoredFile,
    config::UploadConfig, file_extension, generate_storage_key,
};
use safenet_db::{
    entities::{
        aid_request::{self, AidStatus, Urgency},
        organization,
        report::{self, Priority, ReportStatus},
        report_attachment, report_update,
    },
    repositories::{
        AidRequestRepository, OrganizationRepository, ReportAttachmentRepository, ReportFilter,
        ReportRepository, ReportUpdateRepository,
    },
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    access::{Action, Actor, authorize},
    audit::{AuditEvent, AuditLogger},
    lifecycle::LifecyclePolicy,
};

/// Attempts at drawing an unused tracking code before giving up.
const TRACKING_CODE_ATTEMPTS: usize = 5;

/// Attachment types accepted at submission.
pub const ALLOWED_EXTENSIONS: [&str; 9] =
    ["png", "jpg", "jpeg", "gif", "webp", "mp4", "mov", "webm", "pdf"];

/// Suggested kinds of aid.
pub const AID_TYPES: [&str; 6] = ["Medical", "Legal", "Shelter", "Counseling", "Financial", "Other"];

/// One requested kind of assistance.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AidRequestInput {
    #[validate(length(min = 1, max = 50))]
    pub aid_type: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    /// Normal, Urgent or Critical; Normal when absent.
    pub urgency: Option<String>,
}

/// Input for an anonymous report.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitReportInput {
    #[validate(length(max = 50))]
    pub category: String,

    #[validate(length(max = 20000))]
    pub description: String,

    #[validate(length(max = 200))]
    pub location: String,

    /// `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or RFC 3339.
    pub incident_date: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Low, Medium, High or Critical; Medium when absent.
    pub priority: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub aid_requests: Vec<AidRequestInput>,
}

/// An uploaded file awaiting validation and storage.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub original_filename: String,
    pub data: Vec<u8>,
}

/// Input for a provider status update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusUpdateInput {
    pub status: String,

    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

/// Public history entry, without actor ids.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUpdate {
    pub status: ReportStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// What an anonymous reporter sees for their tracking code.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedReport {
    pub tracking_code: String,
    pub category: String,
    pub location: String,
    pub status: ReportStatus,
    pub priority: Priority,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub assigned_organization: Option<String>,
    pub updates: Vec<PublicUpdate>,
}

/// Full report view for administrators and the assigned provider.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDetail {
    pub report: report::Model,
    pub assigned_organization: Option<organization::Model>,
    pub updates: Vec<report_update::Model>,
    pub attachments: Vec<report_attachment::Model>,
    pub aid_requests: Vec<aid_request::Model>,
}

/// Options offered on the submission form.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOptions {
    pub allowed_extensions: Vec<&'static str>,
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub priorities: Vec<&'static str>,
    pub aid_types: Vec<&'static str>,
    pub urgencies: Vec<&'static str>,
}

struct ValidatedSubmission {
    category: String,
    description: String,
    location: String,
    incident_date: DateTime<Utc>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    priority: Priority,
    aid_requests: Vec<(String, Option<String>, Urgency)>,
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
    report_repo: ReportRepository,
    update_repo: ReportUpdateRepository,
    attachment_repo: ReportAttachmentRepository,
    aid_repo: AidRequestRepository,
    org_repo: OrganizationRepository,
    storage: Arc<dyn StorageBackend>,
    audit: AuditLogger,
    hasher: IpHasher,
    id_gen: IdGenerator,
    policy: LifecyclePolicy,
    max_file_bytes: u64,
    max_files: usize,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        report_repo: ReportRepository,
        update_repo: ReportUpdateRepository,
        attachment_repo: ReportAttachmentRepository,
        aid_repo: AidRequestRepository,
        org_repo: OrganizationRepository,
        storage: Arc<dyn StorageBackend>,
        audit: AuditLogger,
        hasher: IpHasher,
        policy: LifecyclePolicy,
        uploads: &UploadConfig,
    ) -> Self {
        Self {
            db,
            report_repo,
            update_repo,
            attachment_repo,
            aid_repo,
            org_repo,
            storage,
            audit,
            hasher,
            id_gen: IdGenerator::new(),
            policy,
            max_file_bytes: uploads.max_file_bytes,
            max_files: uploads.max_files,
        }
    }

    /// Choices and limits for the submission form.
    #[must_use]
    pub fn submission_options(&self) -> SubmissionOptions {
        SubmissionOptions {
            allowed_extensions: ALLOWED_EXTENSIONS.to_vec(),
            max_file_bytes: self.max_file_bytes,
            max_files: self.max_files,
            priorities: vec!["Low", "Medium", "High", "Critical"],
            aid_types: AID_TYPES.to_vec(),
            urgencies: vec!["Normal", "Urgent", "Critical"],
        }
    }

    /// Submit an anonymous report.
    ///
    /// The report, its attachments and its aid requests are committed in one
    /// transaction. Stored files are removed again if that transaction fails.
    pub async fn submit(
        &self,
        input: SubmitReportInput,
        attachments: Vec<AttachmentUpload>,
        client_ip: Option<&str>,
    ) -> AppResult<report::Model> {
        let submission = validate_submission(input, Utc::now())?;
        self.validate_attachments(&attachments)?;

        let tracking_code = self.unused_tracking_code().await?;

        let mut stored = Vec::with_capacity(attachments.len());
        for upload in &attachments {
            let key = generate_storage_key(&upload.original_filename);
            match self.storage.store(&key, &upload.data).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    self.remove_stored(&stored).await;
                    return Err(e);
                }
            }
        }

        let ip_hash = self.hasher.hash_opt(client_ip);
        let result = self
            .persist_submission(&tracking_code, submission, &attachments, &stored, ip_hash)
            .await;

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                self.remove_stored(&stored).await;
                return Err(e);
            }
        };

        tracing::info!(
            report_id = report.id,
            category = %report.category,
            attachments = stored.len(),
            "Report submitted"
        );
        self.audit
            .record(
                AuditEvent::ReportSubmitted,
                None,
                client_ip,
                format!("Report {} submitted ({})", report.id, report.category),
            )
            .await;

        Ok(report)
    }

    async fn persist_submission(
        &self,
        tracking_code: &str,
        submission: ValidatedSubmission,
        attachments: &[AttachmentUpload],
        stored: &[StoredFile],
        ip_hash: Option<String>,
    ) -> AppResult<report::Model> {
        let now = Utc::now();
        let txn = self.begin().await?;

        let report = self
            .report_repo
            .create_in(
                &txn,
                report::ActiveModel {
                    tracking_code: Set(tracking_code.to_string()),
                    category: Set(submission.category),
                    description: Set(submission.description),
                    location: Set(submission.location),
                    latitude: Set(submission.latitude),
                    longitude: Set(submission.longitude),
                    incident_date: Set(submission.incident_date.into()),
                    status: Set(ReportStatus::Pending),
                    priority: Set(submission.priority),
                    assigned_provider_id: Set(None),
                    submitted_at: Set(now.into()),
                    assigned_at: Set(None),
                    resolved_at: Set(None),
                    updated_at: Set(now.into()),
                    ip_hash: Set(ip_hash),
                    ..Default::default()
                },
            )
            .await?;

        for (upload, file) in attachments.iter().zip(stored) {
            self.attachment_repo
                .create_in(
                    &txn,
                    report_attachment::ActiveModel {
                        report_id: Set(report.id),
                        filename: Set(file.key.clone()),
                        original_filename: Set(upload.original_filename.clone()),
                        file_type: Set(file_extension(&upload.original_filename)
                            .unwrap_or_default()),
                        file_path: Set(file.path.clone()),
                        file_size: Set(file.size as i64),
                        created_at: Set(now.into()),
                        ..Default::default()
                    },
                )
                .await?;
        }

        for (aid_type, description, urgency) in submission.aid_requests {
            self.aid_repo
                .create_in(
                    &txn,
                    aid_request::ActiveModel {
                        report_id: Set(report.id),
                        aid_type: Set(aid_type),
                        description: Set(description),
                        status: Set(AidStatus::Pending),
                        urgency: Set(urgency),
                        created_at: Set(now.into()),
                        fulfilled_at: Set(None),
                        ..Default::default()
                    },
                )
                .await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(report)
    }

    fn validate_attachments(&self, attachments: &[AttachmentUpload]) -> AppResult<()> {
        if attachments.len() > self.max_files {
            return Err(AppError::Validation(format!(
                "At most {} attachments are allowed",
                self.max_files
            )));
        }

        for upload in attachments {
            let name = &upload.original_filename;
            let allowed = file_extension(name)
                .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
            if !allowed {
                return Err(AppError::Validation(format!(
                    "File type not allowed: {name}"
                )));
            }
            if upload.data.is_empty() {
                return Err(AppError::Validation(format!("File is empty: {name}")));
            }
            if upload.data.len() as u64 > self.max_file_bytes {
                return Err(AppError::Validation(format!(
                    "File exceeds {} bytes: {name}",
                    self.max_file_bytes
                )));
            }
        }

        Ok(())
    }

    async fn unused_tracking_code(&self) -> AppResult<String> {
        for attempt in 1..=TRACKING_CODE_ATTEMPTS {
            let code = self.id_gen.generate_tracking_code();
            if !self.report_repo.tracking_code_exists(&code).await? {
                return Ok(code);
            }
            tracing::warn!(attempt, "Tracking code collision, retrying");
        }

        Err(AppError::Internal(
            "Could not allocate a unique tracking code".to_string(),
        ))
    }

    async fn remove_stored(&self, stored: &[StoredFile]) {
        for file in stored {
            if let Err(e) = self.storage.delete(&file.key).await {
                tracing::warn!(key = %file.key, error = %e, "Failed to remove orphaned attachment");
            }
        }
    }

    /// Resolve a tracking code to its public view.
    pub async fn track(&self, tracking_code: &str) -> AppResult<TrackedReport> {
        let report = self
            .report_repo
            .find_by_tracking_code(tracking_code.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("No report matches this tracking code".to_string()))?;

        let assigned_organization = match report.assigned_provider_id {
            Some(id) => self.org_repo.find_by_id(id).await?.map(|o| o.name),
            None => None,
        };

        let updates = self
            .update_repo
            .list_for_report(report.id)
            .await?
            .into_iter()
            .map(|u| PublicUpdate {
                status: u.status,
                message: u.message,
                created_at: u.created_at.with_timezone(&Utc),
            })
            .collect();

        Ok(TrackedReport {
            tracking_code: report.tracking_code,
            category: report.category,
            location: report.location,
            status: report.status,
            priority: report.priority,
            submitted_at: report.submitted_at.with_timezone(&Utc),
            updated_at: report.updated_at.with_timezone(&Utc),
            resolved_at: report.resolved_at.map(|d| d.with_timezone(&Utc)),
            assigned_organization,
            updates,
        })
    }

    /// Assign a report to a verified organization.
    pub async fn assign(
        &self,
        actor: &Actor,
        report_id: i32,
        organization_id: i32,
        client_ip: Option<&str>,
    ) -> AppResult<report::Model> {
        authorize(actor, Action::AssignReport)?;

        let report = self.report_repo.get_by_id(report_id).await?;
        let org = self.org_repo.get_by_id(organization_id).await?;

        if !org.is_verified {
            return Err(AppError::Validation(format!(
                "Organization {} is not verified",
                org.name
            )));
        }
        self.policy.check_assignment(report.status)?;

        let now = Utc::now();
        let mut active: report::ActiveModel = report.into();
        active.status = Set(ReportStatus::Assigned);
        active.assigned_provider_id = Set(Some(org.id));
        active.assigned_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());

        let txn = self.begin().await?;
        let report = self.report_repo.update_in(&txn, active).await?;
        self.append_update(
            &txn,
            report.id,
            ReportStatus::Assigned,
            format!("Report assigned to {}", org.name),
            actor.user_id,
        )
        .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(report_id, organization_id, admin_id = actor.user_id, "Report assigned");
        self.audit
            .record(
                AuditEvent::ReportAssigned,
                Some(actor.user_id),
                client_ip,
                format!("Report {report_id} assigned to organization {organization_id}"),
            )
            .await;

        Ok(report)
    }

    /// Change a report's status on behalf of its assigned provider.
    ///
    /// Shared by the form and JSON endpoints.
    pub async fn update_status(
        &self,
        actor: &Actor,
        report_id: i32,
        input: StatusUpdateInput,
        client_ip: Option<&str>,
    ) -> AppResult<report::Model> {
        let report = self.report_repo.find_by_id(report_id).await?;
        authorize(
            actor,
            Action::UpdateReport {
                assigned_org: report.as_ref().and_then(|r| r.assigned_provider_id),
            },
        )?;
        let report =
            report.ok_or_else(|| AppError::NotFound(format!("Report {report_id} not found")))?;

        input.validate()?;
        let target = ReportStatus::parse(&input.status)
            .ok_or_else(|| AppError::Validation(format!("Invalid status: {}", input.status)))?;
        let previous = report.status;
        self.policy.check_provider_transition(previous, target)?;

        let message = input
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Status updated to {target}"));

        let now = Utc::now();
        let mut active: report::ActiveModel = report.into();
        active.status = Set(target);
        active.updated_at = Set(now.into());
        if target == ReportStatus::Resolved {
            active.resolved_at = Set(Some(now.into()));
        } else if previous == ReportStatus::Resolved {
            active.resolved_at = Set(None);
        }

        let txn = self.begin().await?;
        let report = self.report_repo.update_in(&txn, active).await?;
        self.append_update(&txn, report.id, target, message, actor.user_id)
            .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            report_id,
            user_id = actor.user_id,
            from = %previous,
            to = %target,
            "Report status updated"
        );
        self.audit
            .record(
                AuditEvent::ReportStatusUpdated,
                Some(actor.user_id),
                client_ip,
                format!("Report {report_id} moved from {previous} to {target}"),
            )
            .await;

        Ok(report)
    }

    /// Change the triage priority of an open report.
    pub async fn set_priority(
        &self,
        actor: &Actor,
        report_id: i32,
        priority: &str,
        client_ip: Option<&str>,
    ) -> AppResult<report::Model> {
        authorize(actor, Action::SetPriority)?;

        let report = self.report_repo.get_by_id(report_id).await?;
        let priority = Priority::parse(priority)
            .ok_or_else(|| AppError::Validation(format!("Invalid priority: {priority}")))?;

        if self.policy.is_terminal(report.status) {
            return Err(AppError::Validation(format!(
                "Priority of a {} report cannot change",
                report.status
            )));
        }

        let previous = report.priority;
        let mut active: report::ActiveModel = report.into();
        active.priority = Set(priority);
        active.updated_at = Set(Utc::now().into());
        let report = self.report_repo.update(active).await?;

        self.audit
            .record(
                AuditEvent::ReportPriorityChanged,
                Some(actor.user_id),
                client_ip,
                format!(
                    "Report {report_id} priority {} -> {}",
                    previous.as_str(),
                    priority.as_str()
                ),
            )
            .await;

        Ok(report)
    }

    /// Full view of one report.
    ///
    /// Administrators get `NotFound` for unknown ids; providers get the same
    /// denial for unknown reports as for reports of other organizations.
    pub async fn detail(&self, actor: &Actor, report_id: i32) -> AppResult<ReportDetail> {
        let report = self.report_repo.find_by_id(report_id).await?;
        authorize(
            actor,
            Action::ViewReport {
                assigned_org: report.as_ref().and_then(|r| r.assigned_provider_id),
            },
        )?;
        let report =
            report.ok_or_else(|| AppError::NotFound(format!("Report {report_id} not found")))?;

        let assigned_organization = match report.assigned_provider_id {
            Some(id) => self.org_repo.find_by_id(id).await?,
            None => None,
        };
        let updates = self.update_repo.list_for_report(report.id).await?;
        let attachments = self.attachment_repo.list_for_report(report.id).await?;
        let aid_requests = self.aid_repo.list_for_report(report.id).await?;

        Ok(ReportDetail {
            report,
            assigned_organization,
            updates,
            attachments,
            aid_requests,
        })
    }

    /// List reports for administrators.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &ReportFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<report::Model>, u64)> {
        authorize(actor, Action::ViewAllReports)?;
        let reports = self.report_repo.list(filter, limit, offset).await?;
        let total = self.report_repo.count(filter).await?;
        Ok((reports, total))
    }

    /// Reports assigned to the calling provider's organization.
    pub async fn list_for_provider(&self, actor: &Actor) -> AppResult<Vec<report::Model>> {
        let organization_id = actor.provider_organization()?;
        self.report_repo.list_for_provider(organization_id).await
    }

    async fn append_update(
        &self,
        txn: &DatabaseTransaction,
        report_id: i32,
        status: ReportStatus,
        message: String,
        user_id: i32,
    ) -> AppResult<report_update::Model> {
        self.update_repo
            .create_in(
                txn,
                report_update::ActiveModel {
                    report_id: Set(report_id),
                    status: Set(status),
                    message: Set(message),
                    created_by_user_id: Set(Some(user_id)),
                    created_at: Set(Utc::now().into()),
                    ..Default::default()
                },
            )
            .await
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn validate_submission(
    input: SubmitReportInput,
    now: DateTime<Utc>,
) -> AppResult<ValidatedSubmission> {
    input.validate()?;

    let category = required("category", &input.category)?;
    let description = required("description", &input.description)?;
    let location = required("location", &input.location)?;

    let incident_date = parse_incident_date(&input.incident_date)?;
    if incident_date > now {
        return Err(AppError::Validation(
            "Incident date cannot be in the future".to_string(),
        ));
    }

    let (latitude, longitude) = validate_coordinates(input.latitude, input.longitude)?;

    let priority = match input.priority.as_deref().map(str::trim) {
        None | Some("") => Priority::default(),
        Some(raw) => Priority::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Invalid priority: {raw}")))?,
    };

    let mut aid_requests = Vec::with_capacity(input.aid_requests.len());
    for aid in input.aid_requests {
        let aid_type = required("aid_type", &aid.aid_type)?;
        let urgency = match aid.urgency.as_deref().map(str::trim) {
            None | Some("") => Urgency::default(),
            Some(raw) => Urgency::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid urgency: {raw}")))?,
        };
        let description = aid
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        aid_requests.push((aid_type, description, urgency));
    }

    Ok(ValidatedSubmission {
        category,
        description,
        location,
        incident_date,
        latitude,
        longitude,
        priority,
        aid_requests,
    })
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse an incident date in one of the accepted formats.
pub fn parse_incident_date(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(dt.and_utc());
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt.and_utc());
    }

    Err(AppError::Validation(format!(
        "Invalid incident date: {raw}"
    )))
}

fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> AppResult<(Option<f64>, Option<f64>)> {
    match (latitude, longitude) {
        (None, None) => Ok((None, None)),
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::Validation(format!("Latitude out of range: {lat}")));
            }
            if !(-180.0..=180.0).contains(&lng) {
                return Err(AppError::Validation(format!("Longitude out of range: {lng}")));
            }
            Ok((Some(lat), Some(lng)))
        }
        _ => Err(AppError::Validation(
            "Latitude and longitude must be given together".to_string(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::{collections::HashMap, sync::Mutex};

    use chrono::Duration;
    use safenet_db::entities::user::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::services::audit::testing::{recorded_events, recording_logger};

    const ADMIN: Actor = Actor {
        user_id: 1,
        role: Role::Admin,
        organization_id: None,
    };

    const PROVIDER_TWO: Actor = Actor {
        user_id: 5,
        role: Role::Provider,
        organization_id: Some(2),
    };

    #[derive(Default)]
    struct MemoryStorage {
        files: Mutex<HashMap<String, usize>>,
    }

    impl MemoryStorage {
        fn len(&self) -> usize {
            self.files.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn store(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
            self.files.lock().unwrap().insert(key.to_string(), data.len());
            Ok(StoredFile {
                key: key.to_string(),
                path: format!("/uploads/{key}"),
                size: data.len() as u64,
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.files.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct Mocks {
        txn: MockDatabase,
        reports: MockDatabase,
        updates: MockDatabase,
        orgs: MockDatabase,
        storage: Arc<MemoryStorage>,
        allow_reopen: bool,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                txn: MockDatabase::new(DatabaseBackend::Postgres),
                reports: MockDatabase::new(DatabaseBackend::Postgres),
                updates: MockDatabase::new(DatabaseBackend::Postgres),
                orgs: MockDatabase::new(DatabaseBackend::Postgres),
                storage: Arc::new(MemoryStorage::default()),
                allow_reopen: false,
            }
        }

        /// Returns the service with its transaction and audit connections.
        fn into_service(self) -> (ReportService, Arc<DatabaseConnection>, Arc<DatabaseConnection>) {
            let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
            let txn = Arc::new(self.txn.into_connection());
            let reports = Arc::new(self.reports.into_connection());
            let (audit, audit_conn) = recording_logger();
            let uploads = UploadConfig {
                max_file_bytes: 1024,
                max_files: 2,
                ..UploadConfig::default()
            };
            let service = ReportService::new(
                txn.clone(),
                ReportRepository::new(reports),
                ReportUpdateRepository::new(Arc::new(self.updates.into_connection())),
                ReportAttachmentRepository::new(empty()),
                AidRequestRepository::new(empty()),
                OrganizationRepository::new(Arc::new(self.orgs.into_connection())),
                self.storage,
                audit,
                IpHasher::new("test"),
                LifecyclePolicy::new(self.allow_reopen),
                &uploads,
            );
            (service, txn, audit_conn)
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    fn test_report(id: i32, status: ReportStatus, provider: Option<i32>) -> report::Model {
        let now = Utc::now();
        report::Model {
            id,
            tracking_code: "Xk3vQ9bM2pLr7TnY5wZc8HdJ4fGs6AeU".to_string(),
            category: "Medical Emergency".to_string(),
            description: "Assault near the market".to_string(),
            location: "Lagos".to_string(),
            latitude: None,
            longitude: None,
            incident_date: (now - Duration::days(2)).into(),
            status,
            priority: Priority::Medium,
            assigned_provider_id: provider,
            submitted_at: now.into(),
            assigned_at: provider.map(|_| now.into()),
            resolved_at: None,
            updated_at: now.into(),
            ip_hash: None,
        }
    }

    fn test_org(id: i32, verified: bool) -> organization::Model {
        organization::Model {
            id,
            name: "City Clinic".to_string(),
            category: "Hospital".to_string(),
            address: "9 Main Street".to_string(),
            contact_phone: "+2348000000".to_string(),
            contact_email: "desk@clinic.example".to_string(),
            description: None,
            is_verified: verified,
            verification_date: None,
            created_at: Utc::now().into(),
            rating: 0.0,
            response_time_hours: 24,
            logo_url: None,
        }
    }

    fn test_update(report_id: i32, status: ReportStatus) -> report_update::Model {
        report_update::Model {
            id: 1,
            report_id,
            status,
            message: format!("Status updated to {status}"),
            created_by_user_id: Some(1),
            created_at: Utc::now().into(),
        }
    }

    fn submission(incident_date: &str) -> SubmitReportInput {
        SubmitReportInput {
            category: "Medical Emergency".to_string(),
            description: "Assault near the market".to_string(),
            location: "Lagos".to_string(),
            incident_date: incident_date.to_string(),
            latitude: None,
            longitude: None,
            priority: None,
            aid_requests: Vec::new(),
        }
    }

    fn status_input(status: &str) -> StatusUpdateInput {
        StatusUpdateInput {
            status: status.to_string(),
            message: None,
        }
    }

    #[tokio::test]
    async fn test_submit_creates_pending_report() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks.reports.append_query_results([count_row(0)]);
        mocks.txn = mocks
            .txn
            .append_query_results([[test_report(1, ReportStatus::Pending, None)]]);
        let (service, _, audit) = mocks.into_service();

        let report = service
            .submit(submission("2024-03-01"), Vec::new(), Some("203.0.113.7"))
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.assigned_provider_id.is_none());
        assert!(report.tracking_code.len() >= 24);

        drop(service);
        assert_eq!(recorded_events(audit), vec!["report_submitted".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_retries_colliding_tracking_code() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([count_row(1)])
            .append_query_results([count_row(0)]);
        mocks.txn = mocks
            .txn
            .append_query_results([[test_report(1, ReportStatus::Pending, None)]]);
        let (service, txn, _) = mocks.into_service();

        let report = service
            .submit(submission("2024-03-01"), Vec::new(), None)
            .await
            .unwrap();
        assert_eq!(report.status, ReportStatus::Pending);

        drop(service);
        let log = format!("{:?}", Arc::try_unwrap(txn).unwrap().into_transaction_log());
        assert_eq!(log.matches("INSERT INTO").count(), 1);
    }

    #[tokio::test]
    async fn test_submit_gives_up_after_repeated_collisions() {
        let mut mocks = Mocks::new();
        for _ in 0..TRACKING_CODE_ATTEMPTS {
            mocks.reports = mocks.reports.append_query_results([count_row(1)]);
        }
        let (service, txn, audit) = mocks.into_service();

        let result = service
            .submit(submission("2024-03-01"), Vec::new(), None)
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        drop(service);
        assert!(Arc::try_unwrap(txn).unwrap().into_transaction_log().is_empty());
        assert!(recorded_events(audit).is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_future_incident_date() {
        let (service, _, _) = Mocks::new().into_service();
        let tomorrow = (Utc::now() + Duration::days(1)).format("%Y-%m-%d").to_string();

        let result = service.submit(submission(&tomorrow), Vec::new(), None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_fields() {
        let (service, _, _) = Mocks::new().into_service();
        let mut input = submission("2024-03-01");
        input.location = "   ".to_string();

        let result = service.submit(input, Vec::new(), None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_rejects_disallowed_attachment() {
        let mocks = Mocks::new();
        let storage = mocks.storage.clone();
        let (service, _, _) = mocks.into_service();
        let upload = AttachmentUpload {
            original_filename: "payload.exe".to_string(),
            data: vec![1, 2, 3],
        };

        let result = service
            .submit(submission("2024-03-01"), vec![upload], None)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(storage.len(), 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_oversized_attachment() {
        let (service, _, _) = Mocks::new().into_service();
        let upload = AttachmentUpload {
            original_filename: "photo.png".to_string(),
            data: vec![0; 2048],
        };

        let result = service
            .submit(submission("2024-03-01"), vec![upload], None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_removes_files_when_transaction_fails() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks.reports.append_query_results([count_row(0)]);
        let storage = mocks.storage.clone();
        let (service, _, _) = mocks.into_service();
        let upload = AttachmentUpload {
            original_filename: "evidence.png".to_string(),
            data: vec![1, 2, 3],
        };

        let result = service
            .submit(submission("2024-03-01"), vec![upload], None)
            .await;

        assert!(result.is_err());
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn test_parse_incident_date_formats() {
        assert!(parse_incident_date("2024-03-01").is_ok());
        assert!(parse_incident_date("2024-03-01T14:30").is_ok());
        assert!(parse_incident_date("2024-03-01T14:30:00+01:00").is_ok());
        assert!(parse_incident_date("01/03/2024").is_err());
        assert!(parse_incident_date("").is_err());
    }

    #[test]
    fn test_coordinates_must_come_in_pairs() {
        assert!(validate_coordinates(None, None).is_ok());
        assert!(validate_coordinates(Some(6.5), Some(3.4)).is_ok());
        assert!(validate_coordinates(Some(6.5), None).is_err());
        assert!(validate_coordinates(Some(91.0), Some(3.4)).is_err());
        assert!(validate_coordinates(Some(6.5), Some(-181.0)).is_err());
    }

    #[tokio::test]
    async fn test_track_unknown_code() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([Vec::<report::Model>::new()]);
        let (service, _, _) = mocks.into_service();

        let result = service.track("does-not-exist").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_track_shows_organization_name_and_history() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::Assigned, Some(2))]]);
        mocks.orgs = mocks.orgs.append_query_results([[test_org(2, true)]]);
        mocks.updates = mocks
            .updates
            .append_query_results([[test_update(1, ReportStatus::Assigned)]]);
        let (service, _, _) = mocks.into_service();

        let tracked = service
            .track("Xk3vQ9bM2pLr7TnY5wZc8HdJ4fGs6AeU")
            .await
            .unwrap();

        assert_eq!(tracked.status, ReportStatus::Assigned);
        assert_eq!(tracked.assigned_organization.as_deref(), Some("City Clinic"));
        assert_eq!(tracked.updates.len(), 1);
    }

    #[tokio::test]
    async fn test_assign_to_unverified_organization_fails() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::Pending, None)]]);
        mocks.orgs = mocks.orgs.append_query_results([[test_org(3, false)]]);
        let (service, _, _) = mocks.into_service();

        let result = service.assign(&ADMIN, 1, 3, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assign_to_verified_organization() {
        let mut assigned = test_report(1, ReportStatus::Assigned, Some(2));
        assigned.assigned_at = Some(Utc::now().into());

        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::Pending, None)]]);
        mocks.orgs = mocks.orgs.append_query_results([[test_org(2, true)]]);
        mocks.txn = mocks
            .txn
            .append_query_results([[assigned]])
            .append_query_results([[test_update(1, ReportStatus::Assigned)]]);
        let (service, txn, audit) = mocks.into_service();

        let report = service.assign(&ADMIN, 1, 2, None).await.unwrap();
        assert_eq!(report.status, ReportStatus::Assigned);
        assert_eq!(report.assigned_provider_id, Some(2));

        drop(service);
        let log = format!("{:?}", Arc::try_unwrap(txn).unwrap().into_transaction_log());
        assert_eq!(log.matches("report_update").count(), 1);
        assert_eq!(recorded_events(audit), vec!["report_assigned".to_string()]);
    }

    #[tokio::test]
    async fn test_assign_requires_admin() {
        let (service, _, _) = Mocks::new().into_service();
        let result = service.assign(&PROVIDER_TWO, 1, 2, None).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_provider_cannot_update_foreign_report() {
        let other_provider = Actor {
            user_id: 6,
            role: Role::Provider,
            organization_id: Some(3),
        };
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::Assigned, Some(2))]]);
        let (service, _, _) = mocks.into_service();

        let result = service
            .update_status(&other_provider, 1, status_input("Resolved"), None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_provider_unknown_report_is_forbidden() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([Vec::<report::Model>::new()]);
        let (service, _, _) = mocks.into_service();

        let result = service
            .update_status(&PROVIDER_TWO, 42, status_input("Resolved"), None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_unknown_report_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([Vec::<report::Model>::new()]);
        let (service, _, _) = mocks.into_service();

        let result = service.detail(&ADMIN, 42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_provider_resolves_assigned_report() {
        let mut resolved = test_report(1, ReportStatus::Resolved, Some(2));
        resolved.resolved_at = Some(Utc::now().into());

        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::Assigned, Some(2))]]);
        mocks.txn = mocks
            .txn
            .append_query_results([[resolved]])
            .append_query_results([[test_update(1, ReportStatus::Resolved)]]);
        let (service, txn, audit) = mocks.into_service();

        let report = service
            .update_status(&PROVIDER_TWO, 1, status_input("Resolved"), None)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Resolved);
        assert!(report.resolved_at.is_some());

        drop(service);
        let log = format!("{:?}", Arc::try_unwrap(txn).unwrap().into_transaction_log());
        assert_eq!(log.matches("report_update").count(), 1);
        assert_eq!(recorded_events(audit), vec!["report_status_updated".to_string()]);
    }

    #[tokio::test]
    async fn test_provider_cannot_reset_to_pending() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::InProgress, Some(2))]]);
        let (service, _, _) = mocks.into_service();

        let result = service
            .update_status(&PROVIDER_TWO, 1, status_input("Pending"), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reopen_rejected_by_default() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::Resolved, Some(2))]]);
        let (service, _, _) = mocks.into_service();

        let result = service
            .update_status(&PROVIDER_TWO, 1, status_input("In Progress"), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reopen_allowed_by_policy() {
        let mut current = test_report(1, ReportStatus::Resolved, Some(2));
        current.resolved_at = Some(Utc::now().into());

        let mut mocks = Mocks::new();
        mocks.allow_reopen = true;
        mocks.reports = mocks.reports.append_query_results([[current]]);
        mocks.txn = mocks
            .txn
            .append_query_results([[test_report(1, ReportStatus::InProgress, Some(2))]])
            .append_query_results([[test_update(1, ReportStatus::InProgress)]]);
        let (service, _, _) = mocks.into_service();

        let report = service
            .update_status(&PROVIDER_TWO, 1, status_input("in_progress"), None)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::InProgress);
        assert!(report.resolved_at.is_none());
    }

    #[tokio::test]
    async fn test_set_priority_on_closed_report_fails() {
        let mut mocks = Mocks::new();
        mocks.reports = mocks
            .reports
            .append_query_results([[test_report(1, ReportStatus::Closed, Some(2))]]);
        let (service, _, _) = mocks.into_service();

        let result = service.set_priority(&ADMIN, 1, "High", None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

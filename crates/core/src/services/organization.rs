//! Organization registry service.

use std::sync::Arc;

use chrono::Utc;
use safenet_common::{AppError, AppResult};
use safenet_db::{
    entities::{
        organization,
        verification_record::{self, VerificationDecision},
    },
    repositories::{OrganizationRepository, VerificationRecordRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    access::{Action, Actor, authorize},
    audit::{AuditEvent, AuditLogger},
};

/// Verification decision requested by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationAction {
    Approve,
    Reject,
}

/// Input for verifying an organization.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyOrganizationInput {
    pub action: VerificationAction,

    #[validate(length(max = 5000))]
    pub notes: Option<String>,

    #[validate(length(max = 5000))]
    pub documents_checked: Option<String>,
}

/// Profile fields a provider may change on its own organization.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrganizationInput {
    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub contact_phone: Option<String>,

    #[validate(email, length(max = 120))]
    pub contact_email: Option<String>,

    #[validate(length(min = 1, max = 2000))]
    pub address: Option<String>,

    #[validate(url, length(max = 200))]
    pub logo_url: Option<String>,
}

/// An organization with its verification history, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationDetail {
    pub organization: organization::Model,
    pub verification_history: Vec<verification_record::Model>,
}

/// Organization service for business logic.
#[derive(Clone)]
pub struct OrganizationService {
    db: Arc<DatabaseConnection>,
    org_repo: OrganizationRepository,
    verification_repo: VerificationRecordRepository,
    audit: AuditLogger,
}

impl OrganizationService {
    /// Create a new organization service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        org_repo: OrganizationRepository,
        verification_repo: VerificationRecordRepository,
        audit: AuditLogger,
    ) -> Self {
        Self {
            db,
            org_repo,
            verification_repo,
            audit,
        }
    }

    /// Approve or reject an organization.
    ///
    /// Approving an already verified organization keeps its original
    /// verification date. Every call appends one verification record.
    pub async fn verify(
        &self,
        actor: &Actor,
        organization_id: i32,
        input: VerifyOrganizationInput,
        client_ip: Option<&str>,
    ) -> AppResult<organization::Model> {
        authorize(actor, Action::VerifyOrganization)?;
        input.validate()?;

        let org = self.org_repo.get_by_id(organization_id).await?;
        let now = Utc::now();

        let (decision, event) = match input.action {
            VerificationAction::Approve => {
                (VerificationDecision::Approved, AuditEvent::ProviderVerified)
            }
            VerificationAction::Reject => {
                (VerificationDecision::Rejected, AuditEvent::ProviderRejected)
            }
        };

        let verification_date = match decision {
            VerificationDecision::Approved => org.verification_date.or_else(|| Some(now.into())),
            VerificationDecision::Rejected => None,
        };

        let mut active: organization::ActiveModel = org.into();
        active.is_verified = Set(decision == VerificationDecision::Approved);
        active.verification_date = Set(verification_date);

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let org = self.org_repo.update_in(&txn, active).await?;

        self.verification_repo
            .create_in(
                &txn,
                verification_record::ActiveModel {
                    organization_id: Set(org.id),
                    verified_by_user_id: Set(actor.user_id),
                    decision: Set(decision),
                    notes: Set(input.notes.clone()),
                    documents_checked: Set(input.documents_checked),
                    created_at: Set(now.into()),
                    ..Default::default()
                },
            )
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = org.id,
            admin_id = actor.user_id,
            decision = ?decision,
            "Organization verification recorded"
        );
        self.audit
            .record(
                event,
                Some(actor.user_id),
                client_ip,
                format!(
                    "Organization {} ({}) {}: {}",
                    org.id,
                    org.name,
                    if org.is_verified { "approved" } else { "rejected" },
                    input.notes.as_deref().unwrap_or("no notes")
                ),
            )
            .await;

        Ok(org)
    }

    /// Verified organizations for the public directory.
    pub async fn directory(&self, category: Option<&str>) -> AppResult<Vec<organization::Model>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        self.org_repo.list_verified(category).await
    }

    /// All organizations, optionally filtered by verification state.
    pub async fn list(
        &self,
        actor: &Actor,
        verified: Option<bool>,
    ) -> AppResult<Vec<organization::Model>> {
        authorize(actor, Action::ListOrganizations)?;
        self.org_repo.list(verified).await
    }

    /// An organization with its verification history.
    pub async fn get_detail(
        &self,
        actor: &Actor,
        organization_id: i32,
    ) -> AppResult<OrganizationDetail> {
        authorize(actor, Action::ListOrganizations)?;

        let organization = self.org_repo.get_by_id(organization_id).await?;
        let verification_history = self
            .verification_repo
            .list_for_organization(organization_id)
            .await?;

        Ok(OrganizationDetail {
            organization,
            verification_history,
        })
    }

    /// The calling provider's own organization.
    pub async fn own(&self, actor: &Actor) -> AppResult<organization::Model> {
        let organization_id = actor.provider_organization()?;
        self.org_repo.get_by_id(organization_id).await
    }

    /// Update the calling provider's organization profile.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        input: UpdateOrganizationInput,
    ) -> AppResult<organization::Model> {
        let organization_id = actor.provider_organization()?;
        authorize(actor, Action::ManageOwnOrganization { organization_id })?;
        input.validate()?;

        let org = self.org_repo.get_by_id(organization_id).await?;
        let mut active: organization::ActiveModel = org.into();

        if let Some(description) = input.description {
            let description = description.trim().to_string();
            active.description = Set((!description.is_empty()).then_some(description));
        }
        if let Some(phone) = input.contact_phone {
            active.contact_phone = Set(phone.trim().to_string());
        }
        if let Some(email) = input.contact_email {
            active.contact_email = Set(email.trim().to_string());
        }
        if let Some(address) = input.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(logo_url) = input.logo_url {
            active.logo_url = Set(Some(logo_url));
        }

        let org = self.org_repo.update(active).await?;
        tracing::info!(organization_id = org.id, "Organization profile updated");
        Ok(org)
    }
}

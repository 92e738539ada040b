//! Verification record repository.

use std::sync::Arc;

use crate::entities::{VerificationRecord, verification_record};
use safenet_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Verification record repository for database operations.
#[derive(Clone)]
pub struct VerificationRecordRepository {
    db: Arc<DatabaseConnection>,
}

impl VerificationRecordRepository {
    /// Create a new verification record repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a record on the given connection or transaction.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: verification_record::ActiveModel,
    ) -> AppResult<verification_record::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Verification history of an organization, newest first.
    pub async fn list_for_organization(
        &self,
        organization_id: i32,
    ) -> AppResult<Vec<verification_record::Model>> {
        VerificationRecord::find()
            .filter(verification_record::Column::OrganizationId.eq(organization_id))
            .order_by_desc(verification_record::Column::CreatedAt)
            .order_by_desc(verification_record::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

//! Organization repository.

use std::sync::Arc;

use crate::entities::{Organization, organization};
use safenet_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

/// Organization repository for database operations.
#[derive(Clone)]
pub struct OrganizationRepository {
    db: Arc<DatabaseConnection>,
}

impl OrganizationRepository {
    /// Create a new organization repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an organization by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<organization::Model>> {
        Organization::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an organization by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<organization::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization {id} not found")))
    }

    /// List organizations, optionally filtered by verification state.
    pub async fn list(&self, verified: Option<bool>) -> AppResult<Vec<organization::Model>> {
        let mut query = Organization::find().order_by_asc(organization::Column::Name);

        if let Some(v) = verified {
            query = query.filter(organization::Column::IsVerified.eq(v));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List verified organizations for the public directory.
    pub async fn list_verified(
        &self,
        category: Option<&str>,
    ) -> AppResult<Vec<organization::Model>> {
        let mut query = Organization::find()
            .filter(organization::Column::IsVerified.eq(true))
            .order_by_asc(organization::Column::Name);

        if let Some(c) = category {
            query = query.filter(organization::Column::Category.eq(c));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an organization on the given connection or transaction.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: organization::ActiveModel,
    ) -> AppResult<organization::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an organization.
    pub async fn update(&self, model: organization::ActiveModel) -> AppResult<organization::Model> {
        self.update_in(self.db.as_ref(), model).await
    }

    /// Update an organization on the given connection or transaction.
    pub async fn update_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: organization::ActiveModel,
    ) -> AppResult<organization::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all organizations.
    pub async fn count(&self) -> AppResult<u64> {
        Organization::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count verified organizations.
    pub async fn count_verified(&self) -> AppResult<u64> {
        Organization::find()
            .filter(organization::Column::IsVerified.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

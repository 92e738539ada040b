//! Audit log repository.

use std::sync::Arc;

use crate::entities::{SystemLog, system_log};
use safenet_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Audit log repository. Entries are only ever inserted.
#[derive(Clone)]
pub struct SystemLogRepository {
    db: Arc<DatabaseConnection>,
}

impl SystemLogRepository {
    /// Create a new audit log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an entry.
    pub async fn create(&self, model: system_log::ActiveModel) -> AppResult<system_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Entries newest first, optionally restricted to one event type.
    pub async fn list(
        &self,
        event_type: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<system_log::Model>> {
        let mut query = SystemLog::find()
            .order_by_desc(system_log::Column::CreatedAt)
            .order_by_desc(system_log::Column::Id);

        if let Some(t) = event_type {
            query = query.filter(system_log::Column::EventType.eq(t));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count entries, optionally restricted to one event type.
    pub async fn count(&self, event_type: Option<&str>) -> AppResult<u64> {
        let mut query = SystemLog::find();

        if let Some(t) = event_type {
            query = query.filter(system_log::Column::EventType.eq(t));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

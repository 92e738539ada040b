//! Report repository.

use std::sync::Arc;

use crate::entities::{
    Report,
    report::{self, ReportStatus},
};
use safenet_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::Expr,
};
use serde::Serialize;

/// Filters for listing reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub category: Option<String>,
    pub provider_id: Option<i32>,
}

impl ReportFilter {
    fn apply(&self, mut query: Select<Report>) -> Select<Report> {
        if let Some(status) = self.status {
            query = query.filter(report::Column::Status.eq(status));
        }
        if let Some(category) = &self.category {
            query = query.filter(report::Column::Category.eq(category.as_str()));
        }
        if let Some(provider_id) = self.provider_id {
            query = query.filter(report::Column::AssignedProviderId.eq(provider_id));
        }
        query
    }
}

/// Number of reports in one category.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))
    }

    /// Find a report by its tracking code.
    pub async fn find_by_tracking_code(&self, code: &str) -> AppResult<Option<report::Model>> {
        Report::find()
            .filter(report::Column::TrackingCode.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a tracking code is already in use.
    pub async fn tracking_code_exists(&self, code: &str) -> AppResult<bool> {
        let count = Report::find()
            .filter(report::Column::TrackingCode.eq(code))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// List reports matching a filter, newest first.
    pub async fn list(
        &self,
        filter: &ReportFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<report::Model>> {
        filter
            .apply(Report::find())
            .order_by_desc(report::Column::SubmittedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports matching a filter.
    pub async fn count(&self, filter: &ReportFilter) -> AppResult<u64> {
        filter
            .apply(Report::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recently submitted reports.
    pub async fn list_recent(&self, limit: u64) -> AppResult<Vec<report::Model>> {
        self.list(&ReportFilter::default(), limit, 0).await
    }

    /// All reports assigned to an organization, most recently updated first.
    pub async fn list_for_provider(&self, organization_id: i32) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::AssignedProviderId.eq(organization_id))
            .order_by_desc(report::Column::UpdatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Report counts grouped by category.
    pub async fn count_by_category(&self) -> AppResult<Vec<CategoryCount>> {
        Report::find()
            .select_only()
            .column(report::Column::Category)
            .column_as(Expr::col(report::Column::Id).count(), "count")
            .group_by(report::Column::Category)
            .order_by_asc(report::Column::Category)
            .into_model::<CategoryCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a report on the given connection or transaction.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report::ActiveModel,
    ) -> AppResult<report::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a report.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        self.update_in(self.db.as_ref(), model).await
    }

    /// Update a report on the given connection or transaction.
    pub async fn update_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report::ActiveModel,
    ) -> AppResult<report::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

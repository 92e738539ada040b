//! Incident report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReportStatus {
    #[sea_orm(string_value = "Pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "Assigned")]
    Assigned,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
    #[sea_orm(string_value = "Closed")]
    Closed,
}

impl ReportStatus {
    /// Display name, also the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    /// Parse a status name as submitted by clients.
    ///
    /// Accepts the display names plus `in_progress` / `InProgress` spellings.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Pending" | "pending" => Some(Self::Pending),
            "Assigned" | "assigned" => Some(Self::Assigned),
            "In Progress" | "InProgress" | "in_progress" | "in progress" => Some(Self::InProgress),
            "Resolved" | "resolved" => Some(Self::Resolved),
            "Closed" | "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Priority {
    #[sea_orm(string_value = "Low")]
    Low,
    #[sea_orm(string_value = "Medium")]
    #[default]
    Medium,
    #[sea_orm(string_value = "High")]
    High,
    #[sea_orm(string_value = "Critical")]
    Critical,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Incident report model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unguessable public handle given to the reporter.
    #[sea_orm(unique)]
    pub tracking_code: String,

    pub category: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub location: String,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    pub incident_date: DateTimeWithTimeZone,

    pub status: ReportStatus,

    pub priority: Priority,

    #[sea_orm(nullable)]
    pub assigned_provider_id: Option<i32>,

    pub submitted_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub assigned_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeWithTimeZone>,

    pub updated_at: DateTimeWithTimeZone,

    /// Keyed hash of the submitter's address, never the raw address.
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub ip_hash: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::AssignedProviderId",
        to = "super::organization::Column::Id"
    )]
    AssignedProvider,

    #[sea_orm(has_many = "super::report_update::Entity")]
    Updates,

    #[sea_orm(has_many = "super::report_attachment::Entity")]
    Attachments,

    #[sea_orm(has_many = "super::aid_request::Entity")]
    AidRequests,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedProvider.def()
    }
}

impl Related<super::report_update::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Updates.def()
    }
}

impl Related<super::report_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::aid_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AidRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

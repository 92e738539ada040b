//! Aid request entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Aid request status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AidStatus {
    #[sea_orm(string_value = "Pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "Assigned")]
    Assigned,
    #[sea_orm(string_value = "Fulfilled")]
    Fulfilled,
    #[sea_orm(string_value = "Declined")]
    Declined,
}

impl AidStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "assigned" => Some(Self::Assigned),
            "fulfilled" => Some(Self::Fulfilled),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::Fulfilled => "Fulfilled",
            Self::Declined => "Declined",
        }
    }
}

/// How urgently the aid is needed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Urgency {
    #[sea_orm(string_value = "Normal")]
    #[default]
    Normal,
    #[sea_orm(string_value = "Urgent")]
    Urgent,
    #[sea_orm(string_value = "Critical")]
    Critical,
}

impl Urgency {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "urgent" => Some(Self::Urgent),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "aid_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub report_id: i32,

    /// Medical, Legal, Shelter, Counseling, ...
    pub aid_type: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub status: AidStatus,

    pub urgency: Urgency,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub fulfilled_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::ReportId",
        to = "super::report::Column::Id",
        on_delete = "Cascade"
    )]
    Report,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

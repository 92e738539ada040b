//! Report status history entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::report::ReportStatus;

/// One entry in a report's history. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_update")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub report_id: i32,

    /// Status the report moved to.
    pub status: ReportStatus,

    /// Message shown to the reporter on the tracking page.
    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// NULL for system-generated entries.
    #[sea_orm(nullable)]
    pub created_by_user_id: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
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

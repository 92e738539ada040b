//! Service provider organization entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organization")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// NGO, Hospital, Legal Aid, Police, ...
    pub category: String,

    #[sea_orm(column_type = "Text")]
    pub address: String,

    pub contact_phone: String,

    pub contact_email: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Only verified organizations receive assignments or appear in the directory.
    #[sea_orm(default_value = false)]
    pub is_verified: bool,

    #[sea_orm(nullable)]
    pub verification_date: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub rating: f64,

    /// Average response time
    pub response_time_hours: i32,

    #[sea_orm(nullable)]
    pub logo_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Users,

    #[sea_orm(has_many = "super::report::Entity")]
    AssignedReports,

    #[sea_orm(has_many = "super::verification_record::Entity")]
    VerificationRecords,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedReports.def()
    }
}

impl Related<super::verification_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VerificationRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

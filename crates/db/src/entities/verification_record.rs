//! Organization verification history entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of a verification review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum VerificationDecision {
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "verification_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub organization_id: i32,

    pub verified_by_user_id: i32,

    pub decision: VerificationDecision,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    /// Free-form list of documents the reviewer checked.
    #[sea_orm(column_type = "Text", nullable)]
    pub documents_checked: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_delete = "Cascade"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::ActiveEnum;

    #[test]
    fn test_decision_values_are_capitalized() {
        assert_eq!(VerificationDecision::Approved.to_value(), "Approved");
        assert_eq!(VerificationDecision::Rejected.to_value(), "Rejected");
        assert_eq!(
            serde_json::to_string(&VerificationDecision::Approved).unwrap(),
            "\"Approved\""
        );
    }
}

//! `SeaORM` Entity for approval workflows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ApprovalModule;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_workflows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub module: ApprovalModule,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub min_amount: Decimal,
    /// Zero means unbounded.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub max_amount: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::approval_steps::Entity")]
    ApprovalSteps,
    #[sea_orm(has_many = "super::approval_requests::Entity")]
    ApprovalRequests,
}

impl Related<super::approval_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSteps.def()
    }
}

impl Related<super::approval_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for approval workflow steps.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ApproverRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub step_order: i32,
    pub step_name: String,
    pub approver_role: ApproverRole,
    pub is_optional: bool,
    pub time_limit_hours: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_workflows::Entity",
        from = "Column::WorkflowId",
        to = "super::approval_workflows::Column::Id"
    )]
    ApprovalWorkflows,
}

impl Related<super::approval_workflows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalWorkflows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

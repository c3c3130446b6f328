//! `SeaORM` Entity for per-step approval actions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ActionStatus, ApproverRole};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_actions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub step_id: Uuid,
    pub step_order: i32,
    pub approver_role: ApproverRole,
    pub status: ActionStatus,
    pub escalated: bool,
    pub approver_id: Option<Uuid>,
    pub comments: Option<String>,
    pub action_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_requests::Entity",
        from = "Column::RequestId",
        to = "super::approval_requests::Column::Id"
    )]
    ApprovalRequests,
    #[sea_orm(
        belongs_to = "super::approval_steps::Entity",
        from = "Column::StepId",
        to = "super::approval_steps::Column::Id"
    )]
    ApprovalSteps,
}

impl Related<super::approval_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRequests.def()
    }
}

impl Related<super::approval_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSteps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

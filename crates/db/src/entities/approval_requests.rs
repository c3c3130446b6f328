//! `SeaORM` Entity for approval requests.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ApprovalModule, Priority, RequestStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub request_code: String,
    pub workflow_id: Uuid,
    pub module: ApprovalModule,
    pub entity_type: String,
    pub entity_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    pub title: String,
    pub status: RequestStatus,
    pub priority: Priority,
    /// The single pointer to the gating step; NULL once terminal.
    pub current_step_order: Option<i32>,
    pub requested_by: Uuid,
    pub reject_reason: Option<String>,
    pub journal_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_workflows::Entity",
        from = "Column::WorkflowId",
        to = "super::approval_workflows::Column::Id"
    )]
    ApprovalWorkflows,
    #[sea_orm(has_many = "super::approval_actions::Entity")]
    ApprovalActions,
    #[sea_orm(has_many = "super::approval_history::Entity")]
    ApprovalHistory,
}

impl Related<super::approval_workflows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalWorkflows.def()
    }
}

impl Related<super::approval_actions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalActions.def()
    }
}

impl Related<super::approval_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

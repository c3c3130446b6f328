//! `SeaORM` Entity for the append-only approval audit trail.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ApproverRole, HistoryAction};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub action: HistoryAction,
    pub actor_id: Option<Uuid>,
    pub actor_role: Option<ApproverRole>,
    pub step_order: Option<i32>,
    pub comments: Option<String>,
    pub metadata: Option<Json>,
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
}

impl Related<super::approval_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

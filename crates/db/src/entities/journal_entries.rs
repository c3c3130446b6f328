//! `SeaORM` Entity for the unified journal ledger header.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryStatus, SourceType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "unified_journal_ledger")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub transaction_uuid: Uuid,
    #[sea_orm(unique)]
    pub entry_number: String,
    pub source_type: SourceType,
    pub source_id: Uuid,
    /// `SOURCE_TYPE:source_id` while this is the live posting of the document.
    #[sea_orm(unique)]
    pub posting_key: Option<String>,
    pub entry_date: Date,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_credit: Decimal,
    pub status: EntryStatus,
    pub reversed_from: Option<Uuid>,
    pub reversed_by: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub posted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for the chart of accounts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::coa::AccountNode;
use tally_core::ledger::PostingAccount;

use super::sea_orm_active_enums::{AccountCategory, AccountType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub category: AccountCategory,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub is_header: bool,
    pub is_active: bool,
    /// Owned by the balance projector.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub balance: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
    #[sea_orm(has_one = "super::account_balances::Entity")]
    AccountBalances,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl Related<super::account_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountBalances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Live means not soft-deleted.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Tree view used by the hierarchy rules.
    #[must_use]
    pub fn to_node(&self) -> AccountNode {
        AccountNode {
            id: self.id,
            parent_id: self.parent_id,
            account_type: self.account_type.into(),
            level: self.level,
            is_header: self.is_header,
            is_active: self.is_active,
        }
    }

    /// Posting view used by line validation.
    #[must_use]
    pub fn to_posting_account(&self) -> PostingAccount {
        PostingAccount {
            id: self.id,
            code: self.code.clone(),
            is_header: self.is_header,
            is_active: self.is_active,
            is_deleted: !self.is_live(),
        }
    }
}

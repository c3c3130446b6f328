//! String-backed enums shared by the entities, with conversions to the core types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::approval::{
    ActionStatus as CoreActionStatus, ApprovalModule as CoreApprovalModule,
    ApproverRole as CoreApproverRole, HistoryAction as CoreHistoryAction,
    Priority as CorePriority, RequestStatus as CoreRequestStatus,
};
use tally_core::coa::{AccountCategory as CoreAccountCategory, AccountType as CoreAccountType};
use tally_core::ledger::{EntryStatus as CoreEntryStatus, SourceType as CoreSourceType};

/// Generates `From` impls both ways between a column enum and its core twin.
macro_rules! mirror_enum {
    ($db:ident, $core:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountType {
    #[sea_orm(string_value = "ASSET")]
    Asset,
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    #[sea_orm(string_value = "REVENUE")]
    Revenue,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

mirror_enum!(AccountType, CoreAccountType, [Asset, Liability, Equity, Revenue, Expense]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AccountCategory {
    #[sea_orm(string_value = "CURRENT_ASSET")]
    CurrentAsset,
    #[sea_orm(string_value = "FIXED_ASSET")]
    FixedAsset,
    #[sea_orm(string_value = "CURRENT_LIABILITY")]
    CurrentLiability,
    #[sea_orm(string_value = "LONG_TERM_LIABILITY")]
    LongTermLiability,
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    #[sea_orm(string_value = "OPERATING_REVENUE")]
    OperatingRevenue,
    #[sea_orm(string_value = "OTHER_REVENUE")]
    OtherRevenue,
    #[sea_orm(string_value = "COST_OF_GOODS_SOLD")]
    CostOfGoodsSold,
    #[sea_orm(string_value = "OPERATING_EXPENSE")]
    OperatingExpense,
    #[sea_orm(string_value = "OTHER_EXPENSE")]
    OtherExpense,
}

mirror_enum!(
    AccountCategory,
    CoreAccountCategory,
    [
        CurrentAsset,
        FixedAsset,
        CurrentLiability,
        LongTermLiability,
        Equity,
        OperatingRevenue,
        OtherRevenue,
        CostOfGoodsSold,
        OperatingExpense,
        OtherExpense,
    ]
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SourceType {
    #[sea_orm(string_value = "MANUAL")]
    Manual,
    #[sea_orm(string_value = "SALE")]
    Sale,
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
    #[sea_orm(string_value = "PAYMENT")]
    Payment,
    #[sea_orm(string_value = "RECEIPT")]
    Receipt,
    #[sea_orm(string_value = "CASH_BANK")]
    CashBank,
    #[sea_orm(string_value = "ADJUSTMENT")]
    Adjustment,
    #[sea_orm(string_value = "REVERSAL")]
    Reversal,
}

mirror_enum!(
    SourceType,
    CoreSourceType,
    [Manual, Sale, Purchase, Payment, Receipt, CashBank, Adjustment, Reversal]
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

mirror_enum!(EntryStatus, CoreEntryStatus, [Draft, Posted, Reversed]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ApprovalModule {
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
    #[sea_orm(string_value = "SALES")]
    Sales,
    #[sea_orm(string_value = "CASH_BANK")]
    CashBank,
    #[sea_orm(string_value = "GENERAL")]
    General,
}

mirror_enum!(ApprovalModule, CoreApprovalModule, [Purchase, Sales, CashBank, General]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ApproverRole {
    #[sea_orm(string_value = "EMPLOYEE")]
    Employee,
    #[sea_orm(string_value = "FINANCE")]
    Finance,
    #[sea_orm(string_value = "DIRECTOR")]
    Director,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

mirror_enum!(ApproverRole, CoreApproverRole, [Employee, Finance, Director, Admin]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RequestStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

mirror_enum!(RequestStatus, CoreRequestStatus, [Pending, Approved, Rejected, Cancelled]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ActionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "SKIPPED")]
    Skipped,
}

mirror_enum!(ActionStatus, CoreActionStatus, [Pending, Approved, Rejected, Skipped]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Priority {
    #[sea_orm(string_value = "LOW")]
    Low,
    #[sea_orm(string_value = "NORMAL")]
    Normal,
    #[sea_orm(string_value = "HIGH")]
    High,
    #[sea_orm(string_value = "URGENT")]
    Urgent,
}

mirror_enum!(Priority, CorePriority, [Low, Normal, High, Urgent]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum HistoryAction {
    #[sea_orm(string_value = "CREATED")]
    Created,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "ESCALATED")]
    Escalated,
}

mirror_enum!(
    HistoryAction,
    CoreHistoryAction,
    [Created, Approved, Rejected, Cancelled, Escalated]
);

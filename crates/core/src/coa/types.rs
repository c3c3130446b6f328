//! Chart of accounts domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five fundamental account types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Every account type, in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Side on which this account type increases.
    ///
    /// Asset/Expense are debit-normal, Liability/Equity/Revenue credit-normal.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }

    /// Parses the persisted representation, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ASSET" => Some(Self::Asset),
            "LIABILITY" => Some(Self::Liability),
            "EQUITY" => Some(Self::Equity),
            "REVENUE" => Some(Self::Revenue),
            "EXPENSE" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The side of an account that increases its balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// balance = debit - credit
    Debit,
    /// balance = credit - debit
    Credit,
}

impl NormalBalance {
    /// Signs a debit/credit pair according to this side.
    #[must_use]
    pub fn signed(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Reporting category. Each category belongs to exactly one account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCategory {
    /// Cash, bank, receivables, inventory, prepaid tax.
    CurrentAsset,
    /// Property, plant and equipment.
    FixedAsset,
    /// Payables and taxes due within a year.
    CurrentLiability,
    /// Loans and obligations beyond a year.
    LongTermLiability,
    /// Capital and retained earnings.
    Equity,
    /// Sales of goods and services.
    OperatingRevenue,
    /// Interest and other income.
    OtherRevenue,
    /// Direct cost of goods sold.
    CostOfGoodsSold,
    /// Salaries, rent, utilities.
    OperatingExpense,
    /// Interest and other charges.
    OtherExpense,
}

impl AccountCategory {
    /// The account type this category belongs to.
    #[must_use]
    pub const fn account_type(self) -> AccountType {
        match self {
            Self::CurrentAsset | Self::FixedAsset => AccountType::Asset,
            Self::CurrentLiability | Self::LongTermLiability => AccountType::Liability,
            Self::Equity => AccountType::Equity,
            Self::OperatingRevenue | Self::OtherRevenue => AccountType::Revenue,
            Self::CostOfGoodsSold | Self::OperatingExpense | Self::OtherExpense => {
                AccountType::Expense
            }
        }
    }

    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CurrentAsset => "CURRENT_ASSET",
            Self::FixedAsset => "FIXED_ASSET",
            Self::CurrentLiability => "CURRENT_LIABILITY",
            Self::LongTermLiability => "LONG_TERM_LIABILITY",
            Self::Equity => "EQUITY",
            Self::OperatingRevenue => "OPERATING_REVENUE",
            Self::OtherRevenue => "OTHER_REVENUE",
            Self::CostOfGoodsSold => "COST_OF_GOODS_SOLD",
            Self::OperatingExpense => "OPERATING_EXPENSE",
            Self::OtherExpense => "OTHER_EXPENSE",
        }
    }

    /// Parses the persisted representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CURRENT_ASSET" => Some(Self::CurrentAsset),
            "FIXED_ASSET" => Some(Self::FixedAsset),
            "CURRENT_LIABILITY" => Some(Self::CurrentLiability),
            "LONG_TERM_LIABILITY" => Some(Self::LongTermLiability),
            "EQUITY" => Some(Self::Equity),
            "OPERATING_REVENUE" => Some(Self::OperatingRevenue),
            "OTHER_REVENUE" => Some(Self::OtherRevenue),
            "COST_OF_GOODS_SOLD" => Some(Self::CostOfGoodsSold),
            "OPERATING_EXPENSE" => Some(Self::OperatingExpense),
            "OTHER_EXPENSE" => Some(Self::OtherExpense),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for registering an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Business code, unique among live accounts.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Reporting category; fixes the account type.
    pub category: AccountCategory,
    /// Parent header, if any.
    pub parent_id: Option<Uuid>,
}

/// The slice of an account the hierarchy rules need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNode {
    /// Account id.
    pub id: Uuid,
    /// Parent id.
    pub parent_id: Option<Uuid>,
    /// Account type.
    pub account_type: AccountType,
    /// Depth in the tree, root = 1.
    pub level: i32,
    /// Cached header flag.
    pub is_header: bool,
    /// Whether the account is active.
    pub is_active: bool,
}

//! Trial balance and the accounting equation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::coa::AccountType;

/// Balances summed per account type, leaf accounts only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    /// Signed balance per type.
    pub by_type: BTreeMap<AccountType, Decimal>,
}

impl TrialBalance {
    /// Sums `(type, balance)` pairs of leaf accounts.
    pub fn from_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (AccountType, Decimal)>,
    {
        let mut by_type = BTreeMap::new();
        for (account_type, balance) in balances {
            *by_type.entry(account_type).or_insert(Decimal::ZERO) += balance;
        }
        Self { by_type }
    }

    /// Total of one type.
    #[must_use]
    pub fn total(&self, account_type: AccountType) -> Decimal {
        self.by_type
            .get(&account_type)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Current-period income not yet closed into equity.
    #[must_use]
    pub fn net_income(&self) -> Decimal {
        self.total(AccountType::Revenue) - self.total(AccountType::Expense)
    }

    /// `ASSET - (LIABILITY + EQUITY + net income)`; zero when the books balance.
    #[must_use]
    pub fn equation_gap(&self) -> Decimal {
        self.total(AccountType::Asset)
            - (self.total(AccountType::Liability)
                + self.total(AccountType::Equity)
                + self.net_income())
    }

    /// Returns true if the accounting equation holds exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.equation_gap().is_zero()
    }
}

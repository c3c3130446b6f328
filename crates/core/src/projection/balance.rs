//! Account balance calculations.
//!
//! Asset/Expense: balance = Σdebit - Σcredit (debit-normal).
//! Liability/Equity/Revenue: balance = Σcredit - Σdebit (credit-normal).

use std::ops::AddAssign;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coa::AccountType;
use crate::ledger::EntryStatus;

/// Raw debit and credit sums for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    /// Sum of debits.
    pub debit_total: Decimal,
    /// Sum of credits.
    pub credit_total: Decimal,
}

impl AccountTotals {
    /// Adds one line.
    pub fn add_line(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
    }

    /// Signed balance for an account of `account_type`.
    #[must_use]
    pub fn balance(&self, account_type: AccountType) -> Decimal {
        account_type
            .normal_balance()
            .signed(self.debit_total, self.credit_total)
    }
}

impl AddAssign for AccountTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.debit_total += rhs.debit_total;
        self.credit_total += rhs.credit_total;
    }
}

/// A line as the projector sees it: amounts plus its entry's state.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedLine {
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Status of the owning entry.
    pub entry_status: EntryStatus,
    /// Whether the owning entry is soft-deleted.
    pub entry_deleted: bool,
}

/// Result of projecting one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedBalance {
    /// Raw sums.
    pub totals: AccountTotals,
    /// Signed balance.
    pub balance: Decimal,
}

/// Stateless balance projection rules.
pub struct BalanceProjector;

impl BalanceProjector {
    /// Whether a line of an entry in this state counts toward balances.
    ///
    /// Reversed entries still count: they are cancelled by their reversal,
    /// which is itself POSTED. Drafts and soft-deleted entries never count.
    #[must_use]
    pub const fn counts(status: EntryStatus, deleted: bool) -> bool {
        !deleted && matches!(status, EntryStatus::Posted | EntryStatus::Reversed)
    }

    /// Projects the balance of a leaf account from its lines.
    #[must_use]
    pub fn project<I>(account_type: AccountType, lines: I) -> ProjectedBalance
    where
        I: IntoIterator<Item = ProjectedLine>,
    {
        let mut totals = AccountTotals::default();
        for line in lines {
            if Self::counts(line.entry_status, line.entry_deleted) {
                totals.add_line(line.debit, line.credit);
            }
        }
        ProjectedBalance {
            balance: totals.balance(account_type),
            totals,
        }
    }

    /// Projects a header account from its children's totals.
    #[must_use]
    pub fn rollup<I>(account_type: AccountType, children: I) -> ProjectedBalance
    where
        I: IntoIterator<Item = AccountTotals>,
    {
        let mut totals = AccountTotals::default();
        for child in children {
            totals += child;
        }
        ProjectedBalance {
            balance: totals.balance(account_type),
            totals,
        }
    }
}

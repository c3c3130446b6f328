//! Sub-ledger reconciliation types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A sub-ledger account and its linked GL account, as read for a check.
#[derive(Debug, Clone)]
pub struct SubledgerBalance {
    /// Sub-ledger row id.
    pub subledger_id: Uuid,
    /// Sub-ledger code.
    pub code: String,
    /// Linked GL account.
    pub gl_account_id: Uuid,
    /// Side of record.
    pub subledger_balance: Decimal,
    /// Cached GL balance.
    pub gl_balance: Decimal,
}

/// One mismatch between a sub-ledger and its GL account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceDrift {
    /// GL account that drifted.
    pub account_id: Uuid,
    /// Sub-ledger row.
    pub subledger_id: Uuid,
    /// Sub-ledger code.
    pub code: String,
    /// Sub-ledger balance (side of record).
    pub expected: Decimal,
    /// GL balance.
    pub actual: Decimal,
    /// `expected - actual`.
    pub delta: Decimal,
}

/// Overall health of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// No drift.
    Ok,
    /// A few accounts drifted.
    Warning,
    /// Widespread drift.
    Error,
}

/// Result of `CheckSync`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// When the balances were read.
    pub checked_at: DateTime<Utc>,
    /// Number of linked pairs compared.
    pub accounts_checked: usize,
    /// Every mismatch, in sub-ledger code order.
    pub drifts: Vec<BalanceDrift>,
    /// Overall health.
    pub status: SyncStatus,
}

impl SyncReport {
    /// Returns true if every pair matched.
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.drifts.is_empty()
    }

    /// Sum of absolute deltas.
    #[must_use]
    pub fn total_abs_delta(&self) -> Decimal {
        self.drifts.iter().map(|d| d.delta.abs()).sum()
    }
}

/// Result of `AutoFix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixSummary {
    /// GL accounts overwritten with the sub-ledger balance.
    pub fixed: Vec<Uuid>,
    /// GL accounts whose balance moved since the report; left alone.
    pub stale: Vec<Uuid>,
}

//! Drift detection between sub-ledgers and the general ledger.

use chrono::{DateTime, Utc};

use super::error::ReconciliationError;
use super::types::{BalanceDrift, SubledgerBalance, SyncReport, SyncStatus};

/// More drifts than this turns a warning into an error.
pub const WARNING_DRIFT_LIMIT: usize = 3;

/// Stateless reconciliation rules.
pub struct ReconciliationService;

impl ReconciliationService {
    /// Compares every linked pair with zero tolerance.
    #[must_use]
    pub fn check(balances: &[SubledgerBalance], checked_at: DateTime<Utc>) -> SyncReport {
        let mut drifts: Vec<BalanceDrift> = balances
            .iter()
            .filter(|b| b.subledger_balance != b.gl_balance)
            .map(|b| BalanceDrift {
                account_id: b.gl_account_id,
                subledger_id: b.subledger_id,
                code: b.code.clone(),
                expected: b.subledger_balance,
                actual: b.gl_balance,
                delta: b.subledger_balance - b.gl_balance,
            })
            .collect();
        drifts.sort_by(|a, b| a.code.cmp(&b.code));

        SyncReport {
            checked_at,
            accounts_checked: balances.len(),
            status: Self::status_for(drifts.len()),
            drifts,
        }
    }

    /// Health for a number of drifted accounts.
    #[must_use]
    pub const fn status_for(drift_count: usize) -> SyncStatus {
        match drift_count {
            0 => SyncStatus::Ok,
            n if n <= WARNING_DRIFT_LIMIT => SyncStatus::Warning,
            _ => SyncStatus::Error,
        }
    }

    /// Turns a report with drift into a `BalanceDrift` error.
    ///
    /// # Errors
    ///
    /// Returns `BalanceDrift` if any pair mismatched.
    pub fn ensure_in_sync(report: &SyncReport) -> Result<(), ReconciliationError> {
        if report.is_in_sync() {
            return Ok(());
        }
        Err(ReconciliationError::BalanceDrift {
            count: report.drifts.len(),
            total_delta: report.total_abs_delta(),
        })
    }
}

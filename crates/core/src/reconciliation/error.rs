//! Reconciliation error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::InvalidAccountReason;

/// Errors raised by the reconciliation monitor.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Sub-ledgers and GL disagree. Only raised when a caller asks for it.
    #[error("{count} account(s) drifted from their sub-ledger, total delta {total_delta}")]
    BalanceDrift {
        /// Number of drifted accounts.
        count: usize,
        /// Sum of absolute deltas.
        total_delta: Decimal,
    },

    /// A sub-ledger points at a missing GL account.
    #[error("GL account {0} linked from a sub-ledger was not found")]
    GlAccountNotFound(Uuid),

    /// Sub-ledgers may only link to postable GL leaves.
    #[error("GL account {account_id} cannot back a sub-ledger: {reason}")]
    GlAccountNotPostable {
        /// Offending account.
        account_id: Uuid,
        /// Why.
        reason: InvalidAccountReason,
    },

    /// Sub-ledger row not found.
    #[error("Sub-ledger account {0} not found")]
    SubledgerNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ReconciliationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BalanceDrift { .. } => 409,
            Self::GlAccountNotPostable { .. } => 400,
            Self::GlAccountNotFound(_) | Self::SubledgerNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BalanceDrift { .. } => "BALANCE_DRIFT",
            Self::GlAccountNotFound(_) => "GL_ACCOUNT_NOT_FOUND",
            Self::GlAccountNotPostable { .. } => "GL_ACCOUNT_NOT_POSTABLE",
            Self::SubledgerNotFound(_) => "SUBLEDGER_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

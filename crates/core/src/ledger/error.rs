//! Ledger error types.
//!
//! Validation errors abort the whole posting before anything is written.
//! `AlreadyPosted` is recoverable: the existing entry is the result.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::types::{EntryStatus, SourceType};

/// Why an account cannot receive journal lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidAccountReason {
    /// No such account.
    NotFound,
    /// Header accounts only aggregate.
    Header,
    /// Account is deactivated.
    Inactive,
    /// Account is soft-deleted.
    Deleted,
}

impl std::fmt::Display for InvalidAccountReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::Header => "header account",
            Self::Inactive => "inactive",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while posting or reversing journal entries.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Entry has no lines.
    #[error("Journal entry must have at least one line")]
    NoLines,

    /// A line has both sides or neither side set.
    #[error("Line {line_number}: exactly one of debit ({debit}) or credit ({credit}) must be positive")]
    InvalidLineSides {
        /// 1-based line number.
        line_number: i32,
        /// Debit given.
        debit: Decimal,
        /// Credit given.
        credit: Decimal,
    },

    /// A line carries a negative amount.
    #[error("Line {line_number}: amounts cannot be negative")]
    NegativeAmount {
        /// 1-based line number.
        line_number: i32,
    },

    /// A line carries more than two decimal places.
    #[error("Line {line_number}: amount {amount} has more than two decimal places")]
    ExcessPrecision {
        /// 1-based line number.
        line_number: i32,
        /// Offending amount.
        amount: Decimal,
    },

    /// A line amount does not fit the ledger's money column.
    #[error("Line {line_number}: amount {amount} exceeds the largest storable amount")]
    AmountOutOfRange {
        /// 1-based line number.
        line_number: i32,
        /// Offending amount.
        amount: Decimal,
    },

    /// The running debit or credit total outgrew the money column.
    #[error("Line {line_number}: entry total exceeds the largest storable amount")]
    TotalOutOfRange {
        /// 1-based line number where the total overflowed.
        line_number: i32,
    },

    /// Debits and credits differ, or both are zero.
    #[error("Entry is unbalanced: debit {total_debit} != credit {total_credit}")]
    UnbalancedEntry {
        /// Sum of debits.
        total_debit: Decimal,
        /// Sum of credits.
        total_credit: Decimal,
    },

    /// A target account cannot receive lines.
    #[error("Account {account_id} cannot receive postings: {reason}")]
    InvalidPostingAccount {
        /// Offending account.
        account_id: Uuid,
        /// Why.
        reason: InvalidAccountReason,
    },

    /// The document already has a live posted entry.
    #[error("{source_type} {source_id} is already posted as entry {entry_id}")]
    AlreadyPosted {
        /// Existing entry.
        entry_id: Uuid,
        /// Source type.
        source_type: SourceType,
        /// Source document.
        source_id: Uuid,
    },

    /// Another writer took the posting key first; re-read to get its entry.
    #[error("{source_type} {source_id} was posted concurrently")]
    ConcurrentPosting {
        /// Source type.
        source_type: SourceType,
        /// Source document.
        source_id: Uuid,
    },

    /// Entry not found.
    #[error("Journal entry {0} not found")]
    EntryNotFound(Uuid),

    /// Only posted entries can be reversed.
    #[error("Journal entry {entry_id} is {status} and cannot be reversed")]
    NotReversible {
        /// The entry.
        entry_id: Uuid,
        /// Its status.
        status: EntryStatus,
    },

    /// Reversal entries are final.
    #[error("Journal entry {0} is itself a reversal")]
    ReversalOfReversal(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoLines
            | Self::InvalidLineSides { .. }
            | Self::NegativeAmount { .. }
            | Self::ExcessPrecision { .. }
            | Self::AmountOutOfRange { .. }
            | Self::TotalOutOfRange { .. }
            | Self::UnbalancedEntry { .. }
            | Self::InvalidPostingAccount { .. } => 400,
            Self::EntryNotFound(_) => 404,
            Self::AlreadyPosted { .. }
            | Self::ConcurrentPosting { .. }
            | Self::NotReversible { .. }
            | Self::ReversalOfReversal(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoLines => "NO_LINES",
            Self::InvalidLineSides { .. } => "INVALID_LINE_SIDES",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::ExcessPrecision { .. } => "EXCESS_PRECISION",
            Self::AmountOutOfRange { .. } => "AMOUNT_OUT_OF_RANGE",
            Self::TotalOutOfRange { .. } => "TOTAL_OUT_OF_RANGE",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::InvalidPostingAccount { .. } => "INVALID_POSTING_ACCOUNT",
            Self::AlreadyPosted { .. } => "ALREADY_POSTED",
            Self::ConcurrentPosting { .. } => "CONCURRENT_POSTING",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::NotReversible { .. } => "NOT_REVERSIBLE",
            Self::ReversalOfReversal(_) => "REVERSAL_OF_REVERSAL",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if the caller may treat the existing entry as success.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AlreadyPosted { .. } | Self::ConcurrentPosting { .. }
        )
    }
}

//! Double-entry journal logic.
//!
//! # Modules
//!
//! - `types` - Source types, entry status, posting lines and requests
//! - `error` - Ledger-specific error types
//! - `validation` - Line shape, balance and posting-account checks
//! - `service` - Posting preparation
//! - `reversal` - Side-swapping reversal plans

pub mod error;
pub mod reversal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod validation_props;

pub use error::{InvalidAccountReason, LedgerError};
pub use reversal::{OriginalEntry, ReversalPlan, ReversalService};
pub use service::LedgerService;
pub use types::{
    EntryStatus, EntryTotals, NumberedLine, PostingAccount, PostingLine, PostingRequest,
    PreparedEntry, SourceType, entry_number, posting_key,
};

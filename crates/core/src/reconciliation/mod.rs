//! Sub-ledger to general ledger reconciliation.

pub mod error;
pub mod service;
pub mod types;

pub use error::ReconciliationError;
pub use service::{ReconciliationService, WARNING_DRIFT_LIMIT};
pub use types::{BalanceDrift, FixSummary, SubledgerBalance, SyncReport, SyncStatus};

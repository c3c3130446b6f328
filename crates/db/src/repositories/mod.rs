//! Repository abstractions for data access.
//!
//! Repositories run the core rules inside database transactions, hiding the
//! `SeaORM` details from the rest of the application.

pub mod account;
pub mod approval;
pub mod balance;
pub mod ledger;
pub mod reconciliation;

pub use account::{AccountFilter, AccountRepository, AccountTreeNode};
pub use approval::{
    ActionInput, ApprovalRepository, CreateRequestInput, CreateWorkflowInput, JournalSource,
    RequestWithActions, StepInput,
};
pub use balance::{BalanceRepository, CacheDrift};
pub use ledger::{DuplicatePosting, EntryWithLines, LedgerRepository, PostOutcome};
pub use reconciliation::ReconciliationRepository;

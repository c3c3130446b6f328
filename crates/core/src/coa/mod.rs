//! Chart of accounts: account types, categories and hierarchy rules.
//!
//! # Modules
//!
//! - `types` - Account type, normal balance side, categories, tree nodes
//! - `error` - COA-specific error types
//! - `hierarchy` - Validation of new accounts, removals and header flags

pub mod error;
pub mod hierarchy;
pub mod types;

#[cfg(test)]
mod hierarchy_props;

pub use error::CoaError;
pub use hierarchy::CoaService;
pub use types::{AccountCategory, AccountNode, AccountType, NewAccount, NormalBalance};

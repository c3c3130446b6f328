//! Balance projection: ledger lines to cached account balances.
//!
//! # Modules
//!
//! - `balance` - Per-account projection and header rollup
//! - `trial` - Trial balance and the accounting equation

pub mod balance;
pub mod trial;

#[cfg(test)]
mod projection_props;

pub use balance::{AccountTotals, BalanceProjector, ProjectedBalance, ProjectedLine};
pub use trial::TrialBalance;

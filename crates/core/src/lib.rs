//! Core ledger and approval logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `coa` - Chart of accounts hierarchy rules
//! - `ledger` - Double-entry posting and reversal
//! - `projection` - Balance projection, header rollup, trial balance
//! - `approval` - Tiered approval workflows and the request state machine
//! - `reconciliation` - Sub-ledger vs GL drift detection

pub mod approval;
pub mod coa;
pub mod ledger;
pub mod projection;
pub mod reconciliation;

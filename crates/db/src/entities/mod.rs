//! `SeaORM` entities.
//!
//! Enums are stored as strings so the same schema runs on Postgres and SQLite.

#![allow(missing_docs)]

pub mod account_balances;
pub mod accounts;
pub mod approval_actions;
pub mod approval_history;
pub mod approval_requests;
pub mod approval_steps;
pub mod approval_workflows;
pub mod cash_bank_accounts;
pub mod journal_entries;
pub mod journal_lines;
pub mod sea_orm_active_enums;

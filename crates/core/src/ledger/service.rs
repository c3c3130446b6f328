//! Ledger service for posting validation.
//!
//! Pure logic, no database access: the caller supplies account lookups as a
//! closure and writes the prepared entry inside its own transaction.

use std::collections::BTreeSet;

use uuid::Uuid;

use super::error::LedgerError;
use super::types::{NumberedLine, PostingAccount, PostingRequest, PreparedEntry};
use super::validation::{line_number, validate_lines, validate_posting_account};

/// Ledger service for posting validation.
pub struct LedgerService;

impl LedgerService {
    /// Validates a posting request and numbers its lines.
    ///
    /// Steps, in order:
    /// 1. Line shape (one positive side, no negatives, two decimals max)
    /// 2. Balance (`Σdebit == Σcredit > 0`)
    /// 3. Every target account is a live, active leaf
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` found. Nothing has been written.
    pub fn prepare_posting<A>(
        request: &PostingRequest,
        account_lookup: A,
    ) -> Result<PreparedEntry, LedgerError>
    where
        A: Fn(Uuid) -> Option<PostingAccount>,
    {
        let totals = validate_lines(&request.lines)?;

        let mut accounts = BTreeSet::new();
        for line in &request.lines {
            if accounts.insert(line.account_id) {
                let account = account_lookup(line.account_id);
                validate_posting_account(line.account_id, account.as_ref())?;
            }
        }

        let lines = request
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| NumberedLine {
                line_number: line_number(idx),
                line: line.clone(),
            })
            .collect();

        Ok(PreparedEntry {
            lines,
            totals,
            accounts,
        })
    }
}

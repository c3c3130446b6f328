//! Reversal of posted entries.
//!
//! A reversal is a new entry with every line's debit and credit swapped.
//! The original lines are never touched.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::LedgerError;
use super::types::{
    EntryStatus, EntryTotals, NumberedLine, PostingLine, SourceType, reversal_entry_number,
};

/// The parts of a persisted entry needed to reverse it.
#[derive(Debug, Clone)]
pub struct OriginalEntry {
    /// Entry id.
    pub id: Uuid,
    /// Entry number.
    pub entry_number: String,
    /// Source type of the original.
    pub source_type: SourceType,
    /// Current status.
    pub status: EntryStatus,
    /// Original lines.
    pub lines: Vec<NumberedLine>,
}

/// What to write for a reversal.
#[derive(Debug, Clone)]
pub struct ReversalPlan {
    /// Entry number of the new entry.
    pub entry_number: String,
    /// Header description.
    pub description: String,
    /// Swapped lines, same numbering as the original.
    pub lines: Vec<NumberedLine>,
    /// Totals of the reversal.
    pub totals: EntryTotals,
}

/// Stateless reversal planner.
pub struct ReversalService;

impl ReversalService {
    /// Plans the reversal of a posted entry.
    ///
    /// # Errors
    ///
    /// Returns `NotReversible` unless the entry is POSTED, and
    /// `ReversalOfReversal` for reversal entries.
    pub fn plan(original: &OriginalEntry, reason: Option<&str>) -> Result<ReversalPlan, LedgerError> {
        if original.source_type == SourceType::Reversal {
            return Err(LedgerError::ReversalOfReversal(original.id));
        }
        if original.status != EntryStatus::Posted {
            return Err(LedgerError::NotReversible {
                entry_id: original.id,
                status: original.status,
            });
        }

        let lines: Vec<NumberedLine> = original
            .lines
            .iter()
            .map(|l| NumberedLine {
                line_number: l.line_number,
                line: Self::swap(&l.line),
            })
            .collect();

        let totals = lines.iter().fold(EntryTotals::default(), |mut acc, l| {
            acc.total_debit += l.line.debit;
            acc.total_credit += l.line.credit;
            acc
        });

        let description = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => format!("Reversal of {}: {r}", original.entry_number),
            None => format!("Reversal of {}", original.entry_number),
        };

        Ok(ReversalPlan {
            entry_number: reversal_entry_number(&original.entry_number),
            description,
            lines,
            totals,
        })
    }

    /// Swaps the debit and credit sides of a line.
    #[must_use]
    pub fn swap(line: &PostingLine) -> PostingLine {
        PostingLine {
            account_id: line.account_id,
            debit: line.credit,
            credit: line.debit,
            description: line.description.clone(),
        }
    }

    /// Net effect of an entry and its reversal on one account: always zero.
    #[must_use]
    pub fn net_effect(original: &[NumberedLine], reversal: &[NumberedLine], account_id: Uuid) -> Decimal {
        original
            .iter()
            .chain(reversal)
            .filter(|l| l.line.account_id == account_id)
            .map(|l| l.line.debit - l.line.credit)
            .sum()
    }
}

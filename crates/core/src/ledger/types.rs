//! Ledger domain types.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Business document that produced a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// Hand-entered journal.
    Manual,
    /// Sales invoice.
    Sale,
    /// Purchase invoice.
    Purchase,
    /// Payment to a supplier.
    Payment,
    /// Receipt from a customer.
    Receipt,
    /// Cash or bank movement.
    CashBank,
    /// Period-end or correcting adjustment.
    Adjustment,
    /// Mirror of a reversed entry.
    Reversal,
}

impl SourceType {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Sale => "SALE",
            Self::Purchase => "PURCHASE",
            Self::Payment => "PAYMENT",
            Self::Receipt => "RECEIPT",
            Self::CashBank => "CASH_BANK",
            Self::Adjustment => "ADJUSTMENT",
            Self::Reversal => "REVERSAL",
        }
    }

    /// Entry number prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Manual => "MAN",
            Self::Sale => "SAL",
            Self::Purchase => "PUR",
            Self::Payment => "PAY",
            Self::Receipt => "RCV",
            Self::CashBank => "CSB",
            Self::Adjustment => "ADJ",
            Self::Reversal => "REV",
        }
    }

    /// Parses the persisted representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MANUAL" => Some(Self::Manual),
            "SALE" => Some(Self::Sale),
            "PURCHASE" => Some(Self::Purchase),
            "PAYMENT" => Some(Self::Payment),
            "RECEIPT" => Some(Self::Receipt),
            "CASH_BANK" => Some(Self::CashBank),
            "ADJUSTMENT" => Some(Self::Adjustment),
            "REVERSAL" => Some(Self::Reversal),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Journal entry lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Not yet part of the books.
    Draft,
    /// Immutable and counted in balances.
    Posted,
    /// Still counted, cancelled out by its reversal entry.
    Reversed,
}

impl EntryStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Reversed => "REVERSED",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a journal entry as supplied by a document service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Target leaf account.
    pub account_id: Uuid,
    /// Debit amount, zero for credit lines.
    pub debit: Decimal,
    /// Credit amount, zero for debit lines.
    pub credit: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
}

impl PostingLine {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request to post one document into the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingRequest {
    /// Kind of source document.
    pub source_type: SourceType,
    /// Identity of the source document.
    pub source_id: Uuid,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Header description.
    pub description: String,
    /// Lines in caller order; numbering follows this order.
    pub lines: Vec<PostingLine>,
    /// User who triggered the posting.
    pub created_by: Option<Uuid>,
}

impl PostingRequest {
    /// Idempotency key for this document.
    #[must_use]
    pub fn posting_key(&self) -> String {
        posting_key(self.source_type, self.source_id)
    }
}

/// Builds the idempotency key `SOURCE_TYPE:source_id`.
#[must_use]
pub fn posting_key(source_type: SourceType, source_id: Uuid) -> String {
    format!("{}:{source_id}", source_type.as_str())
}

/// Builds an entry number such as `PUR-20261019-3e4f5a6b`.
///
/// The suffix is the tail of the transaction UUID; the head of a v7 UUID is a
/// timestamp and would repeat for entries posted in the same minute.
#[must_use]
pub fn entry_number(source_type: SourceType, entry_date: NaiveDate, transaction_uuid: Uuid) -> String {
    let hex = transaction_uuid.simple().to_string();
    format!(
        "{}-{}-{}",
        source_type.prefix(),
        entry_date.format("%Y%m%d"),
        &hex[hex.len() - 8..]
    )
}

/// Entry number of the reversal of `original`.
#[must_use]
pub fn reversal_entry_number(original: &str) -> String {
    format!("REV-{original}")
}

/// What the ledger needs to know about a target account.
#[derive(Debug, Clone)]
pub struct PostingAccount {
    /// The account ID.
    pub id: Uuid,
    /// Account code, for messages.
    pub code: String,
    /// Header accounts only aggregate their children.
    pub is_header: bool,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account is soft-deleted.
    pub is_deleted: bool,
}

/// A validated line with its stable position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedLine {
    /// 1-based position within the entry.
    pub line_number: i32,
    /// The line itself.
    pub line: PostingLine,
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

impl EntryTotals {
    /// Returns true if debits equal credits and both are positive.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit && self.total_debit > Decimal::ZERO
    }
}

/// A posting that passed every check and is ready to be written.
#[derive(Debug, Clone)]
pub struct PreparedEntry {
    /// Lines numbered in caller order.
    pub lines: Vec<NumberedLine>,
    /// Entry totals.
    pub totals: EntryTotals,
    /// Distinct accounts touched, sorted for deterministic lock order.
    pub accounts: BTreeSet<Uuid>,
}

//! Ledger repository: posting, reversal and ledger queries.
//!
//! A posting is one database transaction: idempotency check, account row
//! locks in id order, entry and lines, then projection of every touched
//! account and its ancestors. The `posting_key` unique column backs the
//! idempotency check when two writers race on the same document.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use tally_core::coa::CoaError;
use tally_core::ledger::{
    LedgerError, LedgerService, NumberedLine, OriginalEntry, PostingAccount, PostingLine,
    PostingRequest, ReversalService, SourceType, entry_number, posting_key,
};

use super::balance::{lock_accounts, parent_links, project_in_order, projection_order};
use crate::entities::{
    journal_entries, journal_lines,
    sea_orm_active_enums::{EntryStatus, SourceType as DbSourceType},
};

/// A journal entry with its lines in line-number order.
#[derive(Debug, Clone)]
pub struct EntryWithLines {
    /// Header.
    pub entry: journal_entries::Model,
    /// Lines.
    pub lines: Vec<journal_lines::Model>,
}

/// Result of an idempotent posting.
#[derive(Debug, Clone)]
pub enum PostOutcome {
    /// A new entry was written.
    Posted(EntryWithLines),
    /// The document was already posted; this is the existing entry.
    AlreadyPosted(EntryWithLines),
}

impl PostOutcome {
    /// The entry, new or existing.
    #[must_use]
    pub const fn entry(&self) -> &EntryWithLines {
        match self {
            Self::Posted(e) | Self::AlreadyPosted(e) => e,
        }
    }

    /// Consumes the outcome, returning the entry.
    #[must_use]
    pub fn into_entry(self) -> EntryWithLines {
        match self {
            Self::Posted(e) | Self::AlreadyPosted(e) => e,
        }
    }

    /// True if this call wrote the entry.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Posted(_))
    }
}

/// More than one live posting for the same document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePosting {
    /// Source type.
    pub source_type: SourceType,
    /// Source document.
    pub source_id: Uuid,
    /// The competing entries, oldest first.
    pub entry_ids: Vec<Uuid>,
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Posts a document exactly once.
    ///
    /// If the document already has a live posting, that entry is returned
    /// as `AlreadyPosted` and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns a validation error (`UnbalancedEntry`, `InvalidPostingAccount`,
    /// ...) with nothing written, or a database error.
    pub async fn post_for_approval(
        &self,
        request: &PostingRequest,
    ) -> Result<PostOutcome, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        match Self::post_within(&txn, request).await {
            Ok(outcome) => {
                txn.commit().await.map_err(db_err)?;
                Ok(outcome)
            }
            Err(LedgerError::ConcurrentPosting {
                source_type,
                source_id,
            }) => {
                txn.rollback().await.map_err(db_err)?;
                let existing = find_live_posting(&self.db, source_type, source_id)
                    .await?
                    .ok_or(LedgerError::ConcurrentPosting {
                        source_type,
                        source_id,
                    })?;
                info!(
                    entry_id = %existing.entry.id,
                    source_type = %source_type,
                    source_id = %source_id,
                    "Lost posting race, returning the winning entry"
                );
                Ok(PostOutcome::AlreadyPosted(existing))
            }
            Err(e) => Err(e),
        }
    }

    /// Posts a document that must not have been posted before.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPosted` if a live posting exists, plus everything
    /// `post_for_approval` can return.
    pub async fn post_fresh(&self, request: &PostingRequest) -> Result<EntryWithLines, LedgerError> {
        match self.post_for_approval(request).await? {
            PostOutcome::Posted(entry) => Ok(entry),
            PostOutcome::AlreadyPosted(existing) => Err(LedgerError::AlreadyPosted {
                entry_id: existing.entry.id,
                source_type: request.source_type,
                source_id: request.source_id,
            }),
        }
    }

    /// Posts inside a transaction owned by the caller.
    ///
    /// Used when the posting must commit or roll back together with other
    /// writes, such as the final approval of a request.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentPosting` if another writer took the posting key; the
    /// caller's transaction is then unusable and must be rolled back.
    pub async fn post_within<C>(conn: &C, request: &PostingRequest) -> Result<PostOutcome, LedgerError>
    where
        C: ConnectionTrait,
    {
        if let Some(existing) = find_live_posting(conn, request.source_type, request.source_id).await? {
            info!(
                entry_id = %existing.entry.id,
                source_type = %request.source_type,
                source_id = %request.source_id,
                "Document already posted, returning existing entry"
            );
            return Ok(PostOutcome::AlreadyPosted(existing));
        }

        let touched: BTreeSet<Uuid> = request.lines.iter().map(|l| l.account_id).collect();
        let parents = parent_links(conn).await.map_err(coa_err)?;
        let order = projection_order(&touched, &parents).map_err(coa_err)?;
        let locked = lock_accounts(conn, &order.iter().copied().collect())
            .await
            .map_err(coa_err)?;
        let accounts: HashMap<Uuid, PostingAccount> = locked
            .iter()
            .map(|a| (a.id, a.to_posting_account()))
            .collect();

        let prepared = LedgerService::prepare_posting(request, |id| accounts.get(&id).cloned())?;

        let transaction_uuid = Uuid::now_v7();
        let now: DateTimeWithTimeZone = Utc::now().into();
        let header = journal_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            transaction_uuid: Set(transaction_uuid),
            entry_number: Set(entry_number(
                request.source_type,
                request.entry_date,
                transaction_uuid,
            )),
            source_type: Set(request.source_type.into()),
            source_id: Set(request.source_id),
            posting_key: Set(Some(request.posting_key())),
            entry_date: Set(request.entry_date),
            description: Set(request.description.clone()),
            total_debit: Set(prepared.totals.total_debit),
            total_credit: Set(prepared.totals.total_credit),
            status: Set(EntryStatus::Posted),
            reversed_from: Set(None),
            reversed_by: Set(None),
            created_by: Set(request.created_by),
            posted_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let entry = header.insert(conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::ConcurrentPosting {
                    source_type: request.source_type,
                    source_id: request.source_id,
                }
            } else {
                db_err(e)
            }
        })?;
        let lines = insert_lines(conn, entry.id, &prepared.lines, now).await?;

        project_in_order(conn, &order).await.map_err(coa_err)?;

        info!(
            entry_id = %entry.id,
            entry_number = %entry.entry_number,
            source_type = %request.source_type,
            source_id = %request.source_id,
            total = %prepared.totals.total_debit,
            lines = lines.len(),
            "Posted journal entry"
        );

        Ok(PostOutcome::Posted(EntryWithLines { entry, lines }))
    }

    /// Reverses a posted entry with a new, side-swapped entry.
    ///
    /// The original keeps its lines and becomes REVERSED; its posting key is
    /// released so the document can be posted again.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `NotReversible` or `ReversalOfReversal`.
    pub async fn reverse(
        &self,
        entry_id: Uuid,
        reason: Option<&str>,
        reversed_by: Option<Uuid>,
    ) -> Result<EntryWithLines, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let original = journal_entries::Entity::find_by_id(entry_id)
            .filter(journal_entries::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let original_lines = load_lines(&txn, entry_id).await?;

        let plan = ReversalService::plan(
            &OriginalEntry {
                id: original.id,
                entry_number: original.entry_number.clone(),
                source_type: original.source_type.into(),
                status: original.status.into(),
                lines: original_lines.iter().map(numbered_line).collect(),
            },
            reason,
        )?;

        let touched: BTreeSet<Uuid> = plan.lines.iter().map(|l| l.line.account_id).collect();
        let parents = parent_links(&txn).await.map_err(coa_err)?;
        let order = projection_order(&touched, &parents).map_err(coa_err)?;
        lock_accounts(&txn, &order.iter().copied().collect())
            .await
            .map_err(coa_err)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let reversal = journal_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            transaction_uuid: Set(Uuid::now_v7()),
            entry_number: Set(plan.entry_number),
            source_type: Set(DbSourceType::Reversal),
            source_id: Set(original.id),
            posting_key: Set(Some(posting_key(SourceType::Reversal, original.id))),
            entry_date: Set(Utc::now().date_naive()),
            description: Set(plan.description),
            total_debit: Set(plan.totals.total_debit),
            total_credit: Set(plan.totals.total_credit),
            status: Set(EntryStatus::Posted),
            reversed_from: Set(Some(original.id)),
            reversed_by: Set(None),
            created_by: Set(reversed_by),
            posted_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        let lines = insert_lines(&txn, reversal.id, &plan.lines, now).await?;

        let mut reversed: journal_entries::ActiveModel = original.into();
        reversed.status = Set(EntryStatus::Reversed);
        reversed.reversed_by = Set(Some(reversal.id));
        reversed.posting_key = Set(None);
        reversed.updated_at = Set(now);
        let original = reversed.update(&txn).await.map_err(db_err)?;

        project_in_order(&txn, &order).await.map_err(coa_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            entry_id = %original.id,
            reversal_id = %reversal.id,
            entry_number = %reversal.entry_number,
            "Reversed journal entry"
        );

        Ok(EntryWithLines {
            entry: reversal,
            lines,
        })
    }

    /// Finds the live posting of a document, if any.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_live_posting(
        &self,
        source_type: SourceType,
        source_id: Uuid,
    ) -> Result<Option<EntryWithLines>, LedgerError> {
        find_live_posting(&self.db, source_type, source_id).await
    }

    /// Lists every entry of a document, reversed ones included, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_by_source(
        &self,
        source_type: SourceType,
        source_id: Uuid,
    ) -> Result<Vec<journal_entries::Model>, LedgerError> {
        journal_entries::Entity::find()
            .filter(journal_entries::Column::SourceType.eq(DbSourceType::from(source_type)))
            .filter(journal_entries::Column::SourceId.eq(source_id))
            .filter(journal_entries::Column::DeletedAt.is_null())
            .order_by_asc(journal_entries::Column::CreatedAt)
            .order_by_asc(journal_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Loads an entry and its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` or a database error.
    pub async fn entry_with_lines(&self, entry_id: Uuid) -> Result<EntryWithLines, LedgerError> {
        let entry = journal_entries::Entity::find_by_id(entry_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let lines = load_lines(&self.db, entry_id).await?;
        Ok(EntryWithLines { entry, lines })
    }

    /// Reports documents with more than one live POSTED entry.
    ///
    /// Reversal entries are excluded; the result should always be empty.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn detect_duplicate_postings(&self) -> Result<Vec<DuplicatePosting>, LedgerError> {
        let posted = journal_entries::Entity::find()
            .filter(journal_entries::Column::Status.eq(EntryStatus::Posted))
            .filter(journal_entries::Column::DeletedAt.is_null())
            .filter(journal_entries::Column::SourceType.ne(DbSourceType::Reversal))
            .order_by_asc(journal_entries::Column::CreatedAt)
            .order_by_asc(journal_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut groups: BTreeMap<(String, Uuid), (SourceType, Vec<Uuid>)> = BTreeMap::new();
        for entry in posted {
            let source_type = SourceType::from(entry.source_type);
            groups
                .entry((source_type.as_str().to_string(), entry.source_id))
                .or_insert_with(|| (source_type, Vec::new()))
                .1
                .push(entry.id);
        }

        Ok(groups
            .into_iter()
            .filter(|(_, (_, ids))| ids.len() > 1)
            .map(|((_, source_id), (source_type, entry_ids))| DuplicatePosting {
                source_type,
                source_id,
                entry_ids,
            })
            .collect())
    }
}

fn db_err(e: DbErr) -> LedgerError {
    LedgerError::Database(e.to_string())
}

fn coa_err(e: CoaError) -> LedgerError {
    LedgerError::Database(e.to_string())
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) async fn find_live_posting<C>(
    conn: &C,
    source_type: SourceType,
    source_id: Uuid,
) -> Result<Option<EntryWithLines>, LedgerError>
where
    C: ConnectionTrait,
{
    let entry = journal_entries::Entity::find()
        .filter(journal_entries::Column::PostingKey.eq(posting_key(source_type, source_id)))
        .one(conn)
        .await
        .map_err(db_err)?;

    match entry {
        Some(entry) => {
            let lines = load_lines(conn, entry.id).await?;
            Ok(Some(EntryWithLines { entry, lines }))
        }
        None => Ok(None),
    }
}

async fn load_lines<C>(conn: &C, entry_id: Uuid) -> Result<Vec<journal_lines::Model>, LedgerError>
where
    C: ConnectionTrait,
{
    journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.eq(entry_id))
        .order_by_asc(journal_lines::Column::LineNumber)
        .all(conn)
        .await
        .map_err(db_err)
}

async fn insert_lines<C>(
    conn: &C,
    entry_id: Uuid,
    lines: &[NumberedLine],
    now: DateTimeWithTimeZone,
) -> Result<Vec<journal_lines::Model>, LedgerError>
where
    C: ConnectionTrait,
{
    let mut inserted = Vec::with_capacity(lines.len());
    for numbered in lines {
        let line = journal_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            entry_id: Set(entry_id),
            account_id: Set(numbered.line.account_id),
            line_number: Set(numbered.line_number),
            debit_amount: Set(numbered.line.debit),
            credit_amount: Set(numbered.line.credit),
            description: Set(numbered.line.description.clone()),
            created_at: Set(now),
        };
        inserted.push(line.insert(conn).await.map_err(db_err)?);
    }
    Ok(inserted)
}

fn numbered_line(line: &journal_lines::Model) -> NumberedLine {
    NumberedLine {
        line_number: line.line_number,
        line: PostingLine {
            account_id: line.account_id,
            debit: line.debit_amount,
            credit: line.credit_amount,
            description: line.description.clone(),
        },
    }
}

//! Balance projector repository.
//!
//! The only writer of `accounts.balance` and `account_balances`. Postings,
//! reversals and the reconciliation monitor all go through here. Account rows
//! are locked in id order before projecting, so two projections of the same
//! account serialize while different accounts proceed in parallel.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::coa::{AccountType, CoaError, CoaService};
use tally_core::projection::{
    AccountTotals, BalanceProjector, ProjectedBalance, ProjectedLine, TrialBalance,
};

use crate::entities::{account_balances, accounts, journal_entries, journal_lines};

/// An account whose cached balance disagrees with the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDrift {
    /// Account id.
    pub account_id: Uuid,
    /// Account code.
    pub code: String,
    /// Value in `accounts.balance`.
    pub cached: Decimal,
    /// Value derived from posted lines.
    pub derived: Decimal,
}

/// Balance projector repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recomputes one account and rolls the result up its ancestors.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown ids, or a database error.
    pub async fn recompute(&self, account_id: Uuid) -> Result<ProjectedBalance, CoaError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let parents = parent_links(&txn).await?;
        if !parents.contains_key(&account_id) {
            return Err(CoaError::AccountNotFound(account_id));
        }

        let touched = BTreeSet::from([account_id]);
        let order = projection_order(&touched, &parents)?;
        lock_accounts(&txn, &order.iter().copied().collect()).await?;
        let projected = project_in_order(&txn, &order).await?;

        txn.commit().await.map_err(db_err)?;

        projected
            .get(&account_id)
            .copied()
            .ok_or(CoaError::AccountNotFound(account_id))
    }

    /// Rebuilds every live account from the ledger in one transaction.
    ///
    /// Only committed entries are visible, so a half-written posting is never
    /// observed. Returns the number of accounts written.
    ///
    /// # Errors
    ///
    /// Returns a database error; nothing is written in that case.
    pub async fn refresh_all(&self) -> Result<usize, CoaError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let live = accounts::Entity::find()
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(db_err)?;

        let derived = derive_all(&txn, &live).await?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        for account in &live {
            if let Some(projected) = derived.get(&account.id) {
                write_balance(&txn, account.id, projected, now).await?;
            }
        }

        txn.commit().await.map_err(db_err)?;

        info!(accounts = derived.len(), "Rebuilt account balances from ledger");
        Ok(derived.len())
    }

    /// Lists accounts whose cached balance differs from the ledger.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn cache_drift(&self) -> Result<Vec<CacheDrift>, CoaError> {
        let live = accounts::Entity::find()
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let derived = derive_all(&self.db, &live).await?;

        let drifts: Vec<CacheDrift> = live
            .iter()
            .filter_map(|account| {
                let projected = derived.get(&account.id)?;
                (projected.balance != account.balance).then(|| CacheDrift {
                    account_id: account.id,
                    code: account.code.clone(),
                    cached: account.balance,
                    derived: projected.balance,
                })
            })
            .collect();

        if !drifts.is_empty() {
            warn!(count = drifts.len(), "Cached balances drifted from ledger");
        }
        Ok(drifts)
    }

    /// Sums cached leaf balances per account type.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn trial_balance(&self) -> Result<TrialBalance, CoaError> {
        let leaves = accounts::Entity::find()
            .filter(accounts::Column::DeletedAt.is_null())
            .filter(accounts::Column::IsHeader.eq(false))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(TrialBalance::from_balances(
            leaves
                .iter()
                .map(|a| (AccountType::from(a.account_type), a.balance)),
        ))
    }

    /// Overwrites a cached balance outside the projection rule.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn override_balance(
        &self,
        account_id: Uuid,
        balance: Decimal,
        reason: &str,
    ) -> Result<(), CoaError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let account = lock_accounts(&txn, &BTreeSet::from([account_id]))
            .await?
            .into_iter()
            .next()
            .ok_or(CoaError::AccountNotFound(account_id))?;
        override_balance_in(&txn, &account, balance, reason).await?;
        txn.commit().await.map_err(db_err)
    }
}

fn db_err(e: DbErr) -> CoaError {
    CoaError::Database(e.to_string())
}

/// Parent link of every account, deleted ones included.
pub(crate) async fn parent_links<C>(conn: &C) -> Result<HashMap<Uuid, Option<Uuid>>, CoaError>
where
    C: ConnectionTrait,
{
    let rows: Vec<(Uuid, Option<Uuid>)> = accounts::Entity::find()
        .select_only()
        .column(accounts::Column::Id)
        .column(accounts::Column::ParentId)
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err)?;
    Ok(rows.into_iter().collect())
}

/// Touched accounts plus all their ancestors, deepest first.
pub(crate) fn projection_order(
    touched: &BTreeSet<Uuid>,
    parents: &HashMap<Uuid, Option<Uuid>>,
) -> Result<Vec<Uuid>, CoaError> {
    let mut depth: HashMap<Uuid, usize> = HashMap::new();
    for &account_id in touched {
        let chain = CoaService::ancestors(account_id, parents)?;
        depth.insert(account_id, chain.len());
        for (idx, ancestor) in chain.iter().enumerate() {
            depth.insert(*ancestor, chain.len() - 1 - idx);
        }
    }

    let mut order: Vec<(Uuid, usize)> = depth.into_iter().collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    Ok(order.into_iter().map(|(id, _)| id).collect())
}

/// Locks account rows in id order.
pub(crate) async fn lock_accounts<C>(
    conn: &C,
    ids: &BTreeSet<Uuid>,
) -> Result<Vec<accounts::Model>, CoaError>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids.iter().copied()))
        .order_by_asc(accounts::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await
        .map_err(db_err)
}

/// Projects accounts in the given order. Callers hold the row locks.
pub(crate) async fn project_in_order<C>(
    conn: &C,
    order: &[Uuid],
) -> Result<HashMap<Uuid, ProjectedBalance>, CoaError>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut projected = HashMap::with_capacity(order.len());
    for &account_id in order {
        projected.insert(account_id, project_account(conn, account_id, now).await?);
    }
    Ok(projected)
}

/// Overwrites the cached balance of a locked account and logs it.
pub(crate) async fn override_balance_in<C>(
    conn: &C,
    account: &accounts::Model,
    balance: Decimal,
    reason: &str,
) -> Result<(), CoaError>
where
    C: ConnectionTrait,
{
    warn!(
        account_id = %account.id,
        code = %account.code,
        previous = %account.balance,
        balance = %balance,
        reason = %reason,
        "Overriding cached GL balance"
    );

    let now: DateTimeWithTimeZone = Utc::now().into();
    accounts::Entity::update_many()
        .col_expr(accounts::Column::Balance, Expr::value(balance))
        .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
        .filter(accounts::Column::Id.eq(account.id))
        .exec(conn)
        .await
        .map_err(db_err)?;
    account_balances::Entity::update_many()
        .col_expr(account_balances::Column::Balance, Expr::value(balance))
        .col_expr(account_balances::Column::RefreshedAt, Expr::value(now))
        .filter(account_balances::Column::AccountId.eq(account.id))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

async fn project_account<C>(
    conn: &C,
    account_id: Uuid,
    now: DateTimeWithTimeZone,
) -> Result<ProjectedBalance, CoaError>
where
    C: ConnectionTrait,
{
    let account = accounts::Entity::find_by_id(account_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(CoaError::AccountNotFound(account_id))?;
    let account_type = AccountType::from(account.account_type);

    // A parent whose children were all deactivated is postable again and
    // carries its own lines.
    let projected = if !account.is_header {
        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::AccountId.eq(account_id))
            .find_also_related(journal_entries::Entity)
            .all(conn)
            .await
            .map_err(db_err)?;
        BalanceProjector::project(
            account_type,
            lines
                .iter()
                .filter_map(|(line, entry)| entry.as_ref().map(|e| projected_line(line, e))),
        )
    } else {
        let children: Vec<Uuid> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::Id)
            .filter(accounts::Column::ParentId.eq(account_id))
            .filter(accounts::Column::DeletedAt.is_null())
            .into_tuple()
            .all(conn)
            .await
            .map_err(db_err)?;
        let cached = account_balances::Entity::find()
            .filter(account_balances::Column::AccountId.is_in(children))
            .all(conn)
            .await
            .map_err(db_err)?;
        BalanceProjector::rollup(account_type, cached.iter().map(totals_of))
    };

    write_balance(conn, account_id, &projected, now).await?;
    debug!(
        account_id = %account_id,
        code = %account.code,
        balance = %projected.balance,
        "Projected account balance"
    );
    Ok(projected)
}

async fn write_balance<C>(
    conn: &C,
    account_id: Uuid,
    projected: &ProjectedBalance,
    now: DateTimeWithTimeZone,
) -> Result<(), CoaError>
where
    C: ConnectionTrait,
{
    let row = account_balances::ActiveModel {
        account_id: Set(account_id),
        debit_total: Set(projected.totals.debit_total),
        credit_total: Set(projected.totals.credit_total),
        balance: Set(projected.balance),
        refreshed_at: Set(now),
    };
    account_balances::Entity::insert(row)
        .on_conflict(
            OnConflict::column(account_balances::Column::AccountId)
                .update_columns([
                    account_balances::Column::DebitTotal,
                    account_balances::Column::CreditTotal,
                    account_balances::Column::Balance,
                    account_balances::Column::RefreshedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .map_err(db_err)?;

    accounts::Entity::update_many()
        .col_expr(accounts::Column::Balance, Expr::value(projected.balance))
        .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
        .filter(accounts::Column::Id.eq(account_id))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

async fn derive_all<C>(
    conn: &C,
    live: &[accounts::Model],
) -> Result<HashMap<Uuid, ProjectedBalance>, CoaError>
where
    C: ConnectionTrait,
{
    let lines = journal_lines::Entity::find()
        .find_also_related(journal_entries::Entity)
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut by_account: HashMap<Uuid, Vec<ProjectedLine>> = HashMap::new();
    for (line, entry) in &lines {
        if let Some(entry) = entry {
            by_account
                .entry(line.account_id)
                .or_default()
                .push(projected_line(line, entry));
        }
    }

    Ok(derive_balances(live, &by_account))
}

/// Leaf projections rolled up bottom-up by level. Headers roll up their
/// children; every other account projects its own lines.
fn derive_balances(
    live: &[accounts::Model],
    lines: &HashMap<Uuid, Vec<ProjectedLine>>,
) -> HashMap<Uuid, ProjectedBalance> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for account in live {
        if let Some(parent_id) = account.parent_id {
            children.entry(parent_id).or_default().push(account.id);
        }
    }

    let mut ordered: Vec<&accounts::Model> = live.iter().collect();
    ordered.sort_by(|a, b| b.level.cmp(&a.level).then(a.id.cmp(&b.id)));

    let mut derived: HashMap<Uuid, ProjectedBalance> = HashMap::with_capacity(live.len());
    for account in ordered {
        let account_type = AccountType::from(account.account_type);
        let projected = if account.is_header {
            BalanceProjector::rollup(
                account_type,
                children
                    .get(&account.id)
                    .into_iter()
                    .flatten()
                    .filter_map(|k| derived.get(k).map(|p| p.totals)),
            )
        } else {
            BalanceProjector::project(
                account_type,
                lines.get(&account.id).into_iter().flatten().copied(),
            )
        };
        derived.insert(account.id, projected);
    }
    derived
}

fn projected_line(line: &journal_lines::Model, entry: &journal_entries::Model) -> ProjectedLine {
    ProjectedLine {
        debit: line.debit_amount,
        credit: line.credit_amount,
        entry_status: entry.status.into(),
        entry_deleted: entry.deleted_at.is_some(),
    }
}

fn totals_of(row: &account_balances::Model) -> AccountTotals {
    AccountTotals {
        debit_total: row.debit_total,
        credit_total: row.credit_total,
    }
}

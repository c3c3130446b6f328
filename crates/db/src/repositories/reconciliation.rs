//! Reconciliation repository: cash/bank sub-ledgers against the GL.

use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use tally_core::coa::CoaError;
use tally_core::ledger::validation::validate_posting_account;
use tally_core::ledger::LedgerError;
use tally_core::reconciliation::{
    FixSummary, ReconciliationError, ReconciliationService, SubledgerBalance, SyncReport,
};

use super::balance::{lock_accounts, override_balance_in};
use crate::entities::{accounts, cash_bank_accounts};

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Links a new cash/bank account to a GL leaf, 1:1.
    ///
    /// # Errors
    ///
    /// Returns `GlAccountNotFound` or `GlAccountNotPostable` if the GL account
    /// cannot back a sub-ledger.
    pub async fn link_subledger(
        &self,
        code: &str,
        name: &str,
        account_id: Uuid,
    ) -> Result<cash_bank_accounts::Model, ReconciliationError> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ReconciliationError::GlAccountNotFound(account_id))?;

        validate_posting_account(account_id, Some(&account.to_posting_account())).map_err(
            |e| match e {
                LedgerError::InvalidPostingAccount { account_id, reason } => {
                    ReconciliationError::GlAccountNotPostable { account_id, reason }
                }
                other => ReconciliationError::Database(other.to_string()),
            },
        )?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let linked = cash_bank_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(code.trim().to_string()),
            name: Set(name.trim().to_string()),
            account_id: Set(account_id),
            balance: Set(account.balance),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        info!(
            subledger_id = %linked.id,
            code = %linked.code,
            account_id = %account_id,
            "Linked cash/bank account to GL"
        );
        Ok(linked)
    }

    /// Records the sub-ledger's own balance, the side of record.
    ///
    /// # Errors
    ///
    /// Returns `SubledgerNotFound` or a database error.
    pub async fn set_subledger_balance(
        &self,
        subledger_id: Uuid,
        balance: Decimal,
    ) -> Result<cash_bank_accounts::Model, ReconciliationError> {
        let row = cash_bank_accounts::Entity::find_by_id(subledger_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ReconciliationError::SubledgerNotFound(subledger_id))?;

        let mut updated: cash_bank_accounts::ActiveModel = row.into();
        updated.balance = Set(balance);
        updated.updated_at = Set(Utc::now().into());
        updated.update(&self.db).await.map_err(db_err)
    }

    /// Compares every active sub-ledger with its GL account.
    ///
    /// Drift is reported, never raised; use `ensure_in_sync` on the report to
    /// turn it into an error.
    ///
    /// # Errors
    ///
    /// Returns `GlAccountNotFound` for a dangling link, or a database error.
    pub async fn check_sync(&self) -> Result<SyncReport, ReconciliationError> {
        let linked = cash_bank_accounts::Entity::find()
            .filter(cash_bank_accounts::Column::IsActive.eq(true))
            .filter(cash_bank_accounts::Column::DeletedAt.is_null())
            .order_by_asc(cash_bank_accounts::Column::Code)
            .find_also_related(accounts::Entity)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let balances = linked
            .into_iter()
            .map(|(subledger, account)| {
                let account = account.ok_or(ReconciliationError::GlAccountNotFound(subledger.account_id))?;
                Ok(SubledgerBalance {
                    subledger_id: subledger.id,
                    code: subledger.code,
                    gl_account_id: account.id,
                    subledger_balance: subledger.balance,
                    gl_balance: account.balance,
                })
            })
            .collect::<Result<Vec<_>, ReconciliationError>>()?;

        let report = ReconciliationService::check(&balances, Utc::now());
        for drift in &report.drifts {
            warn!(
                account_id = %drift.account_id,
                code = %drift.code,
                expected = %drift.expected,
                actual = %drift.actual,
                delta = %drift.delta,
                "GL balance drifted from sub-ledger"
            );
        }
        info!(
            checked = report.accounts_checked,
            drifted = report.drifts.len(),
            status = ?report.status,
            "Reconciliation check finished"
        );
        Ok(report)
    }

    /// Overwrites drifted GL balances with the sub-ledger values.
    ///
    /// Runs in one transaction. Each GL row is re-read under lock; a row whose
    /// balance moved since the report is skipped as stale.
    ///
    /// # Errors
    ///
    /// Returns a database error; no fix is kept in that case.
    pub async fn auto_fix(&self, report: &SyncReport) -> Result<FixSummary, ReconciliationError> {
        let mut summary = FixSummary::default();
        if report.drifts.is_empty() {
            return Ok(summary);
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let ids: BTreeSet<Uuid> = report.drifts.iter().map(|d| d.account_id).collect();
        let locked = lock_accounts(&txn, &ids).await.map_err(coa_err)?;

        for drift in &report.drifts {
            let current = locked.iter().find(|a| a.id == drift.account_id);
            match current {
                Some(account) if account.balance == drift.actual => {
                    let reason = format!(
                        "auto-fix from sub-ledger {} (delta {})",
                        drift.code, drift.delta
                    );
                    override_balance_in(&txn, account, drift.expected, &reason)
                        .await
                        .map_err(coa_err)?;
                    summary.fixed.push(drift.account_id);
                }
                _ => {
                    warn!(
                        account_id = %drift.account_id,
                        code = %drift.code,
                        "Skipping stale drift, GL balance changed since the check"
                    );
                    summary.stale.push(drift.account_id);
                }
            }
        }

        txn.commit().await.map_err(db_err)?;

        info!(
            fixed = summary.fixed.len(),
            stale = summary.stale.len(),
            "Auto-fix finished"
        );
        Ok(summary)
    }
}

fn db_err(e: DbErr) -> ReconciliationError {
    ReconciliationError::Database(e.to_string())
}

fn coa_err(e: CoaError) -> ReconciliationError {
    ReconciliationError::Database(e.to_string())
}

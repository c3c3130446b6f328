//! Account repository for chart of accounts database operations.
//!
//! `is_header` is never set by callers: it follows the tree and is updated in
//! the same transaction that adds or retires a child.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use tally_core::coa::{AccountType as CoreAccountType, CoaError, CoaService, NewAccount};

use crate::entities::{accounts, sea_orm_active_enums::AccountType};

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Filter by account type.
    pub account_type: Option<CoreAccountType>,
    /// Filter by active status.
    pub is_active: Option<bool>,
    /// Filter by parent ID (None = root accounts only).
    pub parent_id: Option<Option<Uuid>>,
}

/// An account and its children, ordered by code.
#[derive(Debug, Clone)]
pub struct AccountTreeNode {
    /// The account record.
    pub account: accounts::Model,
    /// Direct children.
    pub children: Vec<AccountTreeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retirement {
    Deactivate,
    SoftDelete,
}

/// Account repository for chart of accounts operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account under an optional parent.
    ///
    /// The parent becomes a header in the same transaction. A parent that
    /// still carries a balance cannot take children.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Code or name is blank, or the code is used by a live account
    /// - Parent is missing, inactive, of another type, or has a balance
    pub async fn create_account(&self, input: NewAccount) -> Result<accounts::Model, CoaError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let parent = match input.parent_id {
            Some(parent_id) => accounts::Entity::find_by_id(parent_id)
                .filter(accounts::Column::DeletedAt.is_null())
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err)?,
            None => None,
        };

        let code = input.code.trim().to_string();
        let code_taken = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code.as_str()))
            .filter(accounts::Column::DeletedAt.is_null())
            .count(&txn)
            .await
            .map_err(db_err)?
            > 0;

        let parent_node = parent.as_ref().map(accounts::Model::to_node);
        let level = CoaService::validate_new_account(&input, parent_node.as_ref(), |_| code_taken)?;

        if let Some(parent) = &parent
            && !parent.is_header
            && !parent.balance.is_zero()
        {
            return Err(CoaError::NonZeroBalance {
                account_id: parent.id,
                balance: parent.balance,
            });
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(code.clone()),
            name: Set(input.name.trim().to_string()),
            account_type: Set(input.category.account_type().into()),
            category: Set(input.category.into()),
            parent_id: Set(input.parent_id),
            level: Set(level),
            is_header: Set(false),
            is_active: Set(true),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                CoaError::DuplicateCode(code.clone())
            } else {
                db_err(e)
            }
        })?;

        if let Some(parent) = parent
            && !parent.is_header
        {
            let mut header: accounts::ActiveModel = parent.into();
            header.is_header = Set(true);
            header.updated_at = Set(now);
            header.update(&txn).await.map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        info!(
            account_id = %account.id,
            code = %account.code,
            level = account.level,
            "Created account"
        );
        Ok(account)
    }

    /// Deactivates an account with no balance and no active children.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `HasActiveChildren` or `NonZeroBalance`.
    pub async fn deactivate_account(&self, account_id: Uuid) -> Result<accounts::Model, CoaError> {
        self.retire(account_id, Retirement::Deactivate).await
    }

    /// Soft-deletes an account with no balance and no active children.
    ///
    /// Its code becomes free for reuse.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `HasActiveChildren` or `NonZeroBalance`.
    pub async fn soft_delete_account(&self, account_id: Uuid) -> Result<accounts::Model, CoaError> {
        self.retire(account_id, Retirement::SoftDelete).await
    }

    async fn retire(&self, account_id: Uuid, how: Retirement) -> Result<accounts::Model, CoaError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let account = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CoaError::AccountNotFound(account_id))?;

        let active_children = count_active_children(&txn, account_id).await?;
        CoaService::validate_retirement(&account.to_node(), account.balance, active_children)?;

        let parent_id = account.parent_id;
        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut retired: accounts::ActiveModel = account.into();
        retired.is_active = Set(false);
        if how == Retirement::SoftDelete {
            retired.deleted_at = Set(Some(now));
        }
        retired.updated_at = Set(now);
        let retired = retired.update(&txn).await.map_err(db_err)?;

        if let Some(parent_id) = parent_id {
            sync_header_flag(&txn, parent_id, now).await?;
        }

        txn.commit().await.map_err(db_err)?;

        info!(
            account_id = %retired.id,
            code = %retired.code,
            deleted = how == Retirement::SoftDelete,
            "Retired account"
        );
        Ok(retired)
    }

    /// Finds a live account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_account_by_id(&self, id: Uuid) -> Result<Option<accounts::Model>, CoaError> {
        accounts::Entity::find_by_id(id)
            .filter(accounts::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a live account by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<accounts::Model>, CoaError> {
        accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .filter(accounts::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists live accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<accounts::Model>, CoaError> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Code);

        if let Some(account_type) = filter.account_type {
            query = query.filter(accounts::Column::AccountType.eq(AccountType::from(account_type)));
        }

        if let Some(is_active) = filter.is_active {
            query = query.filter(accounts::Column::IsActive.eq(is_active));
        }

        if let Some(parent_id) = filter.parent_id {
            query = match parent_id {
                Some(pid) => query.filter(accounts::Column::ParentId.eq(pid)),
                None => query.filter(accounts::Column::ParentId.is_null()),
            };
        }

        query.all(&self.db).await.map_err(db_err)
    }

    /// Builds the live account tree, roots and children ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn account_tree(&self) -> Result<Vec<AccountTreeNode>, CoaError> {
        let live = self.list_accounts(AccountFilter::default()).await?;
        Ok(build_tree(live))
    }

    /// Lists accounts whose `is_header` flag disagrees with their children.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn verify_header_flags(&self) -> Result<Vec<Uuid>, CoaError> {
        let live = self.list_accounts(AccountFilter::default()).await?;
        let nodes: Vec<_> = live.iter().map(accounts::Model::to_node).collect();
        Ok(CoaService::header_mismatches(&nodes))
    }
}

fn db_err(e: DbErr) -> CoaError {
    CoaError::Database(e.to_string())
}

async fn count_active_children<C>(conn: &C, account_id: Uuid) -> Result<usize, CoaError>
where
    C: ConnectionTrait,
{
    let count = accounts::Entity::find()
        .filter(accounts::Column::ParentId.eq(account_id))
        .filter(accounts::Column::IsActive.eq(true))
        .filter(accounts::Column::DeletedAt.is_null())
        .count(conn)
        .await
        .map_err(db_err)?;
    Ok(usize::try_from(count).unwrap_or(usize::MAX))
}

/// Sets `is_header` to "has at least one active child".
async fn sync_header_flag<C>(
    conn: &C,
    account_id: Uuid,
    now: DateTimeWithTimeZone,
) -> Result<(), CoaError>
where
    C: ConnectionTrait,
{
    let Some(parent) = accounts::Entity::find_by_id(account_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
    else {
        return Ok(());
    };

    let is_header = count_active_children(conn, account_id).await? > 0;
    if parent.is_header != is_header {
        let mut updated: accounts::ActiveModel = parent.into();
        updated.is_header = Set(is_header);
        updated.updated_at = Set(now);
        updated.update(conn).await.map_err(db_err)?;
    }
    Ok(())
}

fn build_tree(live: Vec<accounts::Model>) -> Vec<AccountTreeNode> {
    let ids: HashSet<Uuid> = live.iter().map(|a| a.id).collect();
    let mut by_parent: HashMap<Option<Uuid>, Vec<accounts::Model>> = HashMap::new();
    for account in live {
        let key = account.parent_id.filter(|p| ids.contains(p));
        by_parent.entry(key).or_default().push(account);
    }
    attach_children(None, &mut by_parent)
}

fn attach_children(
    parent: Option<Uuid>,
    by_parent: &mut HashMap<Option<Uuid>, Vec<accounts::Model>>,
) -> Vec<AccountTreeNode> {
    let mut siblings = by_parent.remove(&parent).unwrap_or_default();
    siblings.sort_by(|a, b| a.code.cmp(&b.code));
    siblings
        .into_iter()
        .map(|account| {
            let children = attach_children(Some(account.id), by_parent);
            AccountTreeNode { account, children }
        })
        .collect()
}

//! Initial schema: chart of accounts, unified ledger, balance cache,
//! approval workflows and the cash/bank sub-ledger.
//!
//! Tables are derived from the entities so the same migration runs on
//! Postgres and on the SQLite database used by the integration tests.
//! Partial and composite unique indexes are plain SQL understood by both.

use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entities::{
    account_balances, accounts, approval_actions, approval_history, approval_requests,
    approval_steps, approval_workflows, cash_bank_accounts, journal_entries, journal_lines,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(accounts::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(journal_entries::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(journal_lines::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(account_balances::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(approval_workflows::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(approval_steps::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(approval_requests::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(approval_actions::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(approval_history::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(cash_bank_accounts::Entity))
            .await?;

        let db = manager.get_connection();
        for sql in INDEXES_SQL {
            db.execute_unprepared(sql).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, cash_bank_accounts::Entity).await?;
        drop_table(manager, approval_history::Entity).await?;
        drop_table(manager, approval_actions::Entity).await?;
        drop_table(manager, approval_requests::Entity).await?;
        drop_table(manager, approval_steps::Entity).await?;
        drop_table(manager, approval_workflows::Entity).await?;
        drop_table(manager, account_balances::Entity).await?;
        drop_table(manager, journal_lines::Entity).await?;
        drop_table(manager, journal_entries::Entity).await?;
        drop_table(manager, accounts::Entity).await
    }
}

async fn drop_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}

const INDEXES_SQL: [&str; 8] = [
    // Codes are unique among live accounts only; soft-deleted codes may be reused.
    "CREATE UNIQUE INDEX ux_accounts_live_code ON accounts (code) WHERE deleted_at IS NULL",
    "CREATE INDEX ix_accounts_parent ON accounts (parent_id)",
    "CREATE UNIQUE INDEX ux_journal_lines_entry_line ON unified_journal_lines (entry_id, line_number)",
    "CREATE INDEX ix_journal_lines_account ON unified_journal_lines (account_id)",
    "CREATE INDEX ix_journal_source ON unified_journal_ledger (source_type, source_id)",
    "CREATE UNIQUE INDEX ux_approval_steps_order ON approval_steps (workflow_id, step_order)",
    "CREATE UNIQUE INDEX ux_approval_actions_order ON approval_actions (request_id, step_order)",
    // One pending request per document.
    "CREATE UNIQUE INDEX ux_approval_requests_pending ON approval_requests (entity_type, entity_id) WHERE status = 'PENDING'",
];

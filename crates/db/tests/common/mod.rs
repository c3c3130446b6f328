//! Shared fixtures for the database integration tests.
//!
//! Each test gets its own in-memory SQLite database with the full schema
//! migrated. A single pooled connection keeps the database alive and
//! serializes concurrent callers.

#![allow(dead_code, clippy::missing_panics_doc)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use tally_core::approval::{ApprovalModule, ApproverRole};
use tally_core::coa::{AccountCategory, NewAccount};
use tally_core::ledger::{PostingLine, PostingRequest, SourceType};
use tally_db::migration::Migrator;
use tally_db::repositories::StepInput;
use tally_db::{AccountRepository, CreateWorkflowInput};

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// A small trading-company chart.
#[derive(Debug, Clone, Copy)]
pub struct Chart {
    pub assets: Uuid,
    pub cash_and_bank: Uuid,
    pub bank_bca: Uuid,
    pub inventory: Uuid,
    pub vat_in: Uuid,
    pub liabilities: Uuid,
    pub payables: Uuid,
    pub equity: Uuid,
    pub capital: Uuid,
    pub revenue: Uuid,
    pub sales: Uuid,
}

pub async fn create(
    repo: &AccountRepository,
    code: &str,
    name: &str,
    category: AccountCategory,
    parent_id: Option<Uuid>,
) -> Uuid {
    repo.create_account(NewAccount {
        code: code.to_string(),
        name: name.to_string(),
        category,
        parent_id,
    })
    .await
    .unwrap_or_else(|e| panic!("Failed to create account {code}: {e}"))
    .id
}

pub async fn seed_chart(db: &DatabaseConnection) -> Chart {
    use AccountCategory::{CurrentAsset, CurrentLiability, Equity, OperatingRevenue};

    let repo = AccountRepository::new(db.clone());

    let assets = create(&repo, "1000", "Assets", CurrentAsset, None).await;
    let cash_and_bank = create(&repo, "1100", "Cash and Bank", CurrentAsset, Some(assets)).await;
    let bank_bca = create(&repo, "1101", "Bank BCA", CurrentAsset, Some(cash_and_bank)).await;
    let inventory = create(&repo, "1300", "Inventory", CurrentAsset, Some(assets)).await;
    let vat_in = create(&repo, "1400", "VAT In", CurrentAsset, Some(assets)).await;

    let liabilities = create(&repo, "2000", "Liabilities", CurrentLiability, None).await;
    let payables = create(
        &repo,
        "2100",
        "Accounts Payable",
        CurrentLiability,
        Some(liabilities),
    )
    .await;

    let equity = create(&repo, "3000", "Equity", Equity, None).await;
    let capital = create(&repo, "3100", "Paid-in Capital", Equity, Some(equity)).await;

    let revenue = create(&repo, "4000", "Revenue", OperatingRevenue, None).await;
    let sales = create(&repo, "4100", "Sales", OperatingRevenue, Some(revenue)).await;

    Chart {
        assets,
        cash_and_bank,
        bank_bca,
        inventory,
        vat_in,
        liabilities,
        payables,
        equity,
        capital,
        revenue,
        sales,
    }
}

pub fn entry_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

/// Purchase on credit: 5,000,000 inventory plus 11% VAT.
pub fn purchase(chart: &Chart, source_id: Uuid) -> PostingRequest {
    PostingRequest {
        source_type: SourceType::Purchase,
        source_id,
        entry_date: entry_date(),
        description: "Purchase invoice PI-0001".to_string(),
        lines: vec![
            PostingLine::debit(chart.inventory, dec!(5000000)),
            PostingLine::debit(chart.vat_in, dec!(550000)),
            PostingLine::credit(chart.payables, dec!(5550000)),
        ],
        created_by: None,
    }
}

/// Owner puts cash into the bank.
pub fn capital_injection(chart: &Chart, source_id: Uuid, amount: Decimal) -> PostingRequest {
    PostingRequest {
        source_type: SourceType::Manual,
        source_id,
        entry_date: entry_date(),
        description: "Capital injection".to_string(),
        lines: vec![
            PostingLine::debit(chart.bank_bca, amount),
            PostingLine::credit(chart.capital, amount),
        ],
        created_by: None,
    }
}

pub fn step(step_order: i32, approver_role: ApproverRole, is_optional: bool) -> StepInput {
    StepInput {
        step_order,
        name: format!("{approver_role} approval"),
        approver_role,
        is_optional,
        time_limit_hours: 24,
    }
}

/// Purchase tiers: up to 5,000,000 needs finance only; above that finance
/// then director, with an optional admin step for escalation.
pub fn purchase_tiers() -> Vec<CreateWorkflowInput> {
    vec![
        CreateWorkflowInput {
            name: "Purchase - small".to_string(),
            module: ApprovalModule::Purchase,
            min_amount: dec!(0),
            max_amount: dec!(5000000),
            is_active: true,
            steps: vec![step(1, ApproverRole::Finance, false)],
        },
        CreateWorkflowInput {
            name: "Purchase - large".to_string(),
            module: ApprovalModule::Purchase,
            min_amount: dec!(5000001),
            max_amount: dec!(0),
            is_active: true,
            steps: vec![
                step(1, ApproverRole::Finance, false),
                step(2, ApproverRole::Admin, true),
                step(3, ApproverRole::Director, false),
            ],
        },
    ]
}

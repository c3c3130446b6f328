//! Database seeder for Tally development and testing.
//!
//! Seeds a default chart of accounts, tiered approval workflows for purchases
//! and sales, and a cash sub-ledger linked to the cash GL account. Running it
//! twice is harmless: existing rows are skipped.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use tally_core::approval::{ApprovalModule, ApproverRole};
use tally_core::coa::{AccountCategory, NewAccount};
use tally_db::entities::cash_bank_accounts;
use tally_db::repositories::StepInput;
use tally_db::{AccountRepository, ApprovalRepository, CreateWorkflowInput, ReconciliationRepository};

/// (code, name, category, parent code)
const CHART: &[(&str, &str, AccountCategory, Option<&str>)] = &[
    ("1000", "Assets", AccountCategory::CurrentAsset, None),
    ("1100", "Current Assets", AccountCategory::CurrentAsset, Some("1000")),
    ("1101", "Cash", AccountCategory::CurrentAsset, Some("1100")),
    ("1102", "Bank", AccountCategory::CurrentAsset, Some("1100")),
    ("1201", "Accounts Receivable", AccountCategory::CurrentAsset, Some("1100")),
    ("1240", "VAT In", AccountCategory::CurrentAsset, Some("1100")),
    ("1301", "Merchandise Inventory", AccountCategory::CurrentAsset, Some("1100")),
    ("1500", "Fixed Assets", AccountCategory::FixedAsset, Some("1000")),
    ("1501", "Office Equipment", AccountCategory::FixedAsset, Some("1500")),
    ("1502", "Vehicles", AccountCategory::FixedAsset, Some("1500")),
    ("2000", "Liabilities", AccountCategory::CurrentLiability, None),
    ("2100", "Current Liabilities", AccountCategory::CurrentLiability, Some("2000")),
    ("2101", "Accounts Payable", AccountCategory::CurrentLiability, Some("2100")),
    ("2103", "VAT Out", AccountCategory::CurrentLiability, Some("2100")),
    ("2104", "Withholding Tax Payable", AccountCategory::CurrentLiability, Some("2100")),
    ("3000", "Equity", AccountCategory::Equity, None),
    ("3101", "Owner's Capital", AccountCategory::Equity, Some("3000")),
    ("3201", "Retained Earnings", AccountCategory::Equity, Some("3000")),
    ("4000", "Revenue", AccountCategory::OperatingRevenue, None),
    ("4101", "Sales Revenue", AccountCategory::OperatingRevenue, Some("4000")),
    ("4102", "Service Revenue", AccountCategory::OperatingRevenue, Some("4000")),
    ("4201", "Other Income", AccountCategory::OtherRevenue, Some("4000")),
    ("5000", "Expenses", AccountCategory::OperatingExpense, None),
    ("5101", "Cost of Goods Sold", AccountCategory::OperatingExpense, Some("5000")),
    ("5201", "Salaries Expense", AccountCategory::OperatingExpense, Some("5000")),
    ("5202", "Electricity Expense", AccountCategory::OperatingExpense, Some("5000")),
    ("5900", "General Expense", AccountCategory::OperatingExpense, Some("5000")),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = tally_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding chart of accounts...");
    seed_chart(&db).await?;

    println!("Seeding approval workflows...");
    seed_workflows(&db, ApprovalModule::Purchase, "PO").await?;
    seed_workflows(&db, ApprovalModule::Sales, "SO").await?;

    println!("Seeding cash/bank sub-ledger...");
    seed_cash_account(&db).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_chart(db: &DatabaseConnection) -> anyhow::Result<()> {
    let repo = AccountRepository::new(db.clone());
    let mut inserted = 0;

    for &(code, name, category, parent_code) in CHART {
        if repo.find_by_code(code).await?.is_some() {
            continue;
        }

        let parent_id = match parent_code {
            Some(parent_code) => Some(
                repo.find_by_code(parent_code)
                    .await?
                    .with_context(|| format!("Parent {parent_code} of {code} is missing"))?
                    .id,
            ),
            None => None,
        };

        repo.create_account(NewAccount {
            code: code.to_string(),
            name: name.to_string(),
            category,
            parent_id,
        })
        .await
        .with_context(|| format!("Failed to create account {code}"))?;
        inserted += 1;
    }

    println!("  Inserted {inserted} accounts");
    Ok(())
}

fn step(step_order: i32, name: &str, approver_role: ApproverRole, is_optional: bool) -> StepInput {
    StepInput {
        step_order,
        name: name.to_string(),
        approver_role,
        is_optional,
        time_limit_hours: 24,
    }
}

/// Three tiers: up to 25M finance only, up to 100M finance then director,
/// above that finance then director with an optional admin sign-off.
async fn seed_workflows(
    db: &DatabaseConnection,
    module: ApprovalModule,
    label: &str,
) -> anyhow::Result<()> {
    let repo = ApprovalRepository::new(db.clone());
    if !repo.list_workflows(Some(module)).await?.is_empty() {
        println!("  {module} workflows already exist, skipping...");
        return Ok(());
    }

    let tiers: [(String, Decimal, Decimal, Vec<StepInput>); 3] = [
        (
            format!("{label} <= 25M"),
            dec!(0),
            dec!(25000000),
            vec![step(1, "Finance Approval", ApproverRole::Finance, false)],
        ),
        (
            format!("{label} > 25M - 100M"),
            dec!(25000000.01),
            dec!(100000000),
            vec![
                step(1, "Finance Approval", ApproverRole::Finance, false),
                step(2, "Director Approval", ApproverRole::Director, false),
            ],
        ),
        (
            format!("{label} > 100M"),
            dec!(100000000.01),
            Decimal::ZERO,
            vec![
                step(1, "Finance Approval", ApproverRole::Finance, false),
                step(2, "Director Approval", ApproverRole::Director, false),
                step(3, "Admin Sign-off", ApproverRole::Admin, true),
            ],
        ),
    ];

    for (name, min_amount, max_amount, steps) in tiers {
        repo.create_workflow(CreateWorkflowInput {
            name: name.clone(),
            module,
            min_amount,
            max_amount,
            is_active: true,
            steps,
        })
        .await
        .with_context(|| format!("Failed to create workflow {name}"))?;
    }

    println!("  Created 3 {module} workflows");
    Ok(())
}

async fn seed_cash_account(db: &DatabaseConnection) -> anyhow::Result<()> {
    const CODE: &str = "CSH-001";

    let exists = cash_bank_accounts::Entity::find()
        .filter(cash_bank_accounts::Column::Code.eq(CODE))
        .one(db)
        .await?
        .is_some();
    if exists {
        println!("  Cash account {CODE} already exists, skipping...");
        return Ok(());
    }

    let cash = AccountRepository::new(db.clone())
        .find_by_code("1101")
        .await?
        .context("Cash GL account 1101 is missing")?;
    ReconciliationRepository::new(db.clone())
        .link_subledger(CODE, "Petty Cash", cash.id)
        .await?;

    println!("  Linked {CODE} to GL account 1101");
    Ok(())
}

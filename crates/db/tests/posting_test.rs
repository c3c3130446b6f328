//! Posting orchestrator and balance projector integration tests.
//!
//! Run with: `cargo test -p tally-db --test posting_test`

#![allow(clippy::similar_names)]

mod common;

use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use tally_core::coa::{AccountCategory, AccountType};
use tally_core::ledger::{
    EntryStatus, InvalidAccountReason, LedgerError, PostingLine, PostingRequest, SourceType,
};
use tally_db::entities::{account_balances, journal_entries, journal_lines, sea_orm_active_enums as db};
use tally_db::{AccountRepository, BalanceRepository, LedgerRepository, PostOutcome};

use common::{Chart, capital_injection, create, entry_date, purchase, seed_chart, setup_db};

async fn balance_of(accounts: &AccountRepository, id: Uuid) -> rust_decimal::Decimal {
    accounts
        .find_account_by_id(id)
        .await
        .expect("Failed to load account")
        .expect("Account exists")
        .balance
}

async fn entry_count(db: &sea_orm::DatabaseConnection) -> (u64, u64) {
    let entries = journal_entries::Entity::find().count(db).await.unwrap();
    let lines = journal_lines::Entity::find().count(db).await.unwrap();
    (entries, lines)
}

fn two_line(chart: &Chart, debit_account: Uuid, amount: rust_decimal::Decimal) -> PostingRequest {
    PostingRequest {
        source_type: SourceType::Manual,
        source_id: Uuid::now_v7(),
        entry_date: entry_date(),
        description: "Manual journal".to_string(),
        lines: vec![
            PostingLine::debit(debit_account, amount),
            PostingLine::credit(chart.capital, amount),
        ],
        created_by: None,
    }
}

#[tokio::test]
async fn test_purchase_posting_updates_balances() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let source_id = Uuid::now_v7();

    let outcome = ledger
        .post_for_approval(&purchase(&chart, source_id))
        .await
        .expect("Failed to post purchase");

    assert!(outcome.is_fresh());
    let posted = outcome.into_entry();
    assert_eq!(posted.entry.status, db::EntryStatus::Posted);
    assert_eq!(posted.entry.total_debit, dec!(5550000));
    assert_eq!(posted.entry.total_credit, dec!(5550000));
    assert_eq!(posted.entry.source_id, source_id);
    assert!(posted.entry.entry_number.starts_with("PUR-20261019-"));
    assert_eq!(posted.lines.len(), 3);
    let numbers: Vec<_> = posted.lines.iter().map(|l| l.line_number).collect();
    assert_eq!(numbers, [1, 2, 3]);

    assert_eq!(balance_of(&accounts, chart.inventory).await, dec!(5000000));
    assert_eq!(balance_of(&accounts, chart.vat_in).await, dec!(550000));
    assert_eq!(balance_of(&accounts, chart.payables).await, dec!(5550000));

    // Headers roll up their children.
    assert_eq!(balance_of(&accounts, chart.assets).await, dec!(5550000));
    assert_eq!(balance_of(&accounts, chart.liabilities).await, dec!(5550000));
    assert_eq!(balance_of(&accounts, chart.cash_and_bank).await, dec!(0));

    let cached = account_balances::Entity::find_by_id(chart.inventory)
        .one(&db)
        .await
        .unwrap()
        .expect("Balance row written");
    assert_eq!(cached.debit_total, dec!(5000000));
    assert_eq!(cached.credit_total, dec!(0));
    assert_eq!(cached.balance, dec!(5000000));
}

#[tokio::test]
async fn test_unbalanced_entry_writes_nothing() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());

    let request = PostingRequest {
        lines: vec![
            PostingLine::debit(chart.inventory, dec!(100)),
            PostingLine::credit(chart.payables, dec!(90)),
        ],
        ..purchase(&chart, Uuid::now_v7())
    };

    let result = ledger.post_for_approval(&request).await;

    assert!(matches!(
        result,
        Err(LedgerError::UnbalancedEntry { total_debit, total_credit })
            if total_debit == dec!(100) && total_credit == dec!(90)
    ));
    assert_eq!(entry_count(&db).await, (0, 0));
    assert_eq!(balance_of(&accounts, chart.inventory).await, dec!(0));
}

#[tokio::test]
async fn test_header_account_rejected() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());

    let result = ledger
        .post_for_approval(&two_line(&chart, chart.cash_and_bank, dec!(1000)))
        .await;

    assert!(matches!(
        result,
        Err(LedgerError::InvalidPostingAccount {
            account_id,
            reason: InvalidAccountReason::Header,
        }) if account_id == chart.cash_and_bank
    ));
    assert_eq!(entry_count(&db).await, (0, 0));
}

#[tokio::test]
async fn test_inactive_and_unknown_accounts_rejected() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());

    accounts.deactivate_account(chart.sales).await.unwrap();
    let inactive = ledger
        .post_for_approval(&two_line(&chart, chart.sales, dec!(1000)))
        .await;
    assert!(matches!(
        inactive,
        Err(LedgerError::InvalidPostingAccount {
            reason: InvalidAccountReason::Inactive,
            ..
        })
    ));

    let missing = Uuid::now_v7();
    let unknown = ledger
        .post_for_approval(&two_line(&chart, missing, dec!(1000)))
        .await;
    assert!(matches!(
        unknown,
        Err(LedgerError::InvalidPostingAccount {
            account_id,
            reason: InvalidAccountReason::NotFound,
        }) if account_id == missing
    ));
    assert_eq!(entry_count(&db).await, (0, 0));
}

#[tokio::test]
async fn test_parent_of_deactivated_child_projects_own_lines() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let balances = BalanceRepository::new(db.clone());

    let prepaid = create(
        &accounts,
        "1500",
        "Prepaid Expenses",
        AccountCategory::CurrentAsset,
        Some(chart.assets),
    )
    .await;
    let rent = create(
        &accounts,
        "1501",
        "Prepaid Rent",
        AccountCategory::CurrentAsset,
        Some(prepaid),
    )
    .await;
    accounts.deactivate_account(rent).await.unwrap();
    let reopened = accounts.find_account_by_id(prepaid).await.unwrap().unwrap();
    assert!(!reopened.is_header);

    ledger
        .post_fresh(&two_line(&chart, prepaid, dec!(100)))
        .await
        .expect("Failed to post to reopened leaf");

    assert_eq!(balance_of(&accounts, prepaid).await, dec!(100));
    assert_eq!(balance_of(&accounts, chart.assets).await, dec!(100));
    assert_eq!(balance_of(&accounts, chart.capital).await, dec!(100));

    balances.refresh_all().await.unwrap();
    assert_eq!(balance_of(&accounts, prepaid).await, dec!(100));
    assert_eq!(balances.recompute(prepaid).await.unwrap().balance, dec!(100));
    assert!(balances.cache_drift().await.unwrap().is_empty());

    let trial = balances.trial_balance().await.unwrap();
    assert_eq!(trial.total(AccountType::Asset), dec!(100));
    assert_eq!(trial.total(AccountType::Equity), dec!(100));
    assert!(trial.is_balanced());
}

#[tokio::test]
async fn test_replay_returns_existing_entry() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let request = purchase(&chart, Uuid::now_v7());

    let first = ledger.post_for_approval(&request).await.unwrap();
    let second = ledger.post_for_approval(&request).await.unwrap();

    assert!(first.is_fresh());
    assert!(matches!(second, PostOutcome::AlreadyPosted(_)));
    assert_eq!(first.entry().entry.id, second.entry().entry.id);
    assert_eq!(entry_count(&db).await, (1, 3));
    assert_eq!(balance_of(&accounts, chart.payables).await, dec!(5550000));

    let fresh = ledger.post_fresh(&request).await;
    assert!(matches!(
        fresh,
        Err(LedgerError::AlreadyPosted { entry_id, source_type: SourceType::Purchase, .. })
            if entry_id == first.entry().entry.id
    ));
}

#[tokio::test]
async fn test_concurrent_postings_of_one_document_write_once() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let request = purchase(&chart, Uuid::now_v7());

    let results = join_all((0..5).map(|_| {
        let ledger = ledger.clone();
        let request = request.clone();
        async move { ledger.post_for_approval(&request).await }
    }))
    .await;

    let outcomes: Vec<PostOutcome> = results
        .into_iter()
        .map(|r| r.expect("Posting failed"))
        .collect();
    let fresh = outcomes.iter().filter(|o| o.is_fresh()).count();
    assert_eq!(fresh, 1);

    let ids: std::collections::HashSet<Uuid> =
        outcomes.iter().map(|o| o.entry().entry.id).collect();
    assert_eq!(ids.len(), 1);

    assert_eq!(entry_count(&db).await, (1, 3));
    assert_eq!(balance_of(&accounts, chart.inventory).await, dec!(5000000));
    assert!(ledger.detect_duplicate_postings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reversal_nets_to_zero_and_frees_document() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());
    let source_id = Uuid::now_v7();
    let approver = Uuid::now_v7();

    let original = ledger.post_fresh(&purchase(&chart, source_id)).await.unwrap();
    let reversal = ledger
        .reverse(original.entry.id, Some("Wrong supplier"), Some(approver))
        .await
        .expect("Failed to reverse");

    assert_eq!(reversal.entry.source_type, db::SourceType::Reversal);
    assert_eq!(reversal.entry.reversed_from, Some(original.entry.id));
    assert_eq!(reversal.entry.created_by, Some(approver));
    assert!(reversal.entry.entry_number.starts_with("REV-"));
    assert_eq!(reversal.lines.len(), 3);
    let payable_line = reversal
        .lines
        .iter()
        .find(|l| l.account_id == chart.payables)
        .unwrap();
    assert_eq!(payable_line.debit_amount, dec!(5550000));
    assert_eq!(payable_line.credit_amount, dec!(0));

    let reloaded = ledger.entry_with_lines(original.entry.id).await.unwrap();
    assert_eq!(EntryStatus::from(reloaded.entry.status), EntryStatus::Reversed);
    assert_eq!(reloaded.entry.reversed_by, Some(reversal.entry.id));
    assert!(reloaded.entry.posting_key.is_none());

    for id in [chart.inventory, chart.vat_in, chart.payables, chart.assets] {
        assert_eq!(balance_of(&accounts, id).await, dec!(0));
    }

    assert!(
        ledger
            .find_live_posting(SourceType::Purchase, source_id)
            .await
            .unwrap()
            .is_none()
    );
    let reposted = ledger.post_fresh(&purchase(&chart, source_id)).await.unwrap();
    assert_ne!(reposted.entry.id, original.entry.id);
    assert_eq!(balance_of(&accounts, chart.payables).await, dec!(5550000));

    let history = ledger
        .find_by_source(SourceType::Purchase, source_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(ledger.detect_duplicate_postings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reversal_cannot_be_repeated_or_reversed() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());

    let original = ledger
        .post_fresh(&capital_injection(&chart, Uuid::now_v7(), dec!(750000)))
        .await
        .unwrap();
    let reversal = ledger.reverse(original.entry.id, None, None).await.unwrap();

    let again = ledger.reverse(original.entry.id, None, None).await;
    assert!(matches!(
        again,
        Err(LedgerError::NotReversible { status: EntryStatus::Reversed, .. })
    ));

    let of_reversal = ledger.reverse(reversal.entry.id, None, None).await;
    assert!(matches!(of_reversal, Err(LedgerError::ReversalOfReversal(id)) if id == reversal.entry.id));

    let missing = Uuid::now_v7();
    let unknown = ledger.reverse(missing, None, None).await;
    assert!(matches!(unknown, Err(LedgerError::EntryNotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_projection_matches_ledger_after_refresh() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let balances = BalanceRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());

    ledger
        .post_fresh(&capital_injection(&chart, Uuid::now_v7(), dec!(20000000)))
        .await
        .unwrap();
    ledger.post_fresh(&purchase(&chart, Uuid::now_v7())).await.unwrap();

    assert!(balances.cache_drift().await.unwrap().is_empty());

    balances
        .override_balance(chart.bank_bca, dec!(19990991), "bank statement import")
        .await
        .unwrap();
    let drift = balances.cache_drift().await.unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].account_id, chart.bank_bca);
    assert_eq!(drift[0].cached, dec!(19990991));
    assert_eq!(drift[0].derived, dec!(20000000));

    let written = balances.refresh_all().await.unwrap();
    assert_eq!(written, 11);
    assert!(balances.cache_drift().await.unwrap().is_empty());
    assert_eq!(balance_of(&accounts, chart.bank_bca).await, dec!(20000000));
    assert_eq!(balance_of(&accounts, chart.assets).await, dec!(25550000));

    let recomputed = balances.recompute(chart.capital).await.unwrap();
    assert_eq!(recomputed.balance, dec!(20000000));
    assert_eq!(recomputed.totals.credit_total, dec!(20000000));
}

#[tokio::test]
async fn test_trial_balance_holds_after_postings() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    let balances = BalanceRepository::new(db.clone());

    ledger
        .post_fresh(&capital_injection(&chart, Uuid::now_v7(), dec!(10000000)))
        .await
        .unwrap();
    ledger.post_fresh(&purchase(&chart, Uuid::now_v7())).await.unwrap();
    ledger
        .post_fresh(&PostingRequest {
            source_type: SourceType::Sale,
            source_id: Uuid::now_v7(),
            entry_date: entry_date(),
            description: "Cash sale".to_string(),
            lines: vec![
                PostingLine::debit(chart.bank_bca, dec!(1200000)),
                PostingLine::credit(chart.sales, dec!(1200000)),
            ],
            created_by: None,
        })
        .await
        .unwrap();

    let trial = balances.trial_balance().await.unwrap();
    assert_eq!(trial.total(AccountType::Asset), dec!(16750000));
    assert_eq!(trial.total(AccountType::Liability), dec!(5550000));
    assert_eq!(trial.total(AccountType::Equity), dec!(10000000));
    assert_eq!(trial.net_income(), dec!(1200000));
    assert!(trial.is_balanced());
}

#[tokio::test]
async fn test_recompute_unknown_account() {
    let db = setup_db().await;
    seed_chart(&db).await;
    let balances = BalanceRepository::new(db);
    let missing = Uuid::now_v7();

    let result = balances.recompute(missing).await;

    assert!(matches!(
        result,
        Err(tally_core::coa::CoaError::AccountNotFound(id)) if id == missing
    ));
}

//! Chart of accounts integration tests.
//!
//! Run with: `cargo test -p tally-db --test coa_test`

mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use tally_core::coa::{AccountCategory, AccountType, CoaError, NewAccount};
use tally_db::repositories::AccountFilter;
use tally_db::{AccountRepository, LedgerRepository};

use common::{capital_injection, create, seed_chart, setup_db};

#[tokio::test]
async fn test_first_child_turns_parent_into_header() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db);

    let assets = create(&repo, "1000", "Assets", AccountCategory::CurrentAsset, None).await;
    let before = repo.find_account_by_id(assets).await.unwrap().unwrap();
    assert!(!before.is_header);
    assert_eq!(before.level, 1);

    let bank = create(&repo, "1101", "Bank BCA", AccountCategory::CurrentAsset, Some(assets)).await;

    let parent = repo.find_account_by_id(assets).await.unwrap().unwrap();
    let child = repo.find_account_by_id(bank).await.unwrap().unwrap();
    assert!(parent.is_header);
    assert!(!child.is_header);
    assert_eq!(child.level, 2);
    assert_eq!(child.parent_id, Some(assets));
    assert!(repo.verify_header_flags().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_live_code_rejected() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    seed_chart(&db).await;

    let result = repo
        .create_account(NewAccount {
            code: " 1101 ".to_string(),
            name: "Another bank".to_string(),
            category: AccountCategory::CurrentAsset,
            parent_id: None,
        })
        .await;

    assert!(matches!(result, Err(CoaError::DuplicateCode(code)) if code == "1101"));
}

#[tokio::test]
async fn test_child_type_must_match_parent() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let chart = seed_chart(&db).await;

    let result = repo
        .create_account(NewAccount {
            code: "1900".to_string(),
            name: "Misplaced expense".to_string(),
            category: AccountCategory::OperatingExpense,
            parent_id: Some(chart.assets),
        })
        .await;

    assert!(matches!(
        result,
        Err(CoaError::ParentTypeMismatch {
            parent: AccountType::Asset,
            child: AccountType::Expense,
        })
    ));
}

#[tokio::test]
async fn test_unknown_parent_rejected() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db);
    let missing = Uuid::now_v7();

    let result = repo
        .create_account(NewAccount {
            code: "1000".to_string(),
            name: "Orphan".to_string(),
            category: AccountCategory::CurrentAsset,
            parent_id: Some(missing),
        })
        .await;

    assert!(matches!(result, Err(CoaError::ParentNotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_leaf_with_balance_cannot_take_children() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let chart = seed_chart(&db).await;

    ledger
        .post_fresh(&capital_injection(&chart, Uuid::now_v7(), dec!(1000000)))
        .await
        .unwrap();

    let result = repo
        .create_account(NewAccount {
            code: "1101.01".to_string(),
            name: "BCA sub-account".to_string(),
            category: AccountCategory::CurrentAsset,
            parent_id: Some(chart.bank_bca),
        })
        .await;

    assert!(matches!(
        result,
        Err(CoaError::NonZeroBalance { account_id, .. }) if account_id == chart.bank_bca
    ));
}

#[tokio::test]
async fn test_retire_requires_zero_balance_and_no_children() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let chart = seed_chart(&db).await;

    let with_children = repo.deactivate_account(chart.cash_and_bank).await;
    assert!(matches!(
        with_children,
        Err(CoaError::HasActiveChildren { count: 1, .. })
    ));

    ledger
        .post_fresh(&capital_injection(&chart, Uuid::now_v7(), dec!(250000)))
        .await
        .unwrap();
    let with_balance = repo.soft_delete_account(chart.bank_bca).await;
    assert!(matches!(with_balance, Err(CoaError::NonZeroBalance { .. })));

    let unchanged = repo.find_account_by_id(chart.bank_bca).await.unwrap().unwrap();
    assert!(unchanged.is_active);
    assert!(unchanged.deleted_at.is_none());
}

#[tokio::test]
async fn test_retiring_last_child_clears_header_flag() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let chart = seed_chart(&db).await;

    let retired = repo.deactivate_account(chart.bank_bca).await.unwrap();
    assert!(!retired.is_active);

    let parent = repo.find_account_by_id(chart.cash_and_bank).await.unwrap().unwrap();
    assert!(!parent.is_header);
    assert!(repo.verify_header_flags().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_soft_deleted_code_can_be_reused() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let chart = seed_chart(&db).await;

    repo.soft_delete_account(chart.sales).await.unwrap();
    assert!(repo.find_by_code("4100").await.unwrap().is_none());
    assert!(repo.find_account_by_id(chart.sales).await.unwrap().is_none());

    let reused = create(
        &repo,
        "4100",
        "Sales - retail",
        AccountCategory::OperatingRevenue,
        Some(chart.revenue),
    )
    .await;

    assert_ne!(reused, chart.sales);
    let found = repo.find_by_code("4100").await.unwrap().unwrap();
    assert_eq!(found.id, reused);
    assert_eq!(found.name, "Sales - retail");
}

#[tokio::test]
async fn test_inactive_parent_rejected() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let chart = seed_chart(&db).await;

    repo.deactivate_account(chart.sales).await.unwrap();

    let result = repo
        .create_account(NewAccount {
            code: "4101".to_string(),
            name: "Export sales".to_string(),
            category: AccountCategory::OperatingRevenue,
            parent_id: Some(chart.sales),
        })
        .await;

    assert!(matches!(result, Err(CoaError::ParentInactive(id)) if id == chart.sales));
}

#[tokio::test]
async fn test_list_and_tree() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let chart = seed_chart(&db).await;

    let roots = repo
        .list_accounts(AccountFilter {
            parent_id: Some(None),
            ..Default::default()
        })
        .await
        .unwrap();
    let codes: Vec<_> = roots.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, ["1000", "2000", "3000", "4000"]);

    let assets = repo
        .list_accounts(AccountFilter {
            account_type: Some(AccountType::Asset),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(assets.len(), 5);

    let tree = repo.account_tree().await.unwrap();
    assert_eq!(tree.len(), 4);
    let asset_root = &tree[0];
    assert_eq!(asset_root.account.id, chart.assets);
    let child_codes: Vec<_> = asset_root
        .children
        .iter()
        .map(|n| n.account.code.as_str())
        .collect();
    assert_eq!(child_codes, ["1100", "1300", "1400"]);
    assert_eq!(asset_root.children[0].children[0].account.id, chart.bank_bca);
}

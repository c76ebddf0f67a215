//! Account registry tests.

mod common;

use common::{BASE, create_account, date, seed_chart, setup_db, simple_voucher};
use mizan_core::accounts::{AccountError, CreateAccountInput, UpdateAccountInput};
use mizan_core::ledger::VoucherStatus;
use mizan_db::{AccountRepository, LedgerRepository};

#[tokio::test]
async fn test_duplicate_code_rejected() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());

    create_account(&repo, "4-1", "Driver Commission Expense", None).await;
    let result = repo
        .create_account(CreateAccountInput {
            code: "4-1".to_string(),
            name: "Another".to_string(),
            parent_id: None,
        })
        .await;
    assert!(matches!(result, Err(AccountError::DuplicateCode(code)) if code == "4-1"));
}

#[tokio::test]
async fn test_tree_reports_leaves() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());

    let expenses = create_account(&repo, "4", "Expenses", None).await;
    let drivers = create_account(&repo, "4-1", "Driver Commission Expense", Some(expenses.id)).await;
    create_account(&repo, "4-2", "Store Commission Expense", Some(expenses.id)).await;

    assert!(!repo.is_leaf(expenses.id).await.unwrap());
    assert!(repo.is_leaf(drivers.id).await.unwrap());

    let tree = repo.tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].account.code, "4");
    assert!(!tree[0].is_leaf);
    let codes: Vec<&str> = tree[0].children.iter().map(|n| n.account.code.as_str()).collect();
    assert_eq!(codes, vec!["4-1", "4-2"]);
}

#[tokio::test]
async fn test_parent_with_lines_cannot_gain_children() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let repo = AccountRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone(), BASE);

    ledger
        .stage_voucher(simple_voucher(date(2026, 1, 5), chart.cash.id, chart.revenue.id, 1_000))
        .await
        .unwrap();

    let result = repo
        .create_account(CreateAccountInput {
            code: "1-1-1".to_string(),
            name: "Petty Cash".to_string(),
            parent_id: Some(chart.cash.id),
        })
        .await;
    assert!(matches!(result, Err(AccountError::InvalidParent { .. })));
}

#[tokio::test]
async fn test_staged_draft_keeps_account_a_postable_leaf() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let repo = AccountRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone(), BASE);

    let draft = ledger
        .stage_voucher(simple_voucher(date(2026, 1, 5), chart.cash.id, chart.revenue.id, 1_000))
        .await
        .unwrap();

    let child = repo
        .create_account(CreateAccountInput {
            code: "3-1-1".to_string(),
            name: "Express Revenue".to_string(),
            parent_id: Some(chart.revenue.id),
        })
        .await;
    assert!(matches!(child, Err(AccountError::InvalidParent { .. })));
    assert!(repo.is_leaf(chart.revenue.id).await.unwrap());

    let posted = ledger.post_voucher(draft.id).await.unwrap();
    assert_eq!(posted.status, VoucherStatus::Posted);
    assert_eq!(repo.account_balance(chart.revenue.id).await.unwrap().credit, 1_000);
}

#[tokio::test]
async fn test_deactivate_leaf_with_balance_rejected() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let repo = AccountRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone(), BASE);

    let v = ledger
        .stage_voucher(simple_voucher(date(2026, 1, 5), chart.cash.id, chart.revenue.id, 7_500))
        .await
        .unwrap();
    ledger.post_voucher(v.id).await.unwrap();

    let result = repo
        .update_account(
            chart.cash.id,
            UpdateAccountInput {
                is_active: Some(false),
                ..UpdateAccountInput::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AccountError::AccountHasBalance { balance: 7_500, .. })
    ));

    let balance = repo.account_balance(chart.cash.id).await.unwrap();
    assert_eq!(balance.debit, 7_500);
    assert_eq!(balance.credit, 0);
}

#[tokio::test]
async fn test_stale_version_rejected() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let account = create_account(&repo, "1-1", "Cash", None).await;

    let renamed = repo
        .update_account(
            account.id,
            UpdateAccountInput {
                name: Some("Cash on Hand".to_string()),
                expected_version: Some(account.version),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.version, account.version + 1);

    let result = repo
        .update_account(
            account.id,
            UpdateAccountInput {
                name: Some("Till".to_string()),
                expected_version: Some(account.version),
                ..UpdateAccountInput::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AccountError::StaleVersion(_))));
}

#[tokio::test]
async fn test_delete_rules() {
    let db = setup_db().await;
    let chart = seed_chart(&db).await;
    let repo = AccountRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone(), BASE);

    ledger
        .stage_voucher(simple_voucher(date(2026, 1, 5), chart.cash.id, chart.revenue.id, 1_000))
        .await
        .unwrap();
    assert!(matches!(
        repo.delete_account(chart.cash.id).await,
        Err(AccountError::AccountInUse(_))
    ));

    let parent = create_account(&repo, "9", "Suspense", None).await;
    let child = create_account(&repo, "9-1", "Suspense A", Some(parent.id)).await;
    assert!(matches!(
        repo.delete_account(parent.id).await,
        Err(AccountError::AccountHasChildren(_))
    ));

    repo.delete_account(child.id).await.unwrap();
    repo.delete_account(parent.id).await.unwrap();
    assert!(matches!(
        repo.get_account(parent.id).await,
        Err(AccountError::AccountNotFound(_))
    ));
}

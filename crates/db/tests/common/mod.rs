//! Shared fixtures for repository integration tests.
//!
//! Every test gets its own in-memory SQLite database with the full schema.

#![allow(dead_code)]

use chrono::{Days, NaiveDate, Utc};
use mizan_core::accounts::{Account, CreateAccountInput};
use mizan_core::commission::{
    Beneficiary, BeneficiaryType, Commission, CommissionRule, CreatePlanInput, TriggerContext,
};
use mizan_core::ledger::{JournalLineInput, StageVoucherInput};
use mizan_db::{AccountRepository, CommissionRepository, Migrator};
use mizan_shared::config::DatabaseConfig;
use mizan_shared::{AccountId, Currency, EntityId};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;

pub const BASE: Currency = Currency::Yer;

/// Fresh migrated database.
pub async fn setup_db() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        run_migrations: true,
    };
    let db = mizan_db::connect(&config).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

/// Accounts most tests post against.
pub struct Chart {
    pub cash: Account,
    pub revenue: Account,
    pub driver_expense: Account,
    pub driver_payable: Account,
    pub store_expense: Account,
    pub store_payable: Account,
    pub marketer_expense: Account,
    pub marketer_payable: Account,
}

pub async fn create_account(
    repo: &AccountRepository,
    code: &str,
    name: &str,
    parent_id: Option<AccountId>,
) -> Account {
    repo.create_account(CreateAccountInput {
        code: code.to_string(),
        name: name.to_string(),
        parent_id,
    })
    .await
    .expect("create account")
}

/// Leaf accounts matching the default settlement posting codes.
pub async fn seed_chart(db: &DatabaseConnection) -> Chart {
    let repo = AccountRepository::new(db.clone());
    Chart {
        cash: create_account(&repo, "1-1", "Cash", None).await,
        revenue: create_account(&repo, "3-1", "Delivery Revenue", None).await,
        driver_expense: create_account(&repo, "4-1", "Driver Commission Expense", None).await,
        driver_payable: create_account(&repo, "2-1", "Payable to Drivers", None).await,
        store_expense: create_account(&repo, "4-2", "Store Commission Expense", None).await,
        store_payable: create_account(&repo, "2-2", "Payable to Stores", None).await,
        marketer_expense: create_account(&repo, "4-3", "Marketer Commission Expense", None).await,
        marketer_payable: create_account(&repo, "2-3", "Payable to Marketers", None).await,
    }
}

/// Two-line voucher moving `amount` base minor units.
pub fn simple_voucher(date: NaiveDate, debit: AccountId, credit: AccountId, amount: i64) -> StageVoucherInput {
    StageVoucherInput {
        date,
        description: "Test voucher".to_string(),
        reference: None,
        lines: vec![
            JournalLineInput::debit(debit, amount, BASE),
            JournalLineInput::credit(credit, amount, BASE),
        ],
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A window around today so commissions created by the test fall inside.
pub fn current_window() -> (NaiveDate, NaiveDate) {
    let today = today();
    (
        today.checked_sub_days(Days::new(1)).expect("date"),
        today.checked_add_days(Days::new(1)).expect("date"),
    )
}

/// Active plan paying `amount` on `trigger` to any beneficiary.
pub async fn seed_plan(repo: &CommissionRepository, trigger: &str, amount: i64) {
    repo.create_plan(CreatePlanInput {
        name: format!("{trigger} plan"),
        active: true,
        rules: vec![CommissionRule {
            trigger: trigger.to_string(),
            amount,
            beneficiary_type: None,
        }],
    })
    .await
    .expect("create plan");
}

/// Fires `trigger` for one beneficiary and approves what it produced.
pub async fn approved_commission(
    repo: &CommissionRepository,
    trigger: &str,
    order: &str,
    beneficiary_id: EntityId,
    beneficiary_type: BeneficiaryType,
) -> Commission {
    let created = repo
        .evaluate_trigger(
            trigger,
            &TriggerContext {
                source_order_id: Some(order.to_string()),
                beneficiaries: vec![Beneficiary {
                    id: beneficiary_id,
                    beneficiary_type,
                }],
            },
        )
        .await
        .expect("evaluate trigger");
    assert_eq!(created.len(), 1);
    repo.approve(created[0].id).await.expect("approve commission")
}

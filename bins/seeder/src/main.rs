//! Database seeder for Mizan development and testing.
//!
//! Seeds the marketplace chart of accounts and a default commission plan.
//! Existing accounts and plans are left alone, so it can be re-run.
//!
//! Usage: cargo run --bin seeder

use std::collections::HashMap;

use anyhow::Context;
use mizan_core::accounts::CreateAccountInput;
use mizan_core::commission::{BeneficiaryType, CommissionRule, CreatePlanInput};
use mizan_db::{AccountRepository, CommissionRepository};
use mizan_shared::AccountId;
use mizan_shared::config::DatabaseConfig;
use sea_orm_migration::MigratorTrait;

/// Chart of accounts as (code, name, parent code).
const CHART: &[(&str, &str, Option<&str>)] = &[
    ("1", "Assets", None),
    ("1-1", "Cash", Some("1")),
    ("2", "Liabilities", None),
    ("2-1", "Payable to Drivers", Some("2")),
    ("2-2", "Payable to Stores", Some("2")),
    ("2-3", "Payable to Marketers", Some("2")),
    ("3", "Revenue", None),
    ("3-1", "Delivery Revenue", Some("3")),
    ("4", "Expenses", None),
    ("4-1", "Driver Commission Expense", Some("4")),
    ("4-2", "Store Commission Expense", Some("4")),
    ("4-3", "Marketer Commission Expense", Some("4")),
];

const DEFAULT_PLAN: &str = "Default marketplace plan";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = mizan_db::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
        run_migrations: true,
    })
    .await
    .context("failed to connect to database")?;
    mizan_db::Migrator::up(&db, None).await?;

    println!("Seeding chart of accounts...");
    seed_chart(&AccountRepository::new(db.clone())).await?;

    println!("Seeding commission plan...");
    seed_plan(&CommissionRepository::new(db)).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_chart(repo: &AccountRepository) -> anyhow::Result<()> {
    let mut ids: HashMap<String, AccountId> = repo
        .list_accounts(None)
        .await?
        .into_iter()
        .map(|a| (a.code, a.id))
        .collect();

    for &(code, name, parent) in CHART {
        if ids.contains_key(code) {
            println!("  {code} already exists, skipping...");
            continue;
        }
        let parent_id = parent
            .map(|p| ids.get(p).copied().with_context(|| format!("parent {p} missing")))
            .transpose()?;
        let account = repo
            .create_account(CreateAccountInput {
                code: code.to_string(),
                name: name.to_string(),
                parent_id,
            })
            .await?;
        println!("  {code} {name}");
        ids.insert(account.code, account.id);
    }
    Ok(())
}

async fn seed_plan(repo: &CommissionRepository) -> anyhow::Result<()> {
    if repo.list_plans().await?.iter().any(|p| p.name == DEFAULT_PLAN) {
        println!("  Plan already exists, skipping...");
        return Ok(());
    }

    let rule = |trigger: &str, amount: i64, beneficiary_type| CommissionRule {
        trigger: trigger.to_string(),
        amount,
        beneficiary_type: Some(beneficiary_type),
    };
    let plan = repo
        .create_plan(CreatePlanInput {
            name: DEFAULT_PLAN.to_string(),
            active: true,
            rules: vec![
                rule("order_delivered", 50_000, BeneficiaryType::Driver),
                rule("store_approved", 1_000_000, BeneficiaryType::Store),
                rule("store_referred", 250_000, BeneficiaryType::Marketer),
            ],
        })
        .await?;
    println!("  {} with {} rules", plan.name, plan.rules.len());
    Ok(())
}

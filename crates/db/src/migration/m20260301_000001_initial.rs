//! Initial database migration.
//!
//! Creates every table of the finance core. The SQL sticks to the subset
//! PostgreSQL and SQLite share: no enum types, no server-side defaults,
//! enum columns as short strings guarded by CHECK constraints. Each
//! statement is executed on its own.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: CHART OF ACCOUNTS
        // ============================================================
        for sql in ACCOUNTS_SQL {
            db.execute_unprepared(sql).await?;
        }

        // ============================================================
        // PART 2: VOUCHERS & LINES
        // ============================================================
        for sql in LEDGER_SQL {
            db.execute_unprepared(sql).await?;
        }

        // ============================================================
        // PART 3: COMMISSIONS
        // ============================================================
        for sql in COMMISSIONS_SQL {
            db.execute_unprepared(sql).await?;
        }

        // ============================================================
        // PART 4: SETTLEMENTS
        // ============================================================
        for sql in SETTLEMENTS_SQL {
            db.execute_unprepared(sql).await?;
        }

        // ============================================================
        // PART 5: PAYOUT BATCHES
        // ============================================================
        for sql in PAYOUTS_SQL {
            db.execute_unprepared(sql).await?;
        }

        // ============================================================
        // PART 6: RECONCILIATION
        // ============================================================
        for sql in RECONCILIATION_SQL {
            db.execute_unprepared(sql).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for table in DROP_ORDER {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS {table}"))
                .await?;
        }
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ACCOUNTS_SQL: &[&str] = &[
    r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(32) NOT NULL,
    name VARCHAR(255) NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    is_active BOOLEAN NOT NULL,
    version BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_accounts_code UNIQUE (code)
)",
    "CREATE INDEX idx_accounts_parent ON accounts(parent_id)",
];

const LEDGER_SQL: &[&str] = &[
    r"
CREATE TABLE journal_vouchers (
    id UUID PRIMARY KEY,
    voucher_number VARCHAR(32) NOT NULL,
    voucher_date DATE NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(255),
    status VARCHAR(16) NOT NULL,
    reverses_voucher_id UUID REFERENCES journal_vouchers(id),
    settlement_id UUID,
    created_at TIMESTAMPTZ NOT NULL,
    posted_at TIMESTAMPTZ,
    version BIGINT NOT NULL,
    CONSTRAINT uq_journal_vouchers_number UNIQUE (voucher_number),
    CONSTRAINT uq_journal_vouchers_reverses UNIQUE (reverses_voucher_id),
    CONSTRAINT chk_journal_vouchers_status CHECK (status IN ('draft', 'posted'))
)",
    "CREATE INDEX idx_journal_vouchers_date ON journal_vouchers(voucher_date)",
    r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    voucher_id UUID NOT NULL REFERENCES journal_vouchers(id) ON DELETE CASCADE,
    line_no INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit BIGINT NOT NULL,
    credit BIGINT NOT NULL,
    currency VARCHAR(3) NOT NULL,
    rate TEXT NOT NULL,
    base_debit BIGINT NOT NULL,
    base_credit BIGINT NOT NULL,
    entity_id UUID,
    memo TEXT,
    CONSTRAINT uq_journal_lines_position UNIQUE (voucher_id, line_no),
    CONSTRAINT chk_journal_lines_one_side CHECK (
        (debit > 0 AND credit = 0) OR (debit = 0 AND credit > 0)
    ),
    CONSTRAINT chk_journal_lines_base CHECK (base_debit >= 0 AND base_credit >= 0)
)",
    "CREATE INDEX idx_journal_lines_account ON journal_lines(account_id)",
    "CREATE INDEX idx_journal_lines_entity ON journal_lines(entity_id)",
    r"
CREATE TABLE voucher_sequences (
    period VARCHAR(6) PRIMARY KEY,
    last_value BIGINT NOT NULL
)",
];

const COMMISSIONS_SQL: &[&str] = &[
    r"
CREATE TABLE commission_plans (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    active BOOLEAN NOT NULL,
    version BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)",
    r"
CREATE TABLE commission_rules (
    id UUID PRIMARY KEY,
    plan_id UUID NOT NULL REFERENCES commission_plans(id) ON DELETE CASCADE,
    trigger_name VARCHAR(128) NOT NULL,
    amount BIGINT NOT NULL,
    beneficiary_type VARCHAR(16),
    CONSTRAINT uq_commission_rules_trigger UNIQUE (plan_id, trigger_name),
    CONSTRAINT chk_commission_rules_amount CHECK (amount > 0)
)",
    r"
CREATE TABLE commissions (
    id UUID PRIMARY KEY,
    beneficiary_id UUID NOT NULL,
    beneficiary_type VARCHAR(16) NOT NULL,
    amount BIGINT NOT NULL,
    source_order_id VARCHAR(255),
    trigger_name VARCHAR(128) NOT NULL,
    plan_id UUID NOT NULL REFERENCES commission_plans(id),
    status VARCHAR(16) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    version BIGINT NOT NULL,
    CONSTRAINT chk_commissions_status CHECK (
        status IN ('pending', 'approved', 'paid', 'cancelled')
    )
)",
    "CREATE INDEX idx_commissions_beneficiary ON commissions(beneficiary_id, status)",
    r"
CREATE TABLE trigger_receipts (
    id UUID PRIMARY KEY,
    event_name VARCHAR(128) NOT NULL,
    source_order_key VARCHAR(255) NOT NULL,
    beneficiary_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_trigger_receipts_key UNIQUE (event_name, source_order_key, beneficiary_id)
)",
];

const SETTLEMENTS_SQL: &[&str] = &[
    r"
CREATE TABLE settlements (
    id UUID PRIMARY KEY,
    entity_id UUID NOT NULL,
    entity_model VARCHAR(16) NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    expected_total BIGINT NOT NULL,
    status VARCHAR(16) NOT NULL,
    voucher_id UUID REFERENCES journal_vouchers(id),
    approved_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    version BIGINT NOT NULL,
    CONSTRAINT chk_settlements_period CHECK (period_end >= period_start),
    CONSTRAINT chk_settlements_status CHECK (status IN ('draft', 'approved', 'paid'))
)",
    "CREATE INDEX idx_settlements_entity ON settlements(entity_id, period_start)",
    r"
CREATE TABLE settlement_commissions (
    settlement_id UUID NOT NULL REFERENCES settlements(id),
    commission_id UUID NOT NULL REFERENCES commissions(id),
    PRIMARY KEY (settlement_id, commission_id),
    CONSTRAINT uq_settlement_commissions_commission UNIQUE (commission_id)
)",
    r"
CREATE TABLE entity_settlement_guards (
    entity_id UUID PRIMARY KEY,
    version BIGINT NOT NULL
)",
];

const PAYOUTS_SQL: &[&str] = &[
    r"
CREATE TABLE payout_batches (
    id UUID PRIMARY KEY,
    status VARCHAR(16) NOT NULL,
    total BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    approved_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    version BIGINT NOT NULL,
    CONSTRAINT chk_payout_batches_status CHECK (status IN ('created', 'approved', 'completed'))
)",
    r"
CREATE TABLE payout_batch_items (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES payout_batches(id),
    position INTEGER NOT NULL,
    source VARCHAR(16) NOT NULL,
    source_id UUID NOT NULL,
    amount BIGINT NOT NULL,
    paid_at TIMESTAMPTZ,
    outcome VARCHAR(16),
    CONSTRAINT uq_payout_batch_items_source UNIQUE (source, source_id),
    CONSTRAINT chk_payout_batch_items_amount CHECK (amount > 0),
    CONSTRAINT chk_payout_batch_items_outcome CHECK (
        outcome IS NULL OR outcome IN ('paid', 'skipped')
    )
)",
    "CREATE INDEX idx_payout_batch_items_batch ON payout_batch_items(batch_id, position)",
];

const RECONCILIATION_SQL: &[&str] = &[
    r"
CREATE TABLE reconciliations (
    id UUID PRIMARY KEY,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    actuals_recorded_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_reconciliations_period UNIQUE (period_start, period_end)
)",
    r"
CREATE TABLE reconciliation_totals (
    reconciliation_id UUID NOT NULL REFERENCES reconciliations(id),
    kind VARCHAR(8) NOT NULL,
    category VARCHAR(32) NOT NULL,
    amount BIGINT NOT NULL,
    PRIMARY KEY (reconciliation_id, kind, category),
    CONSTRAINT chk_reconciliation_totals_kind CHECK (kind IN ('expected', 'actual'))
)",
    r"
CREATE TABLE reconciliation_issues (
    id UUID PRIMARY KEY,
    reconciliation_id UUID NOT NULL REFERENCES reconciliations(id),
    category VARCHAR(32) NOT NULL,
    expected BIGINT NOT NULL,
    actual BIGINT NOT NULL,
    difference BIGINT NOT NULL,
    description TEXT NOT NULL,
    status VARCHAR(16) NOT NULL,
    resolution TEXT,
    resolved_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_reconciliation_issues_status CHECK (status IN ('open', 'resolved'))
)",
    "CREATE INDEX idx_reconciliation_issues_status ON reconciliation_issues(status)",
];

/// Children before parents.
const DROP_ORDER: &[&str] = &[
    "reconciliation_issues",
    "reconciliation_totals",
    "reconciliations",
    "payout_batch_items",
    "payout_batches",
    "entity_settlement_guards",
    "settlement_commissions",
    "settlements",
    "trigger_receipts",
    "commissions",
    "commission_rules",
    "commission_plans",
    "voucher_sequences",
    "journal_lines",
    "journal_vouchers",
    "accounts",
];

//! Settlement repository: aggregation, approval with posting, reads.

use std::collections::HashSet;

use chrono::Utc;
use mizan_core::commission::CommissionStatus;
use mizan_core::ledger::VoucherLinks;
use mizan_core::settlement::{
    CreateSettlementInput, Settlement, SettlementAccounts, SettlementError, SettlementFilter,
    SettlementService, SettlementStatus,
};
use mizan_shared::config::SettlementConfig;
use mizan_shared::{CommissionId, Currency, EntityId, PageRequest, PageResponse, SettlementId, VoucherId};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::ledger::{self, PostedLineFilter};
use super::{DbResultExt, account, commission, day_end, day_start};
use crate::entities::{
    commissions, entity_settlement_guards, payout_batch_items, sea_orm_active_enums,
    settlement_commissions, settlements,
};

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
    base: Currency,
    accounts: SettlementConfig,
}

impl SettlementRepository {
    /// Creates a new settlement repository posting into `base` with the
    /// configured expense/payable accounts.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base: Currency, accounts: SettlementConfig) -> Self {
        Self { db, base, accounts }
    }

    /// Computes and stores a draft settlement for an entity and period.
    ///
    /// The expected total is the sum of the entity's approved, unclaimed,
    /// unbatched commissions created in the period plus the net credit of
    /// posted lines tagged with the entity in the period (settlement
    /// vouchers excluded).
    ///
    /// # Errors
    ///
    /// `InvalidPeriod`, `OverlappingPeriod`, `AmountOverflow`.
    pub async fn create_settlement(
        &self,
        input: CreateSettlementInput,
    ) -> Result<Settlement, SettlementError> {
        let period = SettlementService::period(input.period_start, input.period_end)?;
        let txn = self.db.begin().await.or_db(SettlementError::Database)?;

        lock_entity(&txn, input.entity_id).await?;

        let existing = settlements::Entity::find()
            .filter(settlements::Column::EntityId.eq(input.entity_id.into_inner()))
            .all(&txn)
            .await
            .or_db(SettlementError::Database)?
            .into_iter()
            .map(|m| to_settlement(m, Vec::new()))
            .collect::<Vec<_>>();
        SettlementService::check_overlap(input.entity_id, &period, &existing)
            .inspect_err(|e| warn!(entity_id = %input.entity_id, error = %e, "settlement rejected"))?;

        let candidates = commissions::Entity::find()
            .filter(commissions::Column::BeneficiaryId.eq(input.entity_id.into_inner()))
            .filter(commissions::Column::Status.eq(sea_orm_active_enums::CommissionStatus::Approved))
            .filter(commissions::Column::CreatedAt.gte(day_start(period.start)))
            .filter(commissions::Column::CreatedAt.lt(day_end(period.end)))
            .order_by_asc(commissions::Column::CreatedAt)
            .all(&txn)
            .await
            .or_db(SettlementError::Database)?;
        let taken = taken_commissions(&txn, candidates.iter().map(|c| c.id).collect()).await?;
        let claimed: Vec<commissions::Model> =
            candidates.into_iter().filter(|c| !taken.contains(&c.id)).collect();

        let lines = ledger::posted_lines(
            &txn,
            PostedLineFilter {
                date_from: Some(period.start),
                date_to: Some(period.end),
                entity_id: Some(input.entity_id),
                exclude_settlements: true,
            },
        )
        .await
        .or_db(SettlementError::Database)?;
        let net_credit = lines
            .iter()
            .try_fold(0_i64, |acc, l| acc.checked_add(l.base_credit)?.checked_sub(l.base_debit))
            .ok_or(SettlementError::AmountOverflow)?;

        let amounts: Vec<i64> = claimed.iter().map(|c| c.amount).collect();
        let expected_total = SettlementService::expected_total(&amounts, net_credit)?;

        let id = SettlementId::new();
        settlements::ActiveModel {
            id: Set(id.into_inner()),
            entity_id: Set(input.entity_id.into_inner()),
            entity_model: Set(input.entity_model.into()),
            period_start: Set(period.start),
            period_end: Set(period.end),
            expected_total: Set(expected_total),
            status: Set(sea_orm_active_enums::SettlementStatus::Draft),
            voucher_id: Set(None),
            approved_at: Set(None),
            created_at: Set(Utc::now()),
            version: Set(1),
        }
        .insert(&txn)
        .await
        .or_db(SettlementError::Database)?;

        if !claimed.is_empty() {
            let links = claimed.iter().map(|c| settlement_commissions::ActiveModel {
                settlement_id: Set(id.into_inner()),
                commission_id: Set(c.id),
            });
            settlement_commissions::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .or_db(SettlementError::Database)?;
        }

        let settlement = load(&txn, id).await?;
        txn.commit().await.or_db(SettlementError::Database)?;

        info!(
            settlement_id = %id,
            entity_id = %input.entity_id,
            period = %period,
            expected_total,
            commissions = settlement.commission_ids.len(),
            "settlement created"
        );
        Ok(settlement)
    }

    /// Draft → approved, posting the settlement voucher in the same
    /// transaction. On any failure nothing changes.
    ///
    /// Claimed commissions that were cancelled or paid while the settlement
    /// was a draft are released first and their amounts leave the total.
    ///
    /// # Errors
    ///
    /// `InvalidTransition`, `PostingAccountMissing`, `Ledger(..)` from
    /// staging/posting, `StaleVersion`.
    pub async fn approve(&self, id: SettlementId) -> Result<Settlement, SettlementError> {
        let txn = self.db.begin().await.or_db(SettlementError::Database)?;
        let mut current = load(&txn, id).await?;
        let next = SettlementService::approve(current.status)?;
        release_stale_claims(&txn, &mut current).await?;

        let voucher_id = if current.expected_total == 0 {
            None
        } else {
            let accounts = self.resolve_accounts(&txn, &current).await?;
            match SettlementService::approval_voucher(&current, accounts, self.base) {
                Some(input) => {
                    let links = VoucherLinks {
                        reverses: None,
                        settlement_id: Some(id),
                    };
                    let staged = ledger::stage_voucher_in(&txn, self.base, &input, links).await?;
                    let posted = ledger::post_voucher_in(&txn, self.base, staged.id).await?;
                    Some(posted.id)
                }
                None => None,
            }
        };

        let result = settlements::Entity::update_many()
            .col_expr(
                settlements::Column::Status,
                Expr::value(sea_orm_active_enums::SettlementStatus::from(next)),
            )
            .col_expr(
                settlements::Column::VoucherId,
                Expr::value(voucher_id.map(VoucherId::into_inner)),
            )
            .col_expr(settlements::Column::ApprovedAt, Expr::value(Utc::now()))
            .col_expr(
                settlements::Column::ExpectedTotal,
                Expr::value(current.expected_total),
            )
            .col_expr(
                settlements::Column::Version,
                Expr::col(settlements::Column::Version).add(1),
            )
            .filter(settlements::Column::Id.eq(id.into_inner()))
            .filter(settlements::Column::Version.eq(current.version))
            .exec(&txn)
            .await
            .or_db(SettlementError::Database)?;
        if result.rows_affected == 0 {
            warn!(settlement_id = %id, "settlement approval lost a concurrent write");
            return Err(SettlementError::StaleVersion(id));
        }

        let settlement = load(&txn, id).await?;
        txn.commit().await.or_db(SettlementError::Database)?;

        info!(
            settlement_id = %id,
            voucher_id = ?settlement.voucher_id,
            expected_total = settlement.expected_total,
            "settlement approved"
        );
        Ok(settlement)
    }

    async fn resolve_accounts<C: ConnectionTrait>(
        &self,
        conn: &C,
        settlement: &Settlement,
    ) -> Result<SettlementAccounts, SettlementError> {
        let codes = SettlementService::account_codes(&self.accounts, settlement.entity_model);
        let found = account::ids_by_code(
            conn,
            &[codes.expense_code.as_str(), codes.payable_code.as_str()],
        )
        .await
        .or_db(SettlementError::Database)?;
        let lookup = |code: &str| {
            found
                .get(code)
                .copied()
                .ok_or_else(|| SettlementError::PostingAccountMissing(code.to_string()))
        };
        Ok(SettlementAccounts {
            expense: lookup(&codes.expense_code)?,
            payable: lookup(&codes.payable_code)?,
        })
    }

    /// Fetches a settlement with its claimed commissions.
    ///
    /// # Errors
    ///
    /// `SettlementNotFound`, or a database error.
    pub async fn get_settlement(&self, id: SettlementId) -> Result<Settlement, SettlementError> {
        load(&self.db, id).await
    }

    /// Lists settlements, latest period first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_settlements(
        &self,
        filter: &SettlementFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Settlement>, SettlementError> {
        let mut query = settlements::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(
                settlements::Column::Status.eq(sea_orm_active_enums::SettlementStatus::from(status)),
            );
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(settlements::Column::EntityId.eq(entity_id.into_inner()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(settlements::Column::PeriodEnd.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(settlements::Column::PeriodStart.lte(to));
        }

        let total = query.clone().count(&self.db).await.or_db(SettlementError::Database)?;
        let models = query
            .order_by_desc(settlements::Column::PeriodStart)
            .order_by_asc(settlements::Column::EntityId)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .or_db(SettlementError::Database)?;

        let mut data = Vec::with_capacity(models.len());
        for model in models {
            let ids = commission_ids(&self.db, model.id).await?;
            data.push(to_settlement(model, ids));
        }
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

/// Approved → paid, along with every commission the settlement claimed.
pub(crate) async fn mark_paid_in<C: ConnectionTrait>(
    conn: &C,
    id: SettlementId,
) -> Result<Settlement, SettlementError> {
    let current = load(conn, id).await?;
    let next = SettlementService::mark_paid(current.status)?;

    let result = settlements::Entity::update_many()
        .col_expr(
            settlements::Column::Status,
            Expr::value(sea_orm_active_enums::SettlementStatus::from(next)),
        )
        .col_expr(
            settlements::Column::Version,
            Expr::col(settlements::Column::Version).add(1),
        )
        .filter(settlements::Column::Id.eq(id.into_inner()))
        .filter(settlements::Column::Version.eq(current.version))
        .exec(conn)
        .await
        .or_db(SettlementError::Database)?;
    if result.rows_affected == 0 {
        return Err(SettlementError::StaleVersion(id));
    }

    let ids: Vec<Uuid> = current.commission_ids.iter().map(|c| c.into_inner()).collect();
    if !ids.is_empty() {
        let expected = ids.len() as u64;
        let result = commissions::Entity::update_many()
            .col_expr(
                commissions::Column::Status,
                Expr::value(sea_orm_active_enums::CommissionStatus::from(CommissionStatus::Paid)),
            )
            .col_expr(
                commissions::Column::Version,
                Expr::col(commissions::Column::Version).add(1),
            )
            .filter(commissions::Column::Id.is_in(ids))
            .filter(
                commissions::Column::Status
                    .eq(sea_orm_active_enums::CommissionStatus::from(CommissionStatus::Approved)),
            )
            .exec(conn)
            .await
            .or_db(SettlementError::Database)?;
        if result.rows_affected != expected {
            warn!(
                settlement_id = %id,
                claimed = expected,
                updated = result.rows_affected,
                "claimed commission no longer approved"
            );
            return Err(SettlementError::StaleVersion(id));
        }
    }

    load(conn, id).await
}

/// Drops claims on commissions that are no longer approved and takes their
/// amounts out of the expected total. Claimed rows stay locked until the
/// caller's transaction ends.
async fn release_stale_claims<C: ConnectionTrait>(
    conn: &C,
    settlement: &mut Settlement,
) -> Result<(), SettlementError> {
    if settlement.commission_ids.is_empty() {
        return Ok(());
    }
    let claimed = commission::lock_many(conn, &settlement.commission_ids)
        .await
        .or_db(SettlementError::Database)?;
    let stale: Vec<_> = claimed
        .iter()
        .filter(|c| c.status != CommissionStatus::Approved)
        .collect();
    if stale.is_empty() {
        return Ok(());
    }

    let amounts: Vec<i64> = stale.iter().map(|c| c.amount).collect();
    settlement.expected_total = SettlementService::release(settlement.expected_total, &amounts)?;

    let released: HashSet<CommissionId> = stale.iter().map(|c| c.id).collect();
    settlement_commissions::Entity::delete_many()
        .filter(settlement_commissions::Column::SettlementId.eq(settlement.id.into_inner()))
        .filter(
            settlement_commissions::Column::CommissionId
                .is_in(released.iter().map(|c| c.into_inner())),
        )
        .exec(conn)
        .await
        .or_db(SettlementError::Database)?;
    settlement.commission_ids.retain(|c| !released.contains(c));

    warn!(
        settlement_id = %settlement.id,
        released = released.len(),
        expected_total = settlement.expected_total,
        "released claims on commissions no longer approved"
    );
    Ok(())
}

pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    id: SettlementId,
) -> Result<Settlement, SettlementError> {
    let model = settlements::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(SettlementError::Database)?
        .ok_or(SettlementError::SettlementNotFound(id))?;
    let ids = commission_ids(conn, model.id).await?;
    Ok(to_settlement(model, ids))
}

/// Bumps the entity's guard row; concurrent creators for the same entity
/// queue behind the row lock (or fail to commit on SQLite).
async fn lock_entity<C: ConnectionTrait>(conn: &C, entity_id: EntityId) -> Result<(), SettlementError> {
    entity_settlement_guards::Entity::insert(entity_settlement_guards::ActiveModel {
        entity_id: Set(entity_id.into_inner()),
        version: Set(0),
    })
    .on_conflict(
        OnConflict::column(entity_settlement_guards::Column::EntityId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .or_db(SettlementError::Database)?;

    entity_settlement_guards::Entity::update_many()
        .col_expr(
            entity_settlement_guards::Column::Version,
            Expr::col(entity_settlement_guards::Column::Version).add(1),
        )
        .filter(entity_settlement_guards::Column::EntityId.eq(entity_id.into_inner()))
        .exec(conn)
        .await
        .or_db(SettlementError::Database)?;
    Ok(())
}

/// Commissions already claimed by a settlement or placed in a payout batch.
async fn taken_commissions<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> Result<HashSet<Uuid>, SettlementError> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let claimed = settlement_commissions::Entity::find()
        .filter(settlement_commissions::Column::CommissionId.is_in(ids.clone()))
        .all(conn)
        .await
        .or_db(SettlementError::Database)?;
    let batched = payout_batch_items::Entity::find()
        .filter(payout_batch_items::Column::Source.eq(sea_orm_active_enums::ItemSource::Commission))
        .filter(payout_batch_items::Column::SourceId.is_in(ids))
        .all(conn)
        .await
        .or_db(SettlementError::Database)?;

    Ok(claimed
        .into_iter()
        .map(|c| c.commission_id)
        .chain(batched.into_iter().map(|i| i.source_id))
        .collect())
}

async fn commission_ids<C: ConnectionTrait>(
    conn: &C,
    settlement_id: Uuid,
) -> Result<Vec<CommissionId>, SettlementError> {
    let rows = settlement_commissions::Entity::find()
        .filter(settlement_commissions::Column::SettlementId.eq(settlement_id))
        .order_by_asc(settlement_commissions::Column::CommissionId)
        .all(conn)
        .await
        .or_db(SettlementError::Database)?;
    Ok(rows.into_iter().map(|r| r.commission_id.into()).collect())
}

fn to_settlement(model: settlements::Model, commission_ids: Vec<CommissionId>) -> Settlement {
    Settlement {
        id: model.id.into(),
        entity_id: model.entity_id.into(),
        entity_model: model.entity_model.into(),
        period_start: model.period_start,
        period_end: model.period_end,
        expected_total: model.expected_total,
        commission_ids,
        status: SettlementStatus::from(model.status),
        voucher_id: model.voucher_id.map(VoucherId::from),
        approved_at: model.approved_at,
        created_at: model.created_at,
        version: model.version,
    }
}

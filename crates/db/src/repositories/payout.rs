//! Payout batch repository.
//!
//! Completion is the one resumable job: every item is settled in its own
//! short transaction, concurrently, and stamped so a retry only touches
//! what is left.

use chrono::Utc;
use futures::future::join_all;
use mizan_core::commission::{CommissionError, CommissionService};
use mizan_core::payout::{
    BatchFilter, BatchStatus, CompletionPlan, ItemOutcome, ItemSource, PayoutBatch, PayoutError,
    PayoutItem, PayoutItemInput, PayoutService, SourceState,
};
use mizan_core::settlement::SettlementError;
use mizan_shared::{CommissionId, PageRequest, PageResponse, PayoutBatchId, SettlementId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{DbResultExt, commission, is_unique_violation, settlement};
use crate::entities::{
    commissions, payout_batch_items, payout_batches, sea_orm_active_enums, settlement_commissions,
};

/// Payout batch repository.
#[derive(Debug, Clone)]
pub struct PayoutRepository {
    db: DatabaseConnection,
}

impl PayoutRepository {
    /// Creates a new payout repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a batch, snapshotting each source's amount.
    ///
    /// # Errors
    ///
    /// - `EmptyBatch`, `DuplicateItem`
    /// - `SourceNotFound`, `NonPositiveAmount`
    /// - `ItemNoLongerPayable` if a source cannot be paid now
    /// - `ItemAlreadyBatched` if a source is in another batch
    pub async fn create_batch(&self, items: Vec<PayoutItemInput>) -> Result<PayoutBatch, PayoutError> {
        PayoutService::validate_items(&items)?;
        let txn = self.db.begin().await.or_db(PayoutError::Database)?;

        let mut amounts = Vec::with_capacity(items.len());
        for item in &items {
            let (state, amount) = snapshot(&txn, item.source, item.source_id)
                .await?
                .ok_or(PayoutError::SourceNotFound {
                    kind: item.source,
                    source_id: item.source_id,
                })?;
            PayoutService::check_payable(item.source, item.source_id, &state)?;
            if item.source == ItemSource::Commission && is_claimed(&txn, item.source_id).await? {
                warn!(commission_id = %item.source_id, "commission is paid through its settlement");
                return Err(PayoutError::ItemNoLongerPayable {
                    kind: item.source,
                    source_id: item.source_id,
                });
            }
            if is_batched(&txn, item.source, item.source_id).await? {
                return Err(PayoutError::ItemAlreadyBatched {
                    kind: item.source,
                    source_id: item.source_id,
                });
            }
            amounts.push(PayoutService::check_amount(item.source, item.source_id, amount)?);
        }
        let total = PayoutService::total(amounts.iter().copied())?;

        let id = PayoutBatchId::new();
        payout_batches::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(sea_orm_active_enums::BatchStatus::Created),
            total: Set(total),
            created_at: Set(Utc::now()),
            approved_at: Set(None),
            completed_at: Set(None),
            version: Set(1),
        }
        .insert(&txn)
        .await
        .or_db(PayoutError::Database)?;

        for (position, (item, amount)) in (1_i32..).zip(items.iter().zip(amounts)) {
            let inserted = payout_batch_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                batch_id: Set(id.into_inner()),
                position: Set(position),
                source: Set(item.source.into()),
                source_id: Set(item.source_id),
                amount: Set(amount),
                paid_at: Set(None),
                outcome: Set(None),
            }
            .insert(&txn)
            .await;
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    warn!(source_id = %item.source_id, "source batched concurrently");
                    return Err(PayoutError::ItemAlreadyBatched {
                        kind: item.source,
                        source_id: item.source_id,
                    });
                }
                Err(e) => return Err(e).or_db(PayoutError::Database),
            }
        }

        let batch = load(&txn, id).await?;
        txn.commit().await.or_db(PayoutError::Database)?;

        info!(batch_id = %id, items = batch.items.len(), total, "payout batch created");
        Ok(batch)
    }

    /// Created → approved. Every source must still be payable.
    ///
    /// # Errors
    ///
    /// `BatchNotFound`, `InvalidTransition`, `ItemNoLongerPayable`,
    /// `StaleVersion`.
    pub async fn approve_batch(&self, id: PayoutBatchId) -> Result<PayoutBatch, PayoutError> {
        let txn = self.db.begin().await.or_db(PayoutError::Database)?;
        let batch = load(&txn, id).await?;
        let next = PayoutService::approve(batch.status)?;

        for item in &batch.items {
            let (state, _) = snapshot(&txn, item.source, item.source_id)
                .await?
                .ok_or(PayoutError::SourceNotFound {
                    kind: item.source,
                    source_id: item.source_id,
                })?;
            PayoutService::check_payable(item.source, item.source_id, &state)
                .inspect_err(|e| warn!(batch_id = %id, error = %e, "batch approval rejected"))?;
        }

        let result = payout_batches::Entity::update_many()
            .col_expr(
                payout_batches::Column::Status,
                Expr::value(sea_orm_active_enums::BatchStatus::from(next)),
            )
            .col_expr(payout_batches::Column::ApprovedAt, Expr::value(Utc::now()))
            .col_expr(
                payout_batches::Column::Version,
                Expr::col(payout_batches::Column::Version).add(1),
            )
            .filter(payout_batches::Column::Id.eq(id.into_inner()))
            .filter(payout_batches::Column::Version.eq(batch.version))
            .exec(&txn)
            .await
            .or_db(PayoutError::Database)?;
        if result.rows_affected == 0 {
            warn!(batch_id = %id, "batch approval lost a concurrent write");
            return Err(PayoutError::StaleVersion(id));
        }

        let batch = load(&txn, id).await?;
        txn.commit().await.or_db(PayoutError::Database)?;

        info!(batch_id = %id, "payout batch approved");
        Ok(batch)
    }

    /// Approved → completed, paying every item exactly once.
    ///
    /// Items are processed concurrently, each in its own transaction; items
    /// already stamped are left alone, so a failed run can simply be
    /// retried. Sources that stopped being payable are stamped `skipped`.
    /// Completing a completed batch returns it unchanged.
    ///
    /// # Errors
    ///
    /// `BatchNotFound`, `InvalidTransition` for created batches, or the
    /// first item failure (the batch stays approved).
    pub async fn complete_batch(&self, id: PayoutBatchId) -> Result<PayoutBatch, PayoutError> {
        let batch = load(&self.db, id).await?;
        if PayoutService::plan_completion(batch.status)? == CompletionPlan::AlreadyCompleted {
            debug!(batch_id = %id, "batch already completed");
            return Ok(batch);
        }

        let pending: Vec<&PayoutItem> = batch.items.iter().filter(|i| i.outcome.is_none()).collect();
        let results = join_all(pending.iter().map(|item| self.complete_item(id, item))).await;
        for result in results {
            result?;
        }

        let result = payout_batches::Entity::update_many()
            .col_expr(
                payout_batches::Column::Status,
                Expr::value(sea_orm_active_enums::BatchStatus::Completed),
            )
            .col_expr(payout_batches::Column::CompletedAt, Expr::value(Utc::now()))
            .col_expr(
                payout_batches::Column::Version,
                Expr::col(payout_batches::Column::Version).add(1),
            )
            .filter(payout_batches::Column::Id.eq(id.into_inner()))
            .filter(payout_batches::Column::Version.eq(batch.version))
            .exec(&self.db)
            .await
            .or_db(PayoutError::Database)?;

        let completed = load(&self.db, id).await?;
        if result.rows_affected == 0 {
            if completed.status == BatchStatus::Completed {
                debug!(batch_id = %id, "batch completed by a concurrent caller");
                return Ok(completed);
            }
            return Err(PayoutError::StaleVersion(id));
        }

        info!(
            batch_id = %id,
            paid = completed.items.iter().filter(|i| i.outcome == Some(ItemOutcome::Paid)).count(),
            skipped = completed.items.iter().filter(|i| i.outcome == Some(ItemOutcome::Skipped)).count(),
            "payout batch completed"
        );
        Ok(completed)
    }

    /// Stamps one item and, if its source is still payable, marks the
    /// source paid. A concurrent run that stamped it first wins.
    async fn complete_item(&self, batch_id: PayoutBatchId, item: &PayoutItem) -> Result<(), PayoutError> {
        let txn = self.db.begin().await.or_db(PayoutError::Database)?;

        let outcome = match snapshot(&txn, item.source, item.source_id).await? {
            Some((state, _)) => PayoutService::item_outcome(&state),
            None => ItemOutcome::Skipped,
        };
        let paid_at = (outcome == ItemOutcome::Paid).then(Utc::now);

        let stamped = payout_batch_items::Entity::update_many()
            .col_expr(
                payout_batch_items::Column::Outcome,
                Expr::value(Some(sea_orm_active_enums::ItemOutcome::from(outcome))),
            )
            .col_expr(payout_batch_items::Column::PaidAt, Expr::value(paid_at))
            .filter(payout_batch_items::Column::BatchId.eq(batch_id.into_inner()))
            .filter(payout_batch_items::Column::Source.eq(sea_orm_active_enums::ItemSource::from(item.source)))
            .filter(payout_batch_items::Column::SourceId.eq(item.source_id))
            .filter(payout_batch_items::Column::Outcome.is_null())
            .exec(&txn)
            .await
            .or_db(PayoutError::Database)?;
        if stamped.rows_affected == 0 {
            debug!(batch_id = %batch_id, source_id = %item.source_id, "item already processed");
            return Ok(());
        }

        if outcome == ItemOutcome::Paid {
            match item.source {
                ItemSource::Commission => {
                    commission::transition_in(&txn, CommissionId::from(item.source_id), CommissionService::mark_paid)
                        .await
                        .map_err(|e| from_commission(batch_id, item, e))?;
                }
                ItemSource::Settlement => {
                    settlement::mark_paid_in(&txn, SettlementId::from(item.source_id))
                        .await
                        .map_err(|e| from_settlement(batch_id, item, e))?;
                }
            }
        } else {
            warn!(batch_id = %batch_id, source = %item.source, source_id = %item.source_id, "item skipped");
        }

        txn.commit().await.or_db(PayoutError::Database)
    }

    /// Fetches a batch with its items.
    ///
    /// # Errors
    ///
    /// `BatchNotFound`, or a database error.
    pub async fn get_batch(&self, id: PayoutBatchId) -> Result<PayoutBatch, PayoutError> {
        load(&self.db, id).await
    }

    /// Lists batches newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_batches(
        &self,
        filter: &BatchFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<PayoutBatch>, PayoutError> {
        let mut query = payout_batches::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(payout_batches::Column::Status.eq(sea_orm_active_enums::BatchStatus::from(status)));
        }

        let total = query.clone().count(&self.db).await.or_db(PayoutError::Database)?;
        let models = query
            .order_by_desc(payout_batches::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .or_db(PayoutError::Database)?;

        let mut data = Vec::with_capacity(models.len());
        for model in models {
            let items = load_items(&self.db, model.id).await?;
            data.push(to_batch(model, items));
        }
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

fn from_commission(batch_id: PayoutBatchId, item: &PayoutItem, err: CommissionError) -> PayoutError {
    match err {
        CommissionError::InvalidTransition { .. } | CommissionError::CommissionNotFound(_) => {
            PayoutError::ItemNoLongerPayable {
                kind: item.source,
                source_id: item.source_id,
            }
        }
        CommissionError::StaleVersion(_) => PayoutError::StaleVersion(batch_id),
        other => PayoutError::Database(other.to_string()),
    }
}

fn from_settlement(batch_id: PayoutBatchId, item: &PayoutItem, err: SettlementError) -> PayoutError {
    match err {
        SettlementError::InvalidTransition { .. } | SettlementError::SettlementNotFound(_) => {
            PayoutError::ItemNoLongerPayable {
                kind: item.source,
                source_id: item.source_id,
            }
        }
        SettlementError::StaleVersion(_) => PayoutError::StaleVersion(batch_id),
        other => PayoutError::Database(other.to_string()),
    }
}

/// Current state and payable amount of a source, `None` if it does not exist.
async fn snapshot<C: ConnectionTrait>(
    conn: &C,
    kind: ItemSource,
    source_id: Uuid,
) -> Result<Option<(SourceState, i64)>, PayoutError> {
    match kind {
        ItemSource::Commission => {
            let found = commissions::Entity::find_by_id(source_id)
                .lock_exclusive()
                .one(conn)
                .await
                .or_db(PayoutError::Database)?;
            Ok(found.map(|c| (SourceState::Commission(c.status.into()), c.amount)))
        }
        ItemSource::Settlement => {
            let settlement = match settlement::load(conn, SettlementId::from(source_id)).await {
                Ok(s) => s,
                Err(SettlementError::SettlementNotFound(_)) => return Ok(None),
                Err(e) => return Err(PayoutError::Database(e.to_string())),
            };
            let claimed = commission::lock_many(conn, &settlement.commission_ids)
                .await
                .or_db(PayoutError::Database)?;
            let state = SourceState::Settlement {
                status: settlement.status,
                commissions: claimed.iter().map(|c| c.status).collect(),
            };
            Ok(Some((state, settlement.expected_total)))
        }
    }
}

async fn is_claimed<C: ConnectionTrait>(conn: &C, commission_id: Uuid) -> Result<bool, PayoutError> {
    let count = settlement_commissions::Entity::find()
        .filter(settlement_commissions::Column::CommissionId.eq(commission_id))
        .count(conn)
        .await
        .or_db(PayoutError::Database)?;
    Ok(count > 0)
}

async fn is_batched<C: ConnectionTrait>(conn: &C, kind: ItemSource, source_id: Uuid) -> Result<bool, PayoutError> {
    let count = payout_batch_items::Entity::find()
        .filter(payout_batch_items::Column::Source.eq(sea_orm_active_enums::ItemSource::from(kind)))
        .filter(payout_batch_items::Column::SourceId.eq(source_id))
        .count(conn)
        .await
        .or_db(PayoutError::Database)?;
    Ok(count > 0)
}

async fn load<C: ConnectionTrait>(conn: &C, id: PayoutBatchId) -> Result<PayoutBatch, PayoutError> {
    let model = payout_batches::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(PayoutError::Database)?
        .ok_or(PayoutError::BatchNotFound(id))?;
    let items = load_items(conn, model.id).await?;
    Ok(to_batch(model, items))
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    batch_id: Uuid,
) -> Result<Vec<payout_batch_items::Model>, PayoutError> {
    payout_batch_items::Entity::find()
        .filter(payout_batch_items::Column::BatchId.eq(batch_id))
        .order_by_asc(payout_batch_items::Column::Position)
        .all(conn)
        .await
        .or_db(PayoutError::Database)
}

fn to_batch(model: payout_batches::Model, items: Vec<payout_batch_items::Model>) -> PayoutBatch {
    PayoutBatch {
        id: model.id.into(),
        items: items
            .into_iter()
            .map(|i| PayoutItem {
                source: i.source.into(),
                source_id: i.source_id,
                amount: i.amount,
                paid_at: i.paid_at,
                outcome: i.outcome.map(Into::into),
            })
            .collect(),
        status: model.status.into(),
        total: model.total,
        created_at: model.created_at,
        approved_at: model.approved_at,
        completed_at: model.completed_at,
        version: model.version,
    }
}

//! Commission repository: plans, trigger evaluation and the commission lifecycle.

use chrono::Utc;
use mizan_core::commission::{
    Commission, CommissionError, CommissionFilter, CommissionPlan, CommissionRule,
    CommissionService, CommissionStatus, CreatePlanInput, NewCommission, TriggerContext,
    TriggerKey,
};
use mizan_shared::{CommissionId, CommissionPlanId, EntityId, PageRequest, PageResponse};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{DbResultExt, day_end, day_start, is_unique_violation};
use crate::entities::{commission_plans, commission_rules, commissions, sea_orm_active_enums, trigger_receipts};

/// Commission repository.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    db: DatabaseConnection,
}

impl CommissionRepository {
    /// Creates a new commission repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a plan with its rules.
    ///
    /// # Errors
    ///
    /// `InvalidPlanInput`, `DuplicateRuleTrigger` or `InvalidRuleAmount`.
    pub async fn create_plan(&self, input: CreatePlanInput) -> Result<CommissionPlan, CommissionError> {
        CommissionService::validate_plan(&input)?;

        let id = CommissionPlanId::new();
        let txn = self.db.begin().await.or_db(CommissionError::Database)?;
        commission_plans::ActiveModel {
            id: Set(id.into_inner()),
            name: Set(input.name.trim().to_string()),
            active: Set(input.active),
            version: Set(1),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .or_db(CommissionError::Database)?;

        for rule in &input.rules {
            let inserted = commission_rules::ActiveModel {
                id: Set(Uuid::now_v7()),
                plan_id: Set(id.into_inner()),
                trigger_name: Set(rule.trigger.clone()),
                amount: Set(rule.amount),
                beneficiary_type: Set(rule.beneficiary_type.map(Into::into)),
            }
            .insert(&txn)
            .await;
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(CommissionError::DuplicateRuleTrigger(rule.trigger.clone()));
                }
                Err(e) => return Err(e).or_db(CommissionError::Database),
            }
        }

        let plan = load_plan(&txn, id).await?;
        txn.commit().await.or_db(CommissionError::Database)?;

        info!(plan_id = %id, rules = plan.rules.len(), "commission plan created");
        Ok(plan)
    }

    /// Activates or deactivates a plan.
    ///
    /// # Errors
    ///
    /// `PlanNotFound`, or a database error.
    pub async fn set_plan_active(
        &self,
        id: CommissionPlanId,
        active: bool,
    ) -> Result<CommissionPlan, CommissionError> {
        let txn = self.db.begin().await.or_db(CommissionError::Database)?;
        let result = commission_plans::Entity::update_many()
            .col_expr(commission_plans::Column::Active, Expr::value(active))
            .col_expr(
                commission_plans::Column::Version,
                Expr::col(commission_plans::Column::Version).add(1),
            )
            .filter(commission_plans::Column::Id.eq(id.into_inner()))
            .exec(&txn)
            .await
            .or_db(CommissionError::Database)?;
        if result.rows_affected == 0 {
            return Err(CommissionError::PlanNotFound(id));
        }
        let plan = load_plan(&txn, id).await?;
        txn.commit().await.or_db(CommissionError::Database)?;

        info!(plan_id = %id, active, "commission plan updated");
        Ok(plan)
    }

    /// Fetches a plan with its rules.
    ///
    /// # Errors
    ///
    /// `PlanNotFound`, or a database error.
    pub async fn get_plan(&self, id: CommissionPlanId) -> Result<CommissionPlan, CommissionError> {
        load_plan(&self.db, id).await
    }

    /// Lists every plan ordered by creation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_plans(&self) -> Result<Vec<CommissionPlan>, CommissionError> {
        load_plans(&self.db, false).await
    }

    /// Evaluates an event for each named beneficiary.
    ///
    /// A beneficiary's share of the event is recorded by a receipt keyed on
    /// (event, source order, beneficiary) in the same transaction as the
    /// commissions it creates; a redelivered event finds its receipt and
    /// creates nothing. Returns only newly created commissions.
    ///
    /// # Errors
    ///
    /// `InvalidTriggerInput`, or a database error (nothing is written).
    pub async fn evaluate_trigger(
        &self,
        event_name: &str,
        context: &TriggerContext,
    ) -> Result<Vec<Commission>, CommissionError> {
        CommissionService::validate_trigger(event_name, context)?;

        let txn = self.db.begin().await.or_db(CommissionError::Database)?;
        let plans = load_plans(&txn, true).await?;
        let source_order_id = context.source_order_id.as_deref();

        let mut created = Vec::new();
        for beneficiary in &context.beneficiaries {
            let key = TriggerKey::new(event_name, source_order_id, beneficiary.id);
            if !insert_receipt(&txn, &key).await? {
                debug!(
                    event = event_name,
                    beneficiary_id = %beneficiary.id,
                    "duplicate trigger delivery ignored"
                );
                continue;
            }

            for new in CommissionService::commissions_for(&plans, event_name, *beneficiary, source_order_id) {
                created.push(insert_commission(&txn, new).await?);
            }
        }
        txn.commit().await.or_db(CommissionError::Database)?;

        info!(event = event_name, created = created.len(), "trigger evaluated");
        Ok(created)
    }

    /// Pending → approved.
    ///
    /// # Errors
    ///
    /// `CommissionNotFound`, `InvalidTransition` or `StaleVersion`.
    pub async fn approve(&self, id: CommissionId) -> Result<Commission, CommissionError> {
        self.transition(id, CommissionService::approve).await
    }

    /// Pending or approved → cancelled.
    ///
    /// # Errors
    ///
    /// `CommissionNotFound`, `InvalidTransition` or `StaleVersion`.
    pub async fn cancel(&self, id: CommissionId) -> Result<Commission, CommissionError> {
        self.transition(id, CommissionService::cancel).await
    }

    async fn transition(
        &self,
        id: CommissionId,
        rule: fn(CommissionStatus) -> Result<CommissionStatus, CommissionError>,
    ) -> Result<Commission, CommissionError> {
        let txn = self.db.begin().await.or_db(CommissionError::Database)?;
        let commission = transition_in(&txn, id, rule).await?;
        txn.commit().await.or_db(CommissionError::Database)?;

        info!(commission_id = %id, status = %commission.status, "commission updated");
        Ok(commission)
    }

    /// Fetches a commission.
    ///
    /// # Errors
    ///
    /// `CommissionNotFound`, or a database error.
    pub async fn get_commission(&self, id: CommissionId) -> Result<Commission, CommissionError> {
        find(&self.db, id).await.map(to_commission)
    }

    /// Lists commissions newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_commissions(
        &self,
        filter: &CommissionFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Commission>, CommissionError> {
        let mut query = commissions::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(
                commissions::Column::Status.eq(sea_orm_active_enums::CommissionStatus::from(status)),
            );
        }
        if let Some(beneficiary_id) = filter.beneficiary_id {
            query = query.filter(commissions::Column::BeneficiaryId.eq(beneficiary_id.into_inner()));
        }
        if let Some(beneficiary_type) = filter.beneficiary_type {
            query = query.filter(
                commissions::Column::BeneficiaryType
                    .eq(sea_orm_active_enums::BeneficiaryType::from(beneficiary_type)),
            );
        }
        if let Some(from) = filter.date_from {
            query = query.filter(commissions::Column::CreatedAt.gte(day_start(from)));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(commissions::Column::CreatedAt.lt(day_end(to)));
        }

        let total = query.clone().count(&self.db).await.or_db(CommissionError::Database)?;
        let models = query
            .order_by_desc(commissions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .or_db(CommissionError::Database)?;

        Ok(PageResponse::new(
            models.into_iter().map(to_commission).collect(),
            page.page,
            page.per_page,
            total,
        ))
    }
}

/// Applies `rule` to a commission's status under a version guard.
pub(crate) async fn transition_in<C: ConnectionTrait>(
    conn: &C,
    id: CommissionId,
    rule: fn(CommissionStatus) -> Result<CommissionStatus, CommissionError>,
) -> Result<Commission, CommissionError> {
    let current = find_locked(conn, id).await?;
    let next = rule(current.status.into()).inspect_err(|e| warn!(commission_id = %id, error = %e, "transition rejected"))?;

    let result = commissions::Entity::update_many()
        .col_expr(
            commissions::Column::Status,
            Expr::value(sea_orm_active_enums::CommissionStatus::from(next)),
        )
        .col_expr(
            commissions::Column::Version,
            Expr::col(commissions::Column::Version).add(1),
        )
        .filter(commissions::Column::Id.eq(id.into_inner()))
        .filter(commissions::Column::Version.eq(current.version))
        .exec(conn)
        .await
        .or_db(CommissionError::Database)?;
    if result.rows_affected == 0 {
        warn!(commission_id = %id, "commission update lost a concurrent write");
        return Err(CommissionError::StaleVersion(id));
    }

    find(conn, id).await.map(to_commission)
}

/// Loads the given commissions, holding their rows until the transaction
/// ends. Unknown ids are absent from the result.
pub(crate) async fn lock_many<C: ConnectionTrait>(
    conn: &C,
    ids: &[CommissionId],
) -> Result<Vec<Commission>, sea_orm::DbErr> {
    let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    let models = commissions::Entity::find()
        .filter(commissions::Column::Id.is_in(ids))
        .order_by_asc(commissions::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await?;
    Ok(models.into_iter().map(to_commission).collect())
}

async fn find_locked<C: ConnectionTrait>(conn: &C, id: CommissionId) -> Result<commissions::Model, CommissionError> {
    commissions::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .or_db(CommissionError::Database)?
        .ok_or(CommissionError::CommissionNotFound(id))
}

async fn find<C: ConnectionTrait>(conn: &C, id: CommissionId) -> Result<commissions::Model, CommissionError> {
    commissions::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(CommissionError::Database)?
        .ok_or(CommissionError::CommissionNotFound(id))
}

/// Returns false if the receipt already existed.
async fn insert_receipt<C: ConnectionTrait>(conn: &C, key: &TriggerKey) -> Result<bool, CommissionError> {
    let inserted = trigger_receipts::Entity::insert(trigger_receipts::ActiveModel {
        id: Set(Uuid::now_v7()),
        event_name: Set(key.event_name.clone()),
        source_order_key: Set(key.source_order_key.clone()),
        beneficiary_id: Set(key.beneficiary_id.into_inner()),
        created_at: Set(Utc::now()),
    })
    .on_conflict(
        OnConflict::columns([
            trigger_receipts::Column::EventName,
            trigger_receipts::Column::SourceOrderKey,
            trigger_receipts::Column::BeneficiaryId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .or_db(CommissionError::Database)?;
    Ok(inserted > 0)
}

async fn insert_commission<C: ConnectionTrait>(
    conn: &C,
    new: NewCommission,
) -> Result<Commission, CommissionError> {
    let model = commissions::ActiveModel {
        id: Set(CommissionId::new().into_inner()),
        beneficiary_id: Set(new.beneficiary.id.into_inner()),
        beneficiary_type: Set(new.beneficiary.beneficiary_type.into()),
        amount: Set(new.amount),
        source_order_id: Set(new.source_order_id),
        trigger_name: Set(new.trigger),
        plan_id: Set(new.plan_id.into_inner()),
        status: Set(sea_orm_active_enums::CommissionStatus::Pending),
        created_at: Set(Utc::now()),
        version: Set(1),
    }
    .insert(conn)
    .await
    .or_db(CommissionError::Database)?;
    Ok(to_commission(model))
}

async fn load_plan<C: ConnectionTrait>(
    conn: &C,
    id: CommissionPlanId,
) -> Result<CommissionPlan, CommissionError> {
    let plan = commission_plans::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(CommissionError::Database)?
        .ok_or(CommissionError::PlanNotFound(id))?;
    let rules = commission_rules::Entity::find()
        .filter(commission_rules::Column::PlanId.eq(plan.id))
        .order_by_asc(commission_rules::Column::TriggerName)
        .all(conn)
        .await
        .or_db(CommissionError::Database)?;
    Ok(to_plan(plan, rules))
}

async fn load_plans<C: ConnectionTrait>(
    conn: &C,
    active_only: bool,
) -> Result<Vec<CommissionPlan>, CommissionError> {
    let mut query = commission_plans::Entity::find().order_by_asc(commission_plans::Column::CreatedAt);
    if active_only {
        query = query.filter(commission_plans::Column::Active.eq(true));
    }
    let plans = query.all(conn).await.or_db(CommissionError::Database)?;

    let plan_ids: Vec<Uuid> = plans.iter().map(|p| p.id).collect();
    let mut rules = commission_rules::Entity::find()
        .filter(commission_rules::Column::PlanId.is_in(plan_ids))
        .order_by_asc(commission_rules::Column::TriggerName)
        .all(conn)
        .await
        .or_db(CommissionError::Database)?;

    Ok(plans
        .into_iter()
        .map(|plan| {
            let (own, rest): (Vec<_>, Vec<_>) = rules.drain(..).partition(|r| r.plan_id == plan.id);
            rules = rest;
            to_plan(plan, own)
        })
        .collect())
}

fn to_plan(plan: commission_plans::Model, rules: Vec<commission_rules::Model>) -> CommissionPlan {
    CommissionPlan {
        id: plan.id.into(),
        name: plan.name,
        active: plan.active,
        rules: rules
            .into_iter()
            .map(|r| CommissionRule {
                trigger: r.trigger_name,
                amount: r.amount,
                beneficiary_type: r.beneficiary_type.map(Into::into),
            })
            .collect(),
        created_at: plan.created_at,
        version: plan.version,
    }
}

pub(crate) fn to_commission(model: commissions::Model) -> Commission {
    Commission {
        id: model.id.into(),
        beneficiary_id: EntityId::from(model.beneficiary_id),
        beneficiary_type: model.beneficiary_type.into(),
        amount: model.amount,
        source_order_id: model.source_order_id,
        trigger: model.trigger_name,
        plan_id: model.plan_id.into(),
        status: model.status.into(),
        created_at: model.created_at,
        version: model.version,
    }
}

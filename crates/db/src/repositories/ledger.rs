//! Ledger repository: staging, posting, reversing and reading vouchers.
//!
//! The `*_in` helpers take any connection so other repositories can stage
//! and post vouchers inside their own transactions (settlement approval).

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use mizan_core::ledger::{
    JournalLine, JournalVoucher, LedgerError, LedgerService, ReversalService, StageVoucherInput,
    VoucherFilter, VoucherLinks, VoucherNumber, VoucherStatus, VoucherTotals,
};
use mizan_shared::{
    AccountId, Currency, EntityId, PageRequest, PageResponse, SettlementId, VoucherId,
};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{DbResultExt, account, is_unique_violation};
use crate::entities::{journal_lines, journal_vouchers, sea_orm_active_enums, voucher_sequences};

/// Ledger repository for journal vouchers.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
    base: Currency,
}

impl LedgerRepository {
    /// Creates a new ledger repository converting into `base`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base: Currency) -> Self {
        Self { db, base }
    }

    /// Validates a voucher and stores it as a draft with the next number of
    /// its period.
    ///
    /// # Errors
    ///
    /// Any validation `LedgerError`; nothing is written on failure.
    pub async fn stage_voucher(&self, input: StageVoucherInput) -> Result<JournalVoucher, LedgerError> {
        let txn = self.db.begin().await.or_db(LedgerError::Database)?;
        let voucher = stage_voucher_in(&txn, self.base, &input, VoucherLinks::default()).await?;
        txn.commit().await.or_db(LedgerError::Database)?;

        info!(
            voucher_id = %voucher.id,
            voucher_number = %voucher.voucher_number,
            lines = voucher.lines.len(),
            "voucher staged"
        );
        Ok(voucher)
    }

    /// Re-validates a draft and posts it. Exactly one concurrent caller wins.
    ///
    /// # Errors
    ///
    /// - `VoucherNotFound`
    /// - `AlreadyPosted` if it is posted, including by a concurrent caller
    /// - `NonPostableAccount` / `UnbalancedVoucher` from re-validation
    pub async fn post_voucher(&self, id: VoucherId) -> Result<JournalVoucher, LedgerError> {
        let txn = self.db.begin().await.or_db(LedgerError::Database)?;
        let voucher = post_voucher_in(&txn, self.base, id).await?;
        txn.commit().await.or_db(LedgerError::Database)?;

        info!(voucher_id = %id, voucher_number = %voucher.voucher_number, "voucher posted");
        Ok(voucher)
    }

    /// Posts a new voucher mirroring a posted one.
    ///
    /// # Errors
    ///
    /// - `VoucherNotFound`
    /// - `NotPosted` if the original is a draft
    /// - `AlreadyReversed` if a reversal exists
    pub async fn reverse_voucher(
        &self,
        id: VoucherId,
        date: Option<NaiveDate>,
    ) -> Result<JournalVoucher, LedgerError> {
        let txn = self.db.begin().await.or_db(LedgerError::Database)?;
        let original = load_voucher(&txn, id).await?;

        let already_reversed = journal_vouchers::Entity::find()
            .filter(journal_vouchers::Column::ReversesVoucherId.eq(id.into_inner()))
            .count(&txn)
            .await
            .or_db(LedgerError::Database)?
            > 0;
        LedgerService::ensure_can_reverse(id, original.status, already_reversed)?;

        let draft = ReversalService::draft(&original, date);
        let links = VoucherLinks {
            reverses: Some(id),
            settlement_id: None,
        };
        let staged = insert_voucher(
            &txn,
            NewVoucher {
                date: draft.date,
                description: draft.description,
                reference: draft.reference,
                lines: draft.lines,
                links,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(voucher_id = %id, "concurrent reversal");
                LedgerError::AlreadyReversed(id)
            } else {
                LedgerError::Database(e.to_string())
            }
        })?;
        let reversal = post_voucher_in(&txn, self.base, staged.id).await?;
        txn.commit().await.or_db(LedgerError::Database)?;

        info!(
            voucher_id = %id,
            reversal_id = %reversal.id,
            voucher_number = %reversal.voucher_number,
            "voucher reversed"
        );
        Ok(reversal)
    }

    /// Deletes a draft voucher and its lines.
    ///
    /// # Errors
    ///
    /// `VoucherNotFound`, or `AlreadyPosted` for posted vouchers.
    pub async fn discard_draft(&self, id: VoucherId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.or_db(LedgerError::Database)?;
        let header = find_header(&txn, id).await?;
        LedgerService::ensure_can_discard(id, header.status.into())?;

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::VoucherId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .or_db(LedgerError::Database)?;
        let deleted = journal_vouchers::Entity::delete_many()
            .filter(journal_vouchers::Column::Id.eq(id.into_inner()))
            .filter(journal_vouchers::Column::Version.eq(header.version))
            .filter(journal_vouchers::Column::Status.eq(sea_orm_active_enums::VoucherStatus::Draft))
            .exec(&txn)
            .await
            .or_db(LedgerError::Database)?;
        if deleted.rows_affected == 0 {
            return Err(LedgerError::StaleVersion(id));
        }
        txn.commit().await.or_db(LedgerError::Database)?;

        info!(voucher_id = %id, voucher_number = %header.voucher_number, "draft discarded");
        Ok(())
    }

    /// Fetches a voucher with its lines.
    ///
    /// # Errors
    ///
    /// `VoucherNotFound` or a database error.
    pub async fn get_voucher(&self, id: VoucherId) -> Result<JournalVoucher, LedgerError> {
        load_voucher(&self.db, id).await
    }

    /// Fetches a voucher by its `JV-YYYYMM-NNNNNN` number.
    ///
    /// # Errors
    ///
    /// `VoucherNotFound` or a database error.
    pub async fn get_voucher_by_number(&self, number: &str) -> Result<JournalVoucher, LedgerError> {
        let header = journal_vouchers::Entity::find()
            .filter(journal_vouchers::Column::VoucherNumber.eq(number))
            .one(&self.db)
            .await
            .or_db(LedgerError::Database)?
            .ok_or_else(|| LedgerError::VoucherNotFound(number.to_string()))?;
        with_lines(&self.db, header).await
    }

    /// Lists vouchers newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_vouchers(
        &self,
        filter: &VoucherFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<JournalVoucher>, LedgerError> {
        let mut query = journal_vouchers::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(
                journal_vouchers::Column::Status.eq(sea_orm_active_enums::VoucherStatus::from(status)),
            );
        }
        if let Some(from) = filter.date_from {
            query = query.filter(journal_vouchers::Column::VoucherDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(journal_vouchers::Column::VoucherDate.lte(to));
        }

        let total = query.clone().count(&self.db).await.or_db(LedgerError::Database)?;
        let headers = query
            .order_by_desc(journal_vouchers::Column::VoucherDate)
            .order_by_desc(journal_vouchers::Column::VoucherNumber)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .or_db(LedgerError::Database)?;

        let mut data = Vec::with_capacity(headers.len());
        for header in headers {
            data.push(with_lines(&self.db, header).await?);
        }
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

/// Header fields and resolved lines of a voucher about to be stored.
struct NewVoucher {
    date: NaiveDate,
    description: String,
    reference: Option<String>,
    lines: Vec<JournalLine>,
    links: VoucherLinks,
}

/// Validates `input` against current accounts and stores it as a draft.
pub(crate) async fn stage_voucher_in<C: ConnectionTrait>(
    conn: &C,
    base: Currency,
    input: &StageVoucherInput,
    links: VoucherLinks,
) -> Result<JournalVoucher, LedgerError> {
    let ids: Vec<AccountId> = input.lines.iter().map(|l| l.account_id).collect();
    let infos = account::account_infos(conn, &ids)
        .await
        .or_db(LedgerError::Database)?;

    let (lines, _totals) = LedgerService::validate_and_resolve(input, base, |id| infos.get(&id).copied())
        .inspect_err(|e| warn!(error = %e, "voucher rejected"))?;

    insert_voucher(
        conn,
        NewVoucher {
            date: input.date,
            description: input.description.trim().to_string(),
            reference: input.reference.clone(),
            lines,
            links,
        },
    )
    .await
    .or_db(LedgerError::Database)
}

/// Posts a draft: re-validates, then flips the status under a version guard.
pub(crate) async fn post_voucher_in<C: ConnectionTrait>(
    conn: &C,
    base: Currency,
    id: VoucherId,
) -> Result<JournalVoucher, LedgerError> {
    let voucher = load_voucher(conn, id).await?;
    LedgerService::ensure_can_post(id, voucher.status)?;

    let ids: Vec<AccountId> = voucher.lines.iter().map(|l| l.account_id).collect();
    let infos = account::account_infos(conn, &ids)
        .await
        .or_db(LedgerError::Database)?;
    LedgerService::revalidate(&voucher.lines, base, |id| infos.get(&id).copied())
        .inspect_err(|e| warn!(voucher_id = %id, error = %e, "voucher failed re-validation"))?;

    let result = journal_vouchers::Entity::update_many()
        .col_expr(
            journal_vouchers::Column::Status,
            Expr::value(sea_orm_active_enums::VoucherStatus::Posted),
        )
        .col_expr(journal_vouchers::Column::PostedAt, Expr::value(Utc::now()))
        .col_expr(
            journal_vouchers::Column::Version,
            Expr::col(journal_vouchers::Column::Version).add(1),
        )
        .filter(journal_vouchers::Column::Id.eq(id.into_inner()))
        .filter(journal_vouchers::Column::Version.eq(voucher.version))
        .exec(conn)
        .await
        .or_db(LedgerError::Database)?;

    if result.rows_affected == 0 {
        warn!(voucher_id = %id, "lost posting race");
        let current = find_header(conn, id).await?;
        return Err(match VoucherStatus::from(current.status) {
            VoucherStatus::Posted => LedgerError::AlreadyPosted(id),
            VoucherStatus::Draft => LedgerError::StaleVersion(id),
        });
    }

    load_voucher(conn, id).await
}

async fn insert_voucher<C: ConnectionTrait>(
    conn: &C,
    voucher: NewVoucher,
) -> Result<JournalVoucher, DbErr> {
    let number = next_number(conn, voucher.date).await?;
    let id = VoucherId::new();

    journal_vouchers::ActiveModel {
        id: Set(id.into_inner()),
        voucher_number: Set(number.to_string()),
        voucher_date: Set(voucher.date),
        description: Set(voucher.description),
        reference: Set(voucher.reference),
        status: Set(sea_orm_active_enums::VoucherStatus::Draft),
        reverses_voucher_id: Set(voucher.links.reverses.map(VoucherId::into_inner)),
        settlement_id: Set(voucher.links.settlement_id.map(SettlementId::into_inner)),
        created_at: Set(Utc::now()),
        posted_at: Set(None),
        version: Set(1),
    }
    .insert(conn)
    .await?;

    let rows: Vec<journal_lines::ActiveModel> = voucher
        .lines
        .iter()
        .map(|line| journal_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            voucher_id: Set(id.into_inner()),
            line_no: Set(line.line_no),
            account_id: Set(line.account_id.into_inner()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            currency: Set(line.currency.code().to_string()),
            rate: Set(line.rate.normalize().to_string()),
            base_debit: Set(line.base_debit),
            base_credit: Set(line.base_credit),
            entity_id: Set(line.entity_id.map(EntityId::into_inner)),
            memo: Set(line.memo.clone()),
        })
        .collect();
    journal_lines::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;

    let header = journal_vouchers::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("voucher {id}")))?;
    Ok(to_voucher(header, voucher.lines))
}

/// Allocates the next number of `date`'s period inside the caller's
/// transaction; the row update serializes concurrent allocators.
async fn next_number<C: ConnectionTrait>(conn: &C, date: NaiveDate) -> Result<VoucherNumber, DbErr> {
    let period = VoucherNumber::period_key(date);

    voucher_sequences::Entity::insert(voucher_sequences::ActiveModel {
        period: Set(period.clone()),
        last_value: Set(0),
    })
    .on_conflict(
        OnConflict::column(voucher_sequences::Column::Period)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    voucher_sequences::Entity::update_many()
        .col_expr(
            voucher_sequences::Column::LastValue,
            Expr::col(voucher_sequences::Column::LastValue).add(1),
        )
        .filter(voucher_sequences::Column::Period.eq(period.as_str()))
        .exec(conn)
        .await?;

    let row = voucher_sequences::Entity::find_by_id(period.clone())
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("voucher sequence {period}")))?;
    Ok(VoucherNumber::new(date, row.last_value))
}

async fn find_header<C: ConnectionTrait>(
    conn: &C,
    id: VoucherId,
) -> Result<journal_vouchers::Model, LedgerError> {
    journal_vouchers::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(LedgerError::Database)?
        .ok_or_else(|| LedgerError::VoucherNotFound(id.to_string()))
}

pub(crate) async fn load_voucher<C: ConnectionTrait>(
    conn: &C,
    id: VoucherId,
) -> Result<JournalVoucher, LedgerError> {
    let header = find_header(conn, id).await?;
    with_lines(conn, header).await
}

async fn with_lines<C: ConnectionTrait>(
    conn: &C,
    header: journal_vouchers::Model,
) -> Result<JournalVoucher, LedgerError> {
    let rows = journal_lines::Entity::find()
        .filter(journal_lines::Column::VoucherId.eq(header.id))
        .order_by_asc(journal_lines::Column::LineNo)
        .all(conn)
        .await
        .or_db(LedgerError::Database)?;
    let lines = rows
        .into_iter()
        .map(to_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(to_voucher(header, lines))
}

fn to_voucher(header: journal_vouchers::Model, lines: Vec<JournalLine>) -> JournalVoucher {
    JournalVoucher {
        id: header.id.into(),
        voucher_number: header.voucher_number,
        date: header.voucher_date,
        description: header.description,
        reference: header.reference,
        status: header.status.into(),
        reverses_voucher_id: header.reverses_voucher_id.map(VoucherId::from),
        settlement_id: header.settlement_id.map(SettlementId::from),
        lines,
        created_at: header.created_at,
        posted_at: header.posted_at,
        version: header.version,
    }
}

fn to_line(row: journal_lines::Model) -> Result<JournalLine, LedgerError> {
    let currency = Currency::from_str(&row.currency)
        .map_err(|_| LedgerError::Database(format!("unknown currency '{}' on line {}", row.currency, row.id)))?;
    let rate = Decimal::from_str(&row.rate)
        .map_err(|_| LedgerError::Database(format!("unreadable rate '{}' on line {}", row.rate, row.id)))?;
    Ok(JournalLine {
        line_no: row.line_no,
        account_id: row.account_id.into(),
        debit: row.debit,
        credit: row.credit,
        currency,
        rate,
        base_debit: row.base_debit,
        base_credit: row.base_credit,
        entity_id: row.entity_id.map(EntityId::from),
        memo: row.memo,
    })
}

/// Which posted lines a caller wants.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PostedLineFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub entity_id: Option<EntityId>,
    /// Leave out vouchers produced by settlement approval.
    pub exclude_settlements: bool,
}

/// Lines of posted vouchers matching `filter`.
pub(crate) async fn posted_lines<C: ConnectionTrait>(
    conn: &C,
    filter: PostedLineFilter,
) -> Result<Vec<journal_lines::Model>, DbErr> {
    let mut query = journal_lines::Entity::find()
        .inner_join(journal_vouchers::Entity)
        .filter(journal_vouchers::Column::Status.eq(sea_orm_active_enums::VoucherStatus::Posted));
    if let Some(from) = filter.date_from {
        query = query.filter(journal_vouchers::Column::VoucherDate.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(journal_vouchers::Column::VoucherDate.lte(to));
    }
    if let Some(entity_id) = filter.entity_id {
        query = query.filter(journal_lines::Column::EntityId.eq(entity_id.into_inner()));
    }
    if filter.exclude_settlements {
        query = query.filter(journal_vouchers::Column::SettlementId.is_null());
    }
    query.all(conn).await
}

/// Posted base totals over the given accounts.
pub(crate) async fn posted_totals<C: ConnectionTrait>(
    conn: &C,
    accounts: &[AccountId],
) -> Result<VoucherTotals, DbErr> {
    let ids: Vec<Uuid> = accounts.iter().map(|id| id.into_inner()).collect();
    let rows = journal_lines::Entity::find()
        .inner_join(journal_vouchers::Entity)
        .filter(journal_vouchers::Column::Status.eq(sea_orm_active_enums::VoucherStatus::Posted))
        .filter(journal_lines::Column::AccountId.is_in(ids))
        .all(conn)
        .await?;
    Ok(rows.iter().fold(VoucherTotals::default(), |acc, row| VoucherTotals {
        base_debit: acc.base_debit.saturating_add(row.base_debit),
        base_credit: acc.base_credit.saturating_add(row.base_credit),
    }))
}

//! Payout batch validation and lifecycle.

use std::collections::HashSet;

use uuid::Uuid;

use super::error::PayoutError;
use super::types::{BatchStatus, CompletionPlan, ItemOutcome, ItemSource, PayoutItemInput, SourceState};
use crate::commission::{CommissionService, CommissionStatus};
use crate::settlement::SettlementStatus;

/// Stateless service for payout batches.
pub struct PayoutService;

impl PayoutService {
    /// Validate requested items: at least one, no source twice.
    ///
    /// # Errors
    ///
    /// `EmptyBatch` or `DuplicateItem`.
    pub fn validate_items(items: &[PayoutItemInput]) -> Result<(), PayoutError> {
        if items.is_empty() {
            return Err(PayoutError::EmptyBatch);
        }
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert((item.source, item.source_id)) {
                return Err(PayoutError::DuplicateItem {
                    kind: item.source,
                    source_id: item.source_id,
                });
            }
        }
        Ok(())
    }

    /// True if the source can be paid now.
    ///
    /// A commission must be pending or approved. A settlement must be
    /// approved and every commission it claims still approved.
    #[must_use]
    pub fn is_payable(state: &SourceState) -> bool {
        match state {
            SourceState::Commission(status) => CommissionService::is_payable(*status),
            SourceState::Settlement {
                status,
                commissions,
            } => {
                *status == SettlementStatus::Approved
                    && commissions.iter().all(|c| *c == CommissionStatus::Approved)
            }
        }
    }

    /// Require the source to be payable.
    ///
    /// # Errors
    ///
    /// `ItemNoLongerPayable` otherwise.
    pub fn check_payable(
        kind: ItemSource,
        source_id: Uuid,
        state: &SourceState,
    ) -> Result<(), PayoutError> {
        if Self::is_payable(state) {
            Ok(())
        } else {
            Err(PayoutError::ItemNoLongerPayable { kind, source_id })
        }
    }

    /// Require a positive snapshot amount.
    ///
    /// # Errors
    ///
    /// `NonPositiveAmount` otherwise.
    pub const fn check_amount(kind: ItemSource, source_id: Uuid, amount: i64) -> Result<i64, PayoutError> {
        if amount > 0 {
            Ok(amount)
        } else {
            Err(PayoutError::NonPositiveAmount {
                kind,
                source_id,
                amount,
            })
        }
    }

    /// Batch total.
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if the sum exceeds `i64`.
    pub fn total(amounts: impl IntoIterator<Item = i64>) -> Result<i64, PayoutError> {
        amounts
            .into_iter()
            .try_fold(0i64, i64::checked_add)
            .ok_or(PayoutError::AmountOverflow)
    }

    /// Approve a created batch.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the batch is `Created`.
    pub const fn approve(current: BatchStatus) -> Result<BatchStatus, PayoutError> {
        match current {
            BatchStatus::Created => Ok(BatchStatus::Approved),
            _ => Err(PayoutError::InvalidTransition {
                from: current,
                to: BatchStatus::Approved,
            }),
        }
    }

    /// Decide what completing the batch involves.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` for batches still `Created`.
    pub const fn plan_completion(current: BatchStatus) -> Result<CompletionPlan, PayoutError> {
        match current {
            BatchStatus::Approved => Ok(CompletionPlan::Process),
            BatchStatus::Completed => Ok(CompletionPlan::AlreadyCompleted),
            BatchStatus::Created => Err(PayoutError::InvalidTransition {
                from: current,
                to: BatchStatus::Completed,
            }),
        }
    }

    /// Outcome for one item at completion time.
    #[must_use]
    pub fn item_outcome(state: &SourceState) -> ItemOutcome {
        if Self::is_payable(state) {
            ItemOutcome::Paid
        } else {
            ItemOutcome::Skipped
        }
    }
}

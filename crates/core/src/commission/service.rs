//! Commission plan validation, rule evaluation and status transitions.

use std::collections::HashSet;

use super::error::CommissionError;
use super::types::{
    Beneficiary, CommissionPlan, CommissionStatus, CreatePlanInput, NewCommission, TriggerContext,
};

/// Stateless service for the commission engine.
pub struct CommissionService;

impl CommissionService {
    /// Validate a new plan.
    ///
    /// # Errors
    ///
    /// - `InvalidPlanInput` for an empty name, no rules or an empty trigger
    /// - `DuplicateRuleTrigger` if two rules share a trigger
    /// - `InvalidRuleAmount` if an amount is not positive
    pub fn validate_plan(input: &CreatePlanInput) -> Result<(), CommissionError> {
        if input.name.trim().is_empty() {
            return Err(CommissionError::InvalidPlanInput(
                "name must not be empty".to_string(),
            ));
        }
        if input.rules.is_empty() {
            return Err(CommissionError::InvalidPlanInput(
                "a plan needs at least one rule".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &input.rules {
            let trigger = rule.trigger.trim();
            if trigger.is_empty() || trigger.len() != rule.trigger.len() {
                return Err(CommissionError::InvalidPlanInput(format!(
                    "invalid trigger '{}'",
                    rule.trigger
                )));
            }
            if !seen.insert(trigger) {
                return Err(CommissionError::DuplicateRuleTrigger(trigger.to_string()));
            }
            if rule.amount <= 0 {
                return Err(CommissionError::InvalidRuleAmount {
                    trigger: trigger.to_string(),
                    amount: rule.amount,
                });
            }
        }
        Ok(())
    }

    /// Validate an incoming trigger event.
    ///
    /// # Errors
    ///
    /// `InvalidTriggerInput` for an empty event name or source order.
    pub fn validate_trigger(event_name: &str, context: &TriggerContext) -> Result<(), CommissionError> {
        if event_name.trim().is_empty() {
            return Err(CommissionError::InvalidTriggerInput(
                "event name must not be empty".to_string(),
            ));
        }
        if context
            .source_order_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(CommissionError::InvalidTriggerInput(
                "source order id must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Commissions one beneficiary earns from an event: one per matching
    /// rule of every active plan.
    #[must_use]
    pub fn commissions_for(
        plans: &[CommissionPlan],
        event_name: &str,
        beneficiary: Beneficiary,
        source_order_id: Option<&str>,
    ) -> Vec<NewCommission> {
        plans
            .iter()
            .filter(|plan| plan.active)
            .flat_map(|plan| {
                plan.rules
                    .iter()
                    .filter(|rule| rule.matches(event_name, beneficiary.beneficiary_type))
                    .map(|rule| NewCommission {
                        plan_id: plan.id,
                        trigger: rule.trigger.clone(),
                        amount: rule.amount,
                        beneficiary,
                        source_order_id: source_order_id.map(str::to_string),
                    })
            })
            .collect()
    }

    /// Approve a pending commission.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the commission is pending.
    pub const fn approve(current: CommissionStatus) -> Result<CommissionStatus, CommissionError> {
        match current {
            CommissionStatus::Pending => Ok(CommissionStatus::Approved),
            _ => Err(CommissionError::InvalidTransition {
                from: current,
                to: CommissionStatus::Approved,
            }),
        }
    }

    /// Cancel a commission that has not been paid.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from `Paid` or `Cancelled`.
    pub const fn cancel(current: CommissionStatus) -> Result<CommissionStatus, CommissionError> {
        match current {
            CommissionStatus::Pending | CommissionStatus::Approved => Ok(CommissionStatus::Cancelled),
            _ => Err(CommissionError::InvalidTransition {
                from: current,
                to: CommissionStatus::Cancelled,
            }),
        }
    }

    /// Mark a commission paid by a completed batch.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from `Paid` or `Cancelled`.
    pub const fn mark_paid(current: CommissionStatus) -> Result<CommissionStatus, CommissionError> {
        match current {
            CommissionStatus::Pending | CommissionStatus::Approved => Ok(CommissionStatus::Paid),
            _ => Err(CommissionError::InvalidTransition {
                from: current,
                to: CommissionStatus::Paid,
            }),
        }
    }

    /// True if the commission can still be paid on its own.
    #[must_use]
    pub const fn is_payable(current: CommissionStatus) -> bool {
        matches!(current, CommissionStatus::Pending | CommissionStatus::Approved)
    }
}

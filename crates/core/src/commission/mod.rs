//! Commission plans, trigger evaluation and the commission lifecycle.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::CommissionError;
pub use service::CommissionService;
pub use types::{
    Beneficiary, BeneficiaryType, Commission, CommissionFilter, CommissionPlan, CommissionRule,
    CommissionStatus, CreatePlanInput, NewCommission, TriggerContext, TriggerKey,
};

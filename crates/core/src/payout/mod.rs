//! Payout batches: snapshot, approve, complete.

pub mod error;
pub mod service;
pub mod types;

pub use error::PayoutError;
pub use service::PayoutService;
pub use types::{
    BatchFilter, BatchStatus, CompletionPlan, ItemOutcome, ItemSource, PayoutBatch, PayoutItem,
    PayoutItemInput, SourceState,
};

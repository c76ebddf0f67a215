//! Shared types, errors, and configuration for Mizan.
//!
//! This crate provides common types used across all other crates:
//! - Money in integer minor units plus the supported currencies
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Error categories and the application-wide error type
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorCategory};
pub use types::*;

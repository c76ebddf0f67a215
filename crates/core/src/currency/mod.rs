//! Currency conversion into the base (reporting) currency.
//!
//! Pure and stateless: conversions are called inside voucher validation
//! without any locking.

pub mod error;
pub mod service;

#[cfg(test)]
mod props;

pub use error::CurrencyError;
pub use service::CurrencyService;

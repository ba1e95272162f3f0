//! Papertrade Core - Domain entities, services, and traits.
//!
//! This crate contains the portfolio ledger and trade-settlement engine of
//! the simulator. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod agent;
pub mod constants;
pub mod errors;
pub mod import;
pub mod portfolio;
pub mod pricing;
pub mod sessions;
pub mod tickers;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export common types from the portfolio module
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::LedgerError;
pub use errors::Result;

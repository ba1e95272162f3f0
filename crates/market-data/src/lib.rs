//! Papertrade Market Data Crate
//!
//! Provider-agnostic quote fetching for the simulator. The core crate wraps a
//! [`MarketDataProvider`] in its own caching price source, so providers here
//! stay stateless apart from their HTTP clients.
//!
//! # Core Types
//!
//! - [`Quote`] - A daily or intraday OHLCV quote
//! - [`MarketDataProvider`] - Trait implemented by every quote source
//! - [`MarketDataError`] - Provider failures, classified by [`RetryClass`]

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::Quote;
pub use provider::yahoo::YahooProvider;
pub use provider::MarketDataProvider;

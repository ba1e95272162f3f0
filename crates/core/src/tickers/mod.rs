//! Tradable-ticker registry.

mod static_registry;
mod tickers_model;
mod tickers_traits;

pub use static_registry::StaticTickerRegistry;
pub use tickers_model::{normalize_ticker, Stock};
pub use tickers_traits::{StockRepositoryTrait, TickerRegistryTrait};

//! Market data provider trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::Quote;

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source.
/// Providers do not cache; callers wrap them in a caching price source.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider, e.g. "YAHOO".
    fn id(&self) -> &'static str;

    /// Fetch the most recent quote for a symbol.
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch daily quotes with timestamps in `[start, end)`.
    ///
    /// Returns [`MarketDataError::NoDataForRange`] when the symbol is known
    /// but nothing traded inside the range.
    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>, MarketDataError>;
}

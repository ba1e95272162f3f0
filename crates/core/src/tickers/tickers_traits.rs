use async_trait::async_trait;

use super::tickers_model::Stock;
use crate::errors::Result;

/// Read access to the set of tickers the simulator may trade.
pub trait TickerRegistryTrait: Send + Sync {
    fn is_tradable(&self, ticker: &str) -> Result<bool>;

    fn get_stock(&self, ticker: &str) -> Result<Option<Stock>>;

    /// All tradable stocks ordered by symbol.
    fn list_stocks(&self) -> Result<Vec<Stock>>;
}

/// A registry backed by persistent storage.
#[async_trait]
pub trait StockRepositoryTrait: TickerRegistryTrait {
    /// Inserts or renames the given stocks. Returns the number of rows written.
    async fn upsert_stocks(&self, stocks: Vec<Stock>) -> Result<usize>;
}

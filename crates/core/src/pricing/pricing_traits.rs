use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::Result;

/// Resolves tickers to closing prices.
///
/// Failures are reported as [`LedgerError::PriceUnavailable`](crate::errors::LedgerError),
/// never as a fallback to a neighbouring day.
#[async_trait]
pub trait PriceSourceTrait: Send + Sync {
    /// Closing price of `ticker` on `date`.
    async fn get_price(&self, ticker: &str, date: NaiveDate) -> Result<Decimal>;

    /// Most recent known price of `ticker`.
    async fn get_latest_price(&self, ticker: &str) -> Result<Decimal>;
}

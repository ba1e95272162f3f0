use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use dashmap::DashMap;
use log::{debug, warn};
use rust_decimal::Decimal;

use papertrade_market_data::{MarketDataError, MarketDataProvider, RetryClass};

use super::pricing_traits::PriceSourceTrait;
use crate::constants::DEFAULT_QUOTE_TTL_SECS;
use crate::errors::{LedgerError, Result};

const NO_TRADING_DATA: &str = "no trading data for this date";

/// Maps a provider failure to `PriceUnavailable`, keeping "the day has no
/// close" apart from failures worth retrying.
fn unavailable(ticker: &str, date: Option<NaiveDate>, err: MarketDataError) -> LedgerError {
    if err.is_missing_data() {
        let reason = match date {
            Some(_) => NO_TRADING_DATA.to_string(),
            None => err.to_string(),
        };
        return LedgerError::price_unavailable(ticker, date, reason);
    }
    match err.retry_class() {
        RetryClass::WithBackoff => {
            warn!("Transient price failure for {}: {}", ticker, err);
            LedgerError::price_unavailable(ticker, date, format!("temporarily unavailable: {}", err))
        }
        RetryClass::Never => LedgerError::price_unavailable(ticker, date, err.to_string()),
    }
}

/// Price source backed by a market-data provider.
///
/// Historical closes never change once a day has traded, so they are kept
/// until explicitly invalidated. Latest quotes expire after `ttl`.
pub struct CachedPriceSource {
    provider: Arc<dyn MarketDataProvider>,
    closes: DashMap<(String, NaiveDate), Decimal>,
    latest: DashMap<String, (Decimal, Instant)>,
    ttl: Duration,
}

impl CachedPriceSource {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_ttl(provider, Duration::from_secs(DEFAULT_QUOTE_TTL_SECS))
    }

    pub fn with_ttl(provider: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            closes: DashMap::new(),
            latest: DashMap::new(),
            ttl,
        }
    }

    /// Drops every cached price for `ticker`.
    pub fn invalidate(&self, ticker: &str) {
        self.latest.remove(ticker);
        self.closes.retain(|(cached, _), _| cached != ticker);
    }

    pub fn clear(&self) {
        self.latest.clear();
        self.closes.clear();
    }
}

#[async_trait]
impl PriceSourceTrait for CachedPriceSource {
    async fn get_price(&self, ticker: &str, date: NaiveDate) -> Result<Decimal> {
        let key = (ticker.to_string(), date);
        if let Some(close) = self.closes.get(&key) {
            return Ok(*close);
        }

        let start = date.and_time(NaiveTime::default()).and_utc();
        let end = start + chrono::Duration::days(1);
        debug!(
            "Fetching {} close for {} from {}",
            ticker,
            date,
            self.provider.id()
        );
        let quotes = self
            .provider
            .get_historical_quotes(ticker, start, end)
            .await
            .map_err(|e| unavailable(ticker, Some(date), e))?;

        let close = quotes
            .iter()
            .find(|q| q.day() == date)
            .map(|q| q.close)
            .ok_or_else(|| LedgerError::price_unavailable(ticker, Some(date), NO_TRADING_DATA))?;

        self.closes.insert(key, close);
        Ok(close)
    }

    async fn get_latest_price(&self, ticker: &str) -> Result<Decimal> {
        if let Some(entry) = self.latest.get(ticker) {
            let (price, fetched_at) = *entry;
            if fetched_at.elapsed() < self.ttl {
                return Ok(price);
            }
        }

        let quote = self
            .provider
            .get_latest_quote(ticker)
            .await
            .map_err(|e| unavailable(ticker, None, e))?;
        self.latest
            .insert(ticker.to_string(), (quote.close, Instant::now()));
        Ok(quote.close)
    }
}

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::pricing_traits::PriceSourceTrait;
use crate::errors::{Error, LedgerError, Result, ValidationError};
use crate::tickers::normalize_ticker;

#[derive(Debug, Deserialize)]
struct PriceRow {
    ticker: String,
    date: String,
    close: String,
}

/// Fixed (ticker, date) -> close table.
///
/// Used for deterministic replays and tests. The latest price of a ticker is
/// the close on its most recent date in the table.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    closes: HashMap<(String, NaiveDate), Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: &str, date: NaiveDate, close: Decimal) {
        self.closes.insert((normalize_ticker(ticker), date), close);
    }

    pub fn with_close(mut self, ticker: &str, date: NaiveDate, close: Decimal) -> Self {
        self.insert(ticker, date, close);
        self
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Loads a `ticker,date,close` CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut table = Self::new();
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        for (index, record) in rdr.deserialize::<PriceRow>().enumerate() {
            // Row 1 is the header
            let row = index + 2;
            let record = record?;
            let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").map_err(|e| {
                Error::Validation(ValidationError::Csv {
                    row,
                    message: format!("invalid date '{}': {}", record.date, e),
                })
            })?;
            let close = Decimal::from_str(&record.close).map_err(|e| {
                Error::Validation(ValidationError::Csv {
                    row,
                    message: format!("invalid close '{}': {}", record.close, e),
                })
            })?;
            if close <= Decimal::ZERO {
                return Err(Error::Validation(ValidationError::Csv {
                    row,
                    message: format!("close must be positive, got {}", close),
                }));
            }
            table.insert(&record.ticker, date, close);
        }
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    fn lookup(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        self.closes.get(&(normalize_ticker(ticker), date)).copied()
    }
}

#[async_trait]
impl PriceSourceTrait for PriceTable {
    async fn get_price(&self, ticker: &str, date: NaiveDate) -> Result<Decimal> {
        self.lookup(ticker, date).ok_or_else(|| {
            LedgerError::price_unavailable(ticker, Some(date), "no trading data for this date")
                .into()
        })
    }

    async fn get_latest_price(&self, ticker: &str) -> Result<Decimal> {
        let ticker = normalize_ticker(ticker);
        self.closes
            .iter()
            .filter(|((t, _), _)| *t == ticker)
            .max_by_key(|((_, date), _)| *date)
            .map(|(_, close)| *close)
            .ok_or_else(|| LedgerError::price_unavailable(ticker, None, "unknown ticker").into())
    }
}

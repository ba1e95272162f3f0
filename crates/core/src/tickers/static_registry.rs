use std::collections::BTreeMap;

use super::tickers_model::{normalize_ticker, Stock};
use super::tickers_traits::TickerRegistryTrait;
use crate::constants::DEFAULT_UNIVERSE;
use crate::errors::Result;

/// In-memory registry built once at startup.
#[derive(Debug, Clone)]
pub struct StaticTickerRegistry {
    stocks: BTreeMap<String, Stock>,
}

impl StaticTickerRegistry {
    pub fn new(stocks: impl IntoIterator<Item = Stock>) -> Self {
        Self {
            stocks: stocks
                .into_iter()
                .map(|s| (s.symbol.clone(), s))
                .collect(),
        }
    }

    /// The built-in universe of popular large caps.
    pub fn default_universe() -> Self {
        Self::new(
            DEFAULT_UNIVERSE
                .iter()
                .map(|(symbol, name)| Stock::new(symbol, name)),
        )
    }

    /// Registry restricted to `symbols`. Names come from the built-in
    /// universe when known, otherwise the symbol is used.
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S]) -> Self {
        Self::new(symbols.iter().map(|s| {
            let symbol = normalize_ticker(s.as_ref());
            let name = DEFAULT_UNIVERSE
                .iter()
                .find(|(known, _)| *known == symbol)
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| symbol.clone());
            Stock { symbol, name }
        }))
    }

    pub fn stocks(&self) -> Vec<Stock> {
        self.stocks.values().cloned().collect()
    }
}

impl TickerRegistryTrait for StaticTickerRegistry {
    fn is_tradable(&self, ticker: &str) -> Result<bool> {
        Ok(self.stocks.contains_key(&normalize_ticker(ticker)))
    }

    fn get_stock(&self, ticker: &str) -> Result<Option<Stock>> {
        Ok(self.stocks.get(&normalize_ticker(ticker)).cloned())
    }

    fn list_stocks(&self) -> Result<Vec<Stock>> {
        Ok(self.stocks())
    }
}

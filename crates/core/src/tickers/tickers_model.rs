use serde::{Deserialize, Serialize};

/// A tradable stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub symbol: String,
    pub name: String,
}

impl Stock {
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: normalize_ticker(symbol),
            name: name.trim().to_string(),
        }
    }
}

/// Canonical ticker form: trimmed, upper case.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

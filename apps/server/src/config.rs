//! Server configuration, read from `PT_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use papertrade_core::constants::DEFAULT_QUOTE_TTL_SECS;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8088";
const DEFAULT_DB_PATH: &str = "./db/papertrade.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSourceKind {
    /// Live and historical closes from Yahoo Finance, cached in memory.
    Yahoo,
    /// Fixed closes loaded from `PT_PRICE_CSV`.
    Csv,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub price_source: PriceSourceKind,
    pub price_csv: Option<String>,
    pub quote_ttl: Duration,
    /// Overrides the built-in ticker universe when set.
    pub tickers: Option<Vec<String>>,
    /// Seconds between scheduler steps; 0 disables the scheduler.
    pub step_interval_secs: u64,
    pub cors_allow_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let listen_addr = std::env::var("PT_LISTEN_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| {
                DEFAULT_LISTEN_ADDR
                    .parse()
                    .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8088)))
            });
        let db_path = std::env::var("PT_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        let price_source = match std::env::var("PT_PRICE_SOURCE")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "csv" => PriceSourceKind::Csv,
            _ => PriceSourceKind::Yahoo,
        };
        let price_csv = std::env::var("PT_PRICE_CSV").ok().filter(|v| !v.is_empty());
        let quote_ttl = Duration::from_secs(parse_u64("PT_QUOTE_TTL_SECS", DEFAULT_QUOTE_TTL_SECS));
        let tickers = std::env::var("PT_TICKERS")
            .ok()
            .map(|v| split_list(&v))
            .filter(|list| !list.is_empty());
        let step_interval_secs = parse_u64("PT_STEP_INTERVAL_SECS", 0);
        let cors_allow_origins = std::env::var("PT_CORS_ALLOW_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec!["*".to_string()]);
        let request_timeout = Duration::from_millis(parse_u64("PT_REQUEST_TIMEOUT_MS", 30_000));

        Self {
            listen_addr,
            db_path,
            price_source,
            price_csv,
            quote_ttl,
            tickers,
            step_interval_secs,
            cors_allow_origins,
            request_timeout,
        }
    }
}

fn parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list(" AAPL, ,msft,"), vec!["AAPL", "msft"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_parse_u64_falls_back_on_garbage() {
        std::env::set_var("PT_TEST_PARSE_U64", "not-a-number");
        assert_eq!(parse_u64("PT_TEST_PARSE_U64", 7), 7);
        std::env::set_var("PT_TEST_PARSE_U64", " 42 ");
        assert_eq!(parse_u64("PT_TEST_PARSE_U64", 7), 42);
        std::env::remove_var("PT_TEST_PARSE_U64");
    }
}

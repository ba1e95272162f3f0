//! Portfolio valuation domain models.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Market value of one ticker's open lots on a valuation date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub ticker: String,
    pub shares: Decimal,
    pub price: Decimal,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_gain: Decimal,
}

/// Point-in-time breakdown of a portfolio: `total_value = cash +
/// investment_market_value`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub session_id: String,
    pub portfolio_id: String,
    pub valuation_date: NaiveDate,
    pub cash: Decimal,
    pub positions: Vec<PositionValuation>,
    pub investment_market_value: Decimal,
    pub cost_basis: Decimal,
    pub total_value: Decimal,
}

/// A recorded total-value snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioLog {
    pub id: String,
    pub portfolio_id: String,
    /// Simulated day the value was computed for.
    pub valuation_date: NaiveDate,
    pub total_value: Decimal,
    pub calculated_at: NaiveDateTime,
}

impl PortfolioLog {
    pub fn new(portfolio_id: &str, valuation_date: NaiveDate, total_value: Decimal) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            portfolio_id: portfolio_id.to_string(),
            valuation_date,
            total_value,
            calculated_at: Utc::now().naive_utc(),
        }
    }
}

/// Chart point: `x` is the simulated day, `y` the total value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuePoint {
    pub x: NaiveDate,
    pub y: Decimal,
}

impl From<&PortfolioLog> for ValuePoint {
    fn from(log: &PortfolioLog) -> Self {
        Self {
            x: log.valuation_date,
            y: log.total_value,
        }
    }
}

/// What `log_value` did with the computed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "log", rename_all = "camelCase")]
pub enum LogOutcome {
    /// A new snapshot was appended.
    Recorded(PortfolioLog),
    /// The latest snapshot had the same date; its value was overwritten.
    Replaced(PortfolioLog),
    /// The latest snapshot already carried this value; nothing was written.
    Unchanged(PortfolioLog),
}

impl LogOutcome {
    pub fn log(&self) -> &PortfolioLog {
        match self {
            LogOutcome::Recorded(log) | LogOutcome::Replaced(log) | LogOutcome::Unchanged(log) => {
                log
            }
        }
    }
}

/// Tally of a scheduled snapshot run over many sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRunSummary {
    pub recorded: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub failed: usize,
}

//! Session domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::{Error, Result};

/// A simulation run with its own cash, portfolio and simulated clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSession {
    pub id: String,
    pub name: String,
    /// Starting cash. The journal replays trades from this figure.
    pub amount: Decimal,
    pub use_twitter: bool,
    pub use_google: bool,
    pub use_price_history: bool,
    pub simulated_date: NaiveDate,
    /// Tickers this session may trade. Empty means the whole registry.
    pub tickers: Vec<String>,
    pub created_at: NaiveDateTime,
}

impl SimulationSession {
    /// False when the session restricts trading to a set that excludes `ticker`.
    pub fn allows(&self, ticker: &str) -> bool {
        self.tickers.is_empty() || self.tickers.iter().any(|t| t == ticker)
    }
}

/// Input model for creating a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub name: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub use_twitter: bool,
    #[serde(default)]
    pub use_google: bool,
    #[serde(default)]
    pub use_price_history: bool,
    /// First simulated day. Defaults to today; weekends roll forward.
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub tickers: Vec<String>,
}

impl NewSession {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Session name cannot be empty".to_string(),
                )));
            }
        }
        if self.amount <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Starting amount must be greater than 0, got {}",
                self.amount
            ))));
        }
        Ok(())
    }
}

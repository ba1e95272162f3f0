use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Error, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown trade action '{}'",
                other
            )))),
        }
    }
}

/// One executed trade. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLog {
    pub id: String,
    pub session_id: String,
    pub action: TradeAction,
    pub symbol: String,
    pub shares: Decimal,
    /// `shares * price_per_share`: cost of a buy, gross proceeds of a sale.
    pub total_price: Decimal,
    pub price_per_share: Decimal,
    /// Realized FIFO profit. Always zero for buys.
    pub profit: Decimal,
    pub rationale: String,
    /// Simulated trading day.
    pub trade_date: NaiveDate,
    pub recorded_at: NaiveDateTime,
}

impl TradeLog {
    #[allow(clippy::too_many_arguments)]
    fn new(
        session_id: &str,
        action: TradeAction,
        symbol: &str,
        shares: Decimal,
        price_per_share: Decimal,
        profit: Decimal,
        rationale: &str,
        trade_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            session_id: session_id.to_string(),
            action,
            symbol: symbol.to_string(),
            shares,
            total_price: shares * price_per_share,
            price_per_share,
            profit,
            rationale: rationale.to_string(),
            trade_date,
            recorded_at: Utc::now().naive_utc(),
        }
    }

    pub fn buy(
        session_id: &str,
        symbol: &str,
        shares: Decimal,
        price_per_share: Decimal,
        rationale: &str,
        trade_date: NaiveDate,
    ) -> Self {
        Self::new(
            session_id,
            TradeAction::Buy,
            symbol,
            shares,
            price_per_share,
            Decimal::ZERO,
            rationale,
            trade_date,
        )
    }

    pub fn sell(
        session_id: &str,
        symbol: &str,
        shares: Decimal,
        price_per_share: Decimal,
        profit: Decimal,
        rationale: &str,
        trade_date: NaiveDate,
    ) -> Self {
        Self::new(
            session_id,
            TradeAction::Sell,
            symbol,
            shares,
            price_per_share,
            profit,
            rationale,
            trade_date,
        )
    }

    /// Effect of this trade on cash.
    pub fn cash_delta(&self) -> Decimal {
        match self.action {
            TradeAction::Buy => -self.total_price,
            TradeAction::Sell => self.total_price,
        }
    }
}

/// Cash after replaying `entries` from the starting amount: buys debit their
/// total price, sells credit it.
pub fn replay_cash<'a>(starting: Decimal, entries: impl IntoIterator<Item = &'a TradeLog>) -> Decimal {
    entries
        .into_iter()
        .fold(starting, |cash, entry| cash + entry.cash_delta())
}

/// Comparison of the replayed cash with the balance cached on the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashReconciliation {
    pub session_id: String,
    pub replayed_cash: Decimal,
    pub cached_cash: Decimal,
    /// `cached_cash - replayed_cash`.
    pub drift: Decimal,
}

impl CashReconciliation {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_replay_cash_debits_buys_and_credits_sells() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let entries = vec![
            TradeLog::buy("s1", "AAPL", dec!(10), dec!(150), "r", day),
            TradeLog::sell("s1", "AAPL", dec!(4), dec!(160), dec!(40), "r", day),
        ];
        assert_eq!(entries[0].total_price, dec!(1500));
        assert_eq!(entries[0].profit, dec!(0));
        assert_eq!(replay_cash(dec!(10000), &entries), dec!(9140));
        assert_eq!(replay_cash(dec!(10000), &Vec::<TradeLog>::new()), dec!(10000));
    }

    #[test]
    fn test_action_round_trips_through_text() {
        assert_eq!("sell".parse::<TradeAction>().unwrap(), TradeAction::Sell);
        assert_eq!(TradeAction::Buy.to_string(), "buy");
        assert!("hold".parse::<TradeAction>().is_err());
    }
}

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shares of one ticker bought in a single trade.
///
/// A lot is reduced in place by partial sales and removed once fully consumed,
/// so `shares` is always positive for a stored lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: String,
    pub portfolio_id: String,
    pub session_id: String,
    pub ticker: String,
    pub shares: Decimal,
    pub purchase_price: Decimal,
    /// Simulated trading day of the purchase.
    pub purchase_date: NaiveDate,
    /// Wall-clock insertion time. Breaks FIFO ties between same-day lots.
    pub created_at: NaiveDateTime,
}

impl Lot {
    pub fn new(
        portfolio_id: &str,
        session_id: &str,
        ticker: &str,
        shares: Decimal,
        purchase_price: Decimal,
        purchase_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            portfolio_id: portfolio_id.to_string(),
            session_id: session_id.to_string(),
            ticker: ticker.to_string(),
            shares,
            purchase_price,
            purchase_date,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn cost_basis(&self) -> Decimal {
        self.shares * self.purchase_price
    }

    /// FIFO order: purchase date, then insertion time, then id.
    pub fn fifo_cmp(&self, other: &Lot) -> Ordering {
        self.purchase_date
            .cmp(&other.purchase_date)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A single mutation of the lot table, applied as part of a trade commit.
#[derive(Debug, Clone, PartialEq)]
pub enum LotChange {
    Open(Lot),
    Reduce {
        lot_id: String,
        remaining_shares: Decimal,
    },
    Close {
        lot_id: String,
    },
}

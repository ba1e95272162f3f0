use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::portfolio::journal::TradeLog;
use crate::portfolio::lots::LotChange;

/// Cash account of a session. Owns the session's lots.
///
/// `cash` is kept in step with the journal by every trade commit; the journal
/// replay remains the figure trades are checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub session_id: String,
    pub cash: Decimal,
    pub created_at: NaiveDateTime,
}

impl Portfolio {
    pub fn new(session_id: &str, cash: Decimal) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            session_id: session_id.to_string(),
            cash,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Everything one trade changes, applied by the repository in a single
/// transaction or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCommit {
    pub portfolio_id: String,
    pub session_id: String,
    pub cash_after: Decimal,
    pub lot_changes: Vec<LotChange>,
    pub trade: TradeLog,
}

/// Result of a successful sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub trade: TradeLog,
    /// Gross proceeds, `shares * sale price`.
    pub proceeds: Decimal,
    pub realized_profit: Decimal,
    /// True when a forced sale priced the shares at the last purchase price.
    pub used_fallback_price: bool,
}

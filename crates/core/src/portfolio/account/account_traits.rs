use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::account_model::{Portfolio, SaleReceipt, TradeCommit};
use crate::errors::Result;
use crate::portfolio::journal::TradeLog;
use crate::portfolio::lots::Lot;
use crate::portfolio::valuation::PortfolioValuation;

/// Trait defining the contract for portfolio persistence.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    /// Applies lot changes, the new cash balance and the journal entry in one
    /// transaction. Returns the stored journal entry.
    async fn commit_trade(&self, commit: TradeCommit) -> Result<TradeLog>;

    fn get_by_session(&self, session_id: &str) -> Result<Portfolio>;

    /// Open lots, optionally limited to one ticker, in FIFO order.
    fn get_open_lots(&self, portfolio_id: &str, ticker: Option<&str>) -> Result<Vec<Lot>>;
}

/// The operations a trading driver (scheduler, agent tools, HTTP) may call.
///
/// Every failing call leaves cash, lots and journal untouched.
#[async_trait]
pub trait PortfolioAccountTrait: Send + Sync {
    async fn buy(
        &self,
        session_id: &str,
        ticker: &str,
        shares: Decimal,
        as_of: NaiveDate,
        rationale: Option<&str>,
    ) -> Result<TradeLog>;

    /// With `force`, an untradable ticker is accepted and an unresolvable
    /// price falls back to the purchase price of the most recent lot.
    async fn sell(
        &self,
        session_id: &str,
        ticker: &str,
        shares: Decimal,
        as_of: NaiveDate,
        rationale: Option<&str>,
        force: bool,
    ) -> Result<SaleReceipt>;

    /// Cash according to the journal.
    fn get_cash(&self, session_id: &str) -> Result<Decimal>;

    /// Ticker -> total shares over open lots.
    fn get_holdings(&self, session_id: &str) -> Result<BTreeMap<String, Decimal>>;

    fn get_open_lots(&self, session_id: &str) -> Result<Vec<Lot>>;

    async fn get_total_value(&self, session_id: &str, as_of: NaiveDate) -> Result<Decimal>;

    async fn get_valuation(&self, session_id: &str, as_of: NaiveDate)
        -> Result<PortfolioValuation>;
}

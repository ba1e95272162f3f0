//! In-memory repositories and fixtures shared by the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::errors::{DatabaseError, Error, Result};
use crate::portfolio::{
    Lot, LotChange, Portfolio, PortfolioAccount, PortfolioLog, PortfolioLogRepositoryTrait,
    PortfolioRepositoryTrait, TradeCommit, TradeJournalRepositoryTrait, TradeLog,
};
use crate::pricing::PriceTable;
use crate::sessions::{SessionRepositoryTrait, SimulationSession};
use crate::tickers::StaticTickerRegistry;

#[derive(Default)]
struct State {
    sessions: Vec<SimulationSession>,
    portfolios: HashMap<String, Portfolio>,
    lots: Vec<Lot>,
    trades: Vec<TradeLog>,
    logs: Vec<PortfolioLog>,
}

/// Implements every repository trait over one mutex-guarded state, with
/// trade commits applied all-or-nothing.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_commits: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `commit_trade` fail.
    pub fn fail_commits(&self) {
        self.fail_commits.store(true, Ordering::SeqCst);
    }

    /// Writes a journal entry without touching lots or cash.
    pub fn append_trade(&self, trade: TradeLog) {
        self.state.lock().unwrap().trades.push(trade);
    }

    pub fn lot_count(&self) -> usize {
        self.state.lock().unwrap().lots.len()
    }

    pub fn trade_count(&self) -> usize {
        self.state.lock().unwrap().trades.len()
    }
}

#[async_trait]
impl SessionRepositoryTrait for InMemoryStore {
    async fn create(
        &self,
        session: SimulationSession,
        portfolio: Portfolio,
    ) -> Result<SimulationSession> {
        let mut state = self.state.lock().unwrap();
        state
            .portfolios
            .insert(session.id.clone(), portfolio);
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn update_simulated_date(
        &self,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<SimulationSession> {
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        session.simulated_date = date;
        Ok(session.clone())
    }

    async fn delete(&self, session_id: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.id != session_id);
        if let Some(portfolio) = state.portfolios.remove(session_id) {
            state.logs.retain(|l| l.portfolio_id != portfolio.id);
        }
        state.lots.retain(|l| l.session_id != session_id);
        state.trades.retain(|t| t.session_id != session_id);
        Ok(before - state.sessions.len())
    }

    fn get_by_id(&self, session_id: &str) -> Result<SimulationSession> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    fn get_by_name(&self, name: &str) -> Result<Option<SimulationSession>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.name == name)
            .cloned())
    }

    fn list(&self) -> Result<Vec<SimulationSession>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .rev()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PortfolioRepositoryTrait for InMemoryStore {
    async fn commit_trade(&self, commit: TradeCommit) -> Result<TradeLog> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(DatabaseError::TransactionFailed("injected failure".to_string()).into());
        }
        let mut state = self.state.lock().unwrap();
        if !state.portfolios.contains_key(&commit.session_id) {
            return Err(DatabaseError::NotFound(commit.portfolio_id).into());
        }

        let mut lots = state.lots.clone();
        for change in commit.lot_changes {
            match change {
                LotChange::Open(lot) => lots.push(lot),
                LotChange::Reduce {
                    lot_id,
                    remaining_shares,
                } => {
                    let lot = lots
                        .iter_mut()
                        .find(|l| l.id == lot_id)
                        .ok_or(DatabaseError::NotFound(lot_id))?;
                    lot.shares = remaining_shares;
                }
                LotChange::Close { lot_id } => {
                    let before = lots.len();
                    lots.retain(|l| l.id != lot_id);
                    if lots.len() == before {
                        return Err(DatabaseError::NotFound(lot_id).into());
                    }
                }
            }
        }

        state.lots = lots;
        if let Some(portfolio) = state.portfolios.get_mut(&commit.session_id) {
            portfolio.cash = commit.cash_after;
        }
        state.trades.push(commit.trade.clone());
        Ok(commit.trade)
    }

    fn get_by_session(&self, session_id: &str) -> Result<Portfolio> {
        self.state
            .lock()
            .unwrap()
            .portfolios
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    fn get_open_lots(&self, portfolio_id: &str, ticker: Option<&str>) -> Result<Vec<Lot>> {
        let mut lots: Vec<Lot> = self
            .state
            .lock()
            .unwrap()
            .lots
            .iter()
            .filter(|l| l.portfolio_id == portfolio_id)
            .filter(|l| ticker.map_or(true, |t| l.ticker == t))
            .cloned()
            .collect();
        lots.sort_by(|a, b| a.fifo_cmp(b));
        Ok(lots)
    }
}

impl TradeJournalRepositoryTrait for InMemoryStore {
    fn list_by_session(&self, session_id: &str) -> Result<Vec<TradeLog>> {
        let mut trades: Vec<TradeLog> = self
            .state
            .lock()
            .unwrap()
            .trades
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect();
        trades.sort_by(|a, b| {
            a.trade_date
                .cmp(&b.trade_date)
                .then_with(|| a.recorded_at.cmp(&b.recorded_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(trades)
    }
}

#[async_trait]
impl PortfolioLogRepositoryTrait for InMemoryStore {
    async fn insert_log(&self, log: PortfolioLog) -> Result<PortfolioLog> {
        self.state.lock().unwrap().logs.push(log.clone());
        Ok(log)
    }

    async fn update_log_value(&self, log_id: &str, total_value: Decimal) -> Result<PortfolioLog> {
        let mut state = self.state.lock().unwrap();
        let log = state
            .logs
            .iter_mut()
            .find(|l| l.id == log_id)
            .ok_or_else(|| DatabaseError::NotFound(log_id.to_string()))?;
        log.total_value = total_value;
        Ok(log.clone())
    }

    async fn delete_logs(&self, log_ids: Vec<String>) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let before = state.logs.len();
        state.logs.retain(|l| !log_ids.contains(&l.id));
        Ok(before - state.logs.len())
    }

    fn get_latest_log(&self, portfolio_id: &str) -> Result<Option<PortfolioLog>> {
        Ok(self.get_logs(portfolio_id)?.pop())
    }

    fn get_logs(&self, portfolio_id: &str) -> Result<Vec<PortfolioLog>> {
        let mut logs: Vec<PortfolioLog> = self
            .state
            .lock()
            .unwrap()
            .logs
            .iter()
            .filter(|l| l.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.valuation_date);
        Ok(logs)
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

/// Creates a session on Thursday 2024-03-14 that may trade anything in the
/// registry.
pub async fn seeded_session(store: &Arc<InMemoryStore>, amount: Decimal) -> SimulationSession {
    let session = SimulationSession {
        id: Uuid::now_v7().to_string(),
        name: format!("session-{}", Uuid::new_v4()),
        amount,
        use_twitter: false,
        use_google: false,
        use_price_history: true,
        simulated_date: day(14),
        tickers: Vec::new(),
        created_at: Utc::now().naive_utc(),
    };
    let portfolio = Portfolio::new(&session.id, amount);
    SessionRepositoryTrait::create(store.as_ref(), session, portfolio)
        .await
        .unwrap()
}

/// Closes for 14-19 March 2024. The 16th and 17th are a weekend.
pub fn price_table() -> PriceTable {
    PriceTable::new()
        .with_close("AAPL", day(14), dec!(10))
        .with_close("AAPL", day(15), dec!(20))
        .with_close("AAPL", day(18), dec!(30))
        .with_close("AAPL", day(19), dec!(25))
        .with_close("MSFT", day(14), dec!(400))
        .with_close("MSFT", day(15), dec!(410))
        .with_close("MSFT", day(18), dec!(420))
        .with_close("MSFT", day(19), dec!(415))
}

pub fn account_with(
    store: &Arc<InMemoryStore>,
    registry: StaticTickerRegistry,
    prices: PriceTable,
) -> PortfolioAccount {
    PortfolioAccount::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(registry),
        Arc::new(prices),
    )
}

pub fn account(store: &Arc<InMemoryStore>) -> PortfolioAccount {
    account_with(store, StaticTickerRegistry::default_universe(), price_table())
}

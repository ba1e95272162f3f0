use std::sync::Arc;

use log::warn;
use rust_decimal::Decimal;

use super::journal_model::{replay_cash, CashReconciliation, TradeLog};
use super::journal_traits::TradeJournalRepositoryTrait;
use crate::errors::Result;
use crate::portfolio::account::PortfolioRepositoryTrait;
use crate::sessions::SessionRepositoryTrait;

/// Queries over the trade journal of a session.
///
/// The replayed journal is the authoritative cash balance; the figure stored
/// on the portfolio is a cache that [`reconcile_cash`](Self::reconcile_cash)
/// checks against it.
pub struct TradeJournal {
    sessions: Arc<dyn SessionRepositoryTrait>,
    portfolios: Arc<dyn PortfolioRepositoryTrait>,
    journal: Arc<dyn TradeJournalRepositoryTrait>,
}

impl TradeJournal {
    pub fn new(
        sessions: Arc<dyn SessionRepositoryTrait>,
        portfolios: Arc<dyn PortfolioRepositoryTrait>,
        journal: Arc<dyn TradeJournalRepositoryTrait>,
    ) -> Self {
        Self {
            sessions,
            portfolios,
            journal,
        }
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<TradeLog>> {
        // Surface a missing session instead of an empty history
        self.sessions.get_by_id(session_id)?;
        self.journal.list_by_session(session_id)
    }

    /// Starting amount minus buys plus sells.
    pub fn cash(&self, session_id: &str) -> Result<Decimal> {
        let session = self.sessions.get_by_id(session_id)?;
        let entries = self.journal.list_by_session(session_id)?;
        Ok(replay_cash(session.amount, &entries))
    }

    pub fn realized_profit(&self, session_id: &str) -> Result<Decimal> {
        Ok(self.history(session_id)?.iter().map(|e| e.profit).sum())
    }

    pub fn reconcile_cash(&self, session_id: &str) -> Result<CashReconciliation> {
        let replayed_cash = self.cash(session_id)?;
        let cached_cash = self.portfolios.get_by_session(session_id)?.cash;
        let reconciliation = CashReconciliation {
            session_id: session_id.to_string(),
            replayed_cash,
            cached_cash,
            drift: cached_cash - replayed_cash,
        };
        if !reconciliation.is_consistent() {
            warn!(
                "Cash drift of {} on session {}: cached {}, journal {}",
                reconciliation.drift, session_id, cached_cash, replayed_cash
            );
        }
        Ok(reconciliation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_session, InMemoryStore};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_reconcile_reports_drift() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let journal = TradeJournal::new(store.clone(), store.clone(), store.clone());

        store.append_trade(TradeLog::buy(
            &session.id,
            "AAPL",
            dec!(2),
            dec!(100),
            "r",
            session.simulated_date,
        ));

        assert_eq!(journal.cash(&session.id).unwrap(), dec!(800));
        let reconciliation = journal.reconcile_cash(&session.id).unwrap();
        assert_eq!(reconciliation.cached_cash, dec!(1000));
        assert_eq!(reconciliation.drift, dec!(200));
        assert!(!reconciliation.is_consistent());
    }

    #[tokio::test]
    async fn test_history_of_unknown_session_fails() {
        let store = Arc::new(InMemoryStore::new());
        let journal = TradeJournal::new(store.clone(), store.clone(), store.clone());
        assert!(journal.history("missing").unwrap_err().is_not_found());
    }
}

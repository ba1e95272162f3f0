use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::errors::{Error, Result, ValidationError};
use crate::portfolio::account::{PortfolioAccountTrait, PortfolioRepositoryTrait};
use crate::portfolio::valuation::{
    LogOutcome, PortfolioLog, PortfolioLogRepositoryTrait, SnapshotRunSummary, ValuePoint,
};
use crate::sessions::SimulationSession;

#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Computes the session's total value on `as_of` and records it.
    ///
    /// - a value equal to the latest snapshot's is not written again
    /// - a snapshot already dated `as_of` gets its value replaced
    /// - a date before the latest snapshot is rejected
    ///
    /// Snapshots therefore read back strictly increasing by date.
    async fn log_value(&self, session_id: &str, as_of: NaiveDate) -> Result<LogOutcome>;

    /// Snapshots every session at its own simulated date. Failures are
    /// logged and counted, never propagated.
    async fn log_all(&self, sessions: &[SimulationSession]) -> SnapshotRunSummary;

    /// Snapshots ordered by date.
    fn history(&self, session_id: &str) -> Result<Vec<PortfolioLog>>;

    /// The history as chart points.
    fn value_points(&self, session_id: &str) -> Result<Vec<ValuePoint>>;

    /// Removes snapshots whose value repeats the previous one. Returns the
    /// number removed.
    async fn compact(&self, session_id: &str) -> Result<usize>;
}

pub struct ValuationSnapshotter {
    account: Arc<dyn PortfolioAccountTrait>,
    portfolios: Arc<dyn PortfolioRepositoryTrait>,
    logs: Arc<dyn PortfolioLogRepositoryTrait>,
}

impl ValuationSnapshotter {
    pub fn new(
        account: Arc<dyn PortfolioAccountTrait>,
        portfolios: Arc<dyn PortfolioRepositoryTrait>,
        logs: Arc<dyn PortfolioLogRepositoryTrait>,
    ) -> Self {
        Self {
            account,
            portfolios,
            logs,
        }
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationSnapshotter {
    async fn log_value(&self, session_id: &str, as_of: NaiveDate) -> Result<LogOutcome> {
        let portfolio = self.portfolios.get_by_session(session_id)?;
        let latest = self.logs.get_latest_log(&portfolio.id)?;

        if let Some(latest) = &latest {
            if as_of < latest.valuation_date {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "Cannot log value for {}: latest snapshot is dated {}",
                    as_of, latest.valuation_date
                ))));
            }
        }

        let total_value = self.account.get_total_value(session_id, as_of).await?;

        let outcome = match latest {
            Some(latest) if latest.total_value == total_value => {
                debug!(
                    "Session {} value {} unchanged since {}",
                    session_id, total_value, latest.valuation_date
                );
                LogOutcome::Unchanged(latest)
            }
            Some(latest) if latest.valuation_date == as_of => {
                let updated = self.logs.update_log_value(&latest.id, total_value).await?;
                info!(
                    "Replaced value of session {} on {} with {}",
                    session_id, as_of, total_value
                );
                LogOutcome::Replaced(updated)
            }
            _ => {
                let inserted = self
                    .logs
                    .insert_log(PortfolioLog::new(&portfolio.id, as_of, total_value))
                    .await?;
                info!(
                    "Logged value {} for session {} on {}",
                    total_value, session_id, as_of
                );
                LogOutcome::Recorded(inserted)
            }
        };
        Ok(outcome)
    }

    async fn log_all(&self, sessions: &[SimulationSession]) -> SnapshotRunSummary {
        let mut summary = SnapshotRunSummary::default();
        for session in sessions {
            match self.log_value(&session.id, session.simulated_date).await {
                Ok(LogOutcome::Recorded(_)) => summary.recorded += 1,
                Ok(LogOutcome::Replaced(_)) => summary.replaced += 1,
                Ok(LogOutcome::Unchanged(_)) => summary.unchanged += 1,
                Err(e) => {
                    warn!(
                        "Skipping snapshot of session {} on {}: {}",
                        session.id, session.simulated_date, e
                    );
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    fn history(&self, session_id: &str) -> Result<Vec<PortfolioLog>> {
        let portfolio = self.portfolios.get_by_session(session_id)?;
        self.logs.get_logs(&portfolio.id)
    }

    fn value_points(&self, session_id: &str) -> Result<Vec<ValuePoint>> {
        Ok(self.history(session_id)?.iter().map(ValuePoint::from).collect())
    }

    async fn compact(&self, session_id: &str) -> Result<usize> {
        let logs = self.history(session_id)?;
        let mut redundant = Vec::new();
        let mut previous: Option<&PortfolioLog> = None;
        for log in &logs {
            match previous {
                Some(prev) if prev.total_value == log.total_value => {
                    redundant.push(log.id.clone());
                }
                _ => previous = Some(log),
            }
        }
        if redundant.is_empty() {
            return Ok(0);
        }
        let removed = self.logs.delete_logs(redundant).await?;
        info!("Compacted {} snapshots of session {}", removed, session_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::PortfolioAccount;
    use crate::test_support::{account, day, seeded_session, InMemoryStore};
    use rust_decimal_macros::dec;

    fn snapshotter(store: &Arc<InMemoryStore>) -> (Arc<PortfolioAccount>, ValuationSnapshotter) {
        let account = Arc::new(account(store));
        let snapshotter = ValuationSnapshotter::new(account.clone(), store.clone(), store.clone());
        (account, snapshotter)
    }

    #[tokio::test]
    async fn test_unchanged_value_is_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let (_, snapshotter) = snapshotter(&store);

        let first = snapshotter.log_value(&session.id, day(14)).await.unwrap();
        assert!(matches!(first, LogOutcome::Recorded(_)));
        let second = snapshotter.log_value(&session.id, day(15)).await.unwrap();
        assert!(matches!(second, LogOutcome::Unchanged(_)));
        assert_eq!(snapshotter.history(&session.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_day_different_value_replaces() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let (account, snapshotter) = snapshotter(&store);

        snapshotter.log_value(&session.id, day(15)).await.unwrap();
        account.buy(&session.id, "AAPL", dec!(10), day(14), None).await.unwrap();

        // 900 cash plus 10 AAPL at 20
        let outcome = snapshotter.log_value(&session.id, day(15)).await.unwrap();
        match outcome {
            LogOutcome::Replaced(log) => {
                assert_eq!(log.valuation_date, day(15));
                assert_eq!(log.total_value, dec!(1100));
            }
            other => panic!("expected replacement, got {:?}", other),
        }
        assert_eq!(snapshotter.history(&session.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_backdated_snapshot_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let (_, snapshotter) = snapshotter(&store);

        snapshotter.log_value(&session.id, day(18)).await.unwrap();
        assert!(matches!(
            snapshotter.log_value(&session.id, day(15)).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_history_is_strictly_increasing() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let (account, snapshotter) = snapshotter(&store);
        account.buy(&session.id, "AAPL", dec!(10), day(14), None).await.unwrap();

        for d in [14, 15, 15, 18, 19, 19] {
            snapshotter.log_value(&session.id, day(d)).await.unwrap();
        }

        let points = snapshotter.value_points(&session.id).unwrap();
        assert_eq!(points.len(), 4);
        assert!(points.windows(2).all(|w| w[0].x < w[1].x));
        assert_eq!(points[3].y, dec!(1150));
    }

    #[tokio::test]
    async fn test_log_all_counts_failures() {
        let store = Arc::new(InMemoryStore::new());
        let ok = seeded_session(&store, dec!(1000)).await;
        let mut weekend = seeded_session(&store, dec!(1000)).await;
        let (account, snapshotter) = snapshotter(&store);
        account.buy(&weekend.id, "AAPL", dec!(1), day(14), None).await.unwrap();
        weekend.simulated_date = day(16);

        let summary = snapshotter.log_all(&[ok, weekend]).await;
        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_compact_removes_repeated_values() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let (_, snapshotter) = snapshotter(&store);
        let portfolio_id = store.get_by_session(&session.id).unwrap().id;

        for (d, value) in [(14, dec!(1000)), (15, dec!(1000)), (18, dec!(1010)), (19, dec!(1010))] {
            store
                .insert_log(PortfolioLog::new(&portfolio_id, day(d), value))
                .await
                .unwrap();
        }

        assert_eq!(snapshotter.compact(&session.id).await.unwrap(), 2);
        let remaining: Vec<NaiveDate> = snapshotter
            .history(&session.id)
            .unwrap()
            .iter()
            .map(|l| l.valuation_date)
            .collect();
        assert_eq!(remaining, vec![day(14), day(18)]);
        assert_eq!(snapshotter.compact(&session.id).await.unwrap(), 0);
    }
}

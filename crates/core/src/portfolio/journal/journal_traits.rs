use super::journal_model::TradeLog;
use crate::errors::Result;

/// Read access to the journal.
///
/// Entries are only ever appended by
/// [`PortfolioRepositoryTrait::commit_trade`](crate::portfolio::PortfolioRepositoryTrait::commit_trade),
/// together with the lot and cash changes of the same trade.
pub trait TradeJournalRepositoryTrait: Send + Sync {
    /// Entries of a session ordered by trade date, then recording time.
    fn list_by_session(&self, session_id: &str) -> Result<Vec<TradeLog>>;
}

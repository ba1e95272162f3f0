//! Append-only trade journal.

mod journal_model;
mod journal_traits;
mod trade_journal;

pub use journal_model::{replay_cash, CashReconciliation, TradeAction, TradeLog};
pub use journal_traits::TradeJournalRepositoryTrait;
pub use trade_journal::TradeJournal;

//! SQLite storage for portfolios, lots, the trade journal and value snapshots.

mod model;
mod repository;
pub mod valuation;

pub use model::{LotDB, PortfolioDB, TradeLogDB};
pub use repository::PortfolioRepository;

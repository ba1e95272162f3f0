//! Daily portfolio value snapshots.

mod model;
mod repository;

pub use model::PortfolioLogDB;
pub use repository::PortfolioLogRepository;

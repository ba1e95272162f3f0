//! Persistent stock registry.

mod model;
mod repository;

pub use model::StockDB;
pub use repository::StockRepository;

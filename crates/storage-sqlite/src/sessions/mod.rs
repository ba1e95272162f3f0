//! SQLite storage implementation for simulation sessions.

mod model;
mod repository;

pub use model::{SessionDB, SessionStockDB};
pub use repository::SessionRepository;

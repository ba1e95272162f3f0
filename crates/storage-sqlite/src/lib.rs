//! SQLite storage implementation for the paper-trading simulator.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `papertrade-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for sessions, portfolios, lots, the trade
//!   journal, value snapshots and the stock registry
//! - Database-specific model types (with Diesel derives)
//!
//! All writes go through a single writer actor, so every trade commit runs in
//! one immediate transaction and lands completely or not at all.
//!
//! ```text
//!        core (domain, traits)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod portfolio;
pub mod sessions;
pub mod stocks;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use portfolio::valuation::PortfolioLogRepository;
pub use portfolio::PortfolioRepository;
pub use sessions::SessionRepository;
pub use stocks::StockRepository;

// Re-export from papertrade-core for convenience
pub use papertrade_core::errors::{DatabaseError, Error, Result};

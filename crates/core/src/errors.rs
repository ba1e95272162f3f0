//! Core error types for the paper-trading simulator.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::{NaiveDate, ParseError as ChronoParseError};
use rust_decimal::Decimal;
use thiserror::Error;

use papertrade_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the simulator.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Returns the ledger error if this is a trade validation failure.
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Error::Ledger(e) => Some(e),
            _ => None,
        }
    }

    /// True when the error reports a missing record rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::SessionNotFound(_) | Error::Database(DatabaseError::NotFound(_))
        )
    }
}

/// Trade validation failures raised by the portfolio account.
///
/// Every variant is a local, synchronous rejection: the ledger state is left
/// untouched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Shares must be greater than 0, got {0}")]
    InvalidQuantity(Decimal),

    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Insufficient funds, available: {available}, share price: {price}, shares: {shares}, total cost: {required}")]
    InsufficientFunds {
        available: Decimal,
        price: Decimal,
        shares: Decimal,
        required: Decimal,
    },

    #[error("Not enough shares of {ticker}: requested {requested}, held {held}")]
    InsufficientShares {
        ticker: String,
        requested: Decimal,
        held: Decimal,
    },

    #[error("Could not retrieve price for {ticker}{}: {}", .date.map(|d| format!(" on {}", d)).unwrap_or_default(), .reason)]
    PriceUnavailable {
        ticker: String,
        date: Option<NaiveDate>,
        reason: String,
    },
}

impl LedgerError {
    pub fn price_unavailable(
        ticker: impl Into<String>,
        date: Option<NaiveDate>,
        reason: impl Into<String>,
    ) -> Self {
        LedgerError::PriceUnavailable {
            ticker: ticker.into(),
            date,
            reason: reason.into(),
        }
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),

    #[error("Invalid CSV at row {row}: {message}")]
    Csv { row: usize, message: String },
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let row = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        Error::Validation(ValidationError::Csv {
            row,
            message: err.to_string(),
        })
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_unavailable_message_includes_date() {
        let err = LedgerError::price_unavailable(
            "AAPL",
            NaiveDate::from_ymd_opt(2024, 3, 16),
            "no trading data",
        );
        assert_eq!(
            err.to_string(),
            "Could not retrieve price for AAPL on 2024-03-16: no trading data"
        );

        let err = LedgerError::price_unavailable("AAPL", None, "timeout");
        assert_eq!(err.to_string(), "Could not retrieve price for AAPL: timeout");
    }

    #[test]
    fn test_ledger_error_is_exposed_through_root_error() {
        let err: Error = LedgerError::InvalidQuantity(dec!(0)).into();
        assert_eq!(err.as_ledger(), Some(&LedgerError::InvalidQuantity(dec!(0))));
        assert!(!err.is_not_found());
        assert!(Error::SessionNotFound("s1".into()).is_not_found());
    }
}

//! Database models for sessions.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use papertrade_core::sessions::SimulationSession;

use crate::utils::{format_date, parse_date, parse_decimal};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionDB {
    pub id: String,
    pub name: String,
    pub amount: String,
    pub use_twitter: bool,
    pub use_google: bool,
    pub use_price_history: bool,
    pub simulated_date: String,
    pub created_at: NaiveDateTime,
}

/// Allowed ticker for a session.
#[derive(Queryable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::session_stocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionStockDB {
    pub session_id: String,
    pub symbol: String,
}

impl SessionDB {
    /// Tickers live in `session_stocks`; the caller loads them separately.
    pub fn into_domain(self, tickers: Vec<String>) -> SimulationSession {
        SimulationSession {
            id: self.id,
            name: self.name,
            amount: parse_decimal(&self.amount),
            use_twitter: self.use_twitter,
            use_google: self.use_google,
            use_price_history: self.use_price_history,
            simulated_date: parse_date(&self.simulated_date),
            tickers,
            created_at: self.created_at,
        }
    }
}

impl From<&SimulationSession> for SessionDB {
    fn from(session: &SimulationSession) -> Self {
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            amount: session.amount.to_string(),
            use_twitter: session.use_twitter,
            use_google: session.use_google,
            use_price_history: session.use_price_history,
            simulated_date: format_date(session.simulated_date),
            created_at: session.created_at,
        }
    }
}

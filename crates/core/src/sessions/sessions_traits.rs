//! Session repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::sessions_model::{NewSession, SimulationSession};
use crate::errors::Result;
use crate::portfolio::Portfolio;

/// Trait defining the contract for session persistence.
#[async_trait]
pub trait SessionRepositoryTrait: Send + Sync {
    /// Stores the session together with its portfolio in one transaction.
    async fn create(
        &self,
        session: SimulationSession,
        portfolio: Portfolio,
    ) -> Result<SimulationSession>;

    async fn update_simulated_date(
        &self,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<SimulationSession>;

    /// Deletes the session and everything it owns.
    ///
    /// Returns the number of deleted sessions.
    async fn delete(&self, session_id: &str) -> Result<usize>;

    /// Fails with [`Error::SessionNotFound`](crate::Error::SessionNotFound)
    /// when no session has this id.
    fn get_by_id(&self, session_id: &str) -> Result<SimulationSession>;

    fn get_by_name(&self, name: &str) -> Result<Option<SimulationSession>>;

    /// All sessions, newest first.
    fn list(&self) -> Result<Vec<SimulationSession>>;
}

/// Trait defining the contract for session service operations.
#[async_trait]
pub trait SessionServiceTrait: Send + Sync {
    async fn create_session(&self, new_session: NewSession) -> Result<SimulationSession>;

    fn get_session(&self, session_id: &str) -> Result<SimulationSession>;

    fn list_sessions(&self) -> Result<Vec<SimulationSession>>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Moves the simulated clock to the next market day.
    async fn advance_simulated_date(&self, session_id: &str) -> Result<NaiveDate>;

    /// Repositions the simulated clock, rolling weekends forward.
    async fn set_simulated_date(&self, session_id: &str, date: NaiveDate) -> Result<NaiveDate>;
}

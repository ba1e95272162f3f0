use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use uuid::Uuid;

use super::sessions_model::{NewSession, SimulationSession};
use super::sessions_traits::{SessionRepositoryTrait, SessionServiceTrait};
use crate::constants::DEFAULT_SESSION_NAME;
use crate::errors::{Error, LedgerError, Result, ValidationError};
use crate::portfolio::Portfolio;
use crate::tickers::{normalize_ticker, TickerRegistryTrait};
use crate::utils::time_utils::{
    first_market_day_on_or_after, next_market_day, valuation_date_today,
};

/// Service for managing simulation sessions
pub struct SessionService {
    repository: Arc<dyn SessionRepositoryTrait>,
    registry: Arc<dyn TickerRegistryTrait>,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn SessionRepositoryTrait>,
        registry: Arc<dyn TickerRegistryTrait>,
    ) -> Self {
        Self {
            repository,
            registry,
        }
    }

    fn validated_tickers(&self, tickers: &[String]) -> Result<Vec<String>> {
        let mut validated: Vec<String> = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let ticker = normalize_ticker(ticker);
            if !self.registry.is_tradable(&ticker)? {
                return Err(LedgerError::InvalidTicker(ticker).into());
            }
            if !validated.contains(&ticker) {
                validated.push(ticker);
            }
        }
        Ok(validated)
    }
}

#[async_trait]
impl SessionServiceTrait for SessionService {
    async fn create_session(&self, new_session: NewSession) -> Result<SimulationSession> {
        new_session.validate()?;

        let name = new_session
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_SESSION_NAME)
            .to_string();
        if self.repository.get_by_name(&name)?.is_some() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "A session named '{}' already exists",
                name
            ))));
        }

        let tickers = self.validated_tickers(&new_session.tickers)?;
        let start = new_session.start_date.unwrap_or_else(valuation_date_today);

        let session = SimulationSession {
            id: Uuid::now_v7().to_string(),
            name,
            amount: new_session.amount,
            use_twitter: new_session.use_twitter,
            use_google: new_session.use_google,
            use_price_history: new_session.use_price_history,
            simulated_date: first_market_day_on_or_after(start),
            tickers,
            created_at: Utc::now().naive_utc(),
        };
        let portfolio = Portfolio::new(&session.id, session.amount);

        let created = self.repository.create(session, portfolio).await?;
        info!(
            "Created session '{}' ({}) with {} starting on {}",
            created.name, created.id, created.amount, created.simulated_date
        );
        Ok(created)
    }

    fn get_session(&self, session_id: &str) -> Result<SimulationSession> {
        self.repository.get_by_id(session_id)
    }

    fn list_sessions(&self) -> Result<Vec<SimulationSession>> {
        self.repository.list()
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let deleted = self.repository.delete(session_id).await?;
        if deleted == 0 {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        info!("Deleted session {}", session_id);
        Ok(())
    }

    async fn advance_simulated_date(&self, session_id: &str) -> Result<NaiveDate> {
        let session = self.repository.get_by_id(session_id)?;
        let next = next_market_day(session.simulated_date);
        self.repository
            .update_simulated_date(session_id, next)
            .await?;
        debug!(
            "Session {} advanced from {} to {}",
            session_id, session.simulated_date, next
        );
        Ok(next)
    }

    async fn set_simulated_date(&self, session_id: &str, date: NaiveDate) -> Result<NaiveDate> {
        let date = first_market_day_on_or_after(date);
        self.repository
            .update_simulated_date(session_id, date)
            .await?;
        Ok(date)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use rust_decimal::Decimal;

use papertrade_core::errors::{DatabaseError, Error};
use papertrade_core::portfolio::{PortfolioLog, PortfolioLogRepositoryTrait};
use papertrade_core::Result;

use super::model::PortfolioLogDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::portfolio_logs;
use crate::utils::chunk_for_sqlite;

pub struct PortfolioLogRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PortfolioLogRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PortfolioLogRepositoryTrait for PortfolioLogRepository {
    /// A second log for the same portfolio and day is a unique violation.
    async fn insert_log(&self, log: PortfolioLog) -> Result<PortfolioLog> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PortfolioLog> {
                diesel::insert_into(portfolio_logs::table)
                    .values(PortfolioLogDB::from(&log))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(log)
            })
            .await
    }

    async fn update_log_value(&self, log_id: &str, total_value: Decimal) -> Result<PortfolioLog> {
        let log_id = log_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PortfolioLog> {
                let updated = diesel::update(portfolio_logs::table.find(&log_id))
                    .set((
                        portfolio_logs::total_value.eq(total_value.to_string()),
                        portfolio_logs::calculated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Portfolio log {}",
                        log_id
                    ))));
                }
                let log_db = portfolio_logs::table
                    .find(&log_id)
                    .select(PortfolioLogDB::as_select())
                    .first::<PortfolioLogDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(PortfolioLog::from(log_db))
            })
            .await
    }

    async fn delete_logs(&self, log_ids: Vec<String>) -> Result<usize> {
        if log_ids.is_empty() {
            return Ok(0);
        }
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut deleted = 0;
                for chunk in chunk_for_sqlite(&log_ids) {
                    deleted += diesel::delete(
                        portfolio_logs::table.filter(portfolio_logs::id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(deleted)
            })
            .await
    }

    fn get_latest_log(&self, portfolio_id: &str) -> Result<Option<PortfolioLog>> {
        let mut conn = get_connection(&self.pool)?;
        let log_db = portfolio_logs::table
            .filter(portfolio_logs::portfolio_id.eq(portfolio_id))
            .select(PortfolioLogDB::as_select())
            .order(portfolio_logs::valuation_date.desc())
            .first::<PortfolioLogDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(log_db.map(PortfolioLog::from))
    }

    fn get_logs(&self, portfolio_id: &str) -> Result<Vec<PortfolioLog>> {
        let mut conn = get_connection(&self.pool)?;
        let logs_db = portfolio_logs::table
            .filter(portfolio_logs::portfolio_id.eq(portfolio_id))
            .select(PortfolioLogDB::as_select())
            .order(portfolio_logs::valuation_date.asc())
            .load::<PortfolioLogDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(logs_db.into_iter().map(PortfolioLog::from).collect())
    }
}

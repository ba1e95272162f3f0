use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;

use papertrade_core::errors::{DatabaseError, Error};
use papertrade_core::portfolio::{
    Lot, LotChange, Portfolio, PortfolioRepositoryTrait, TradeCommit, TradeJournalRepositoryTrait,
    TradeLog,
};
use papertrade_core::Result;

use super::model::{LotDB, PortfolioDB, TradeLogDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{lots, portfolios, trade_logs};

/// Portfolios, their open lots and the trade journal. Serves both the
/// account and the journal since a trade commit spans all three tables.
pub struct PortfolioRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PortfolioRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn apply_lot_change(conn: &mut SqliteConnection, portfolio_id: &str, change: &LotChange) -> Result<()> {
    let affected = match change {
        LotChange::Open(lot) => diesel::insert_into(lots::table)
            .values(LotDB::from(lot))
            .execute(conn)
            .map_err(StorageError::from)?,
        LotChange::Reduce {
            lot_id,
            remaining_shares,
        } => diesel::update(
            lots::table
                .filter(lots::id.eq(lot_id))
                .filter(lots::portfolio_id.eq(portfolio_id)),
        )
        .set(lots::shares.eq(remaining_shares.to_string()))
        .execute(conn)
        .map_err(StorageError::from)?,
        LotChange::Close { lot_id } => diesel::delete(
            lots::table
                .filter(lots::id.eq(lot_id))
                .filter(lots::portfolio_id.eq(portfolio_id)),
        )
        .execute(conn)
        .map_err(StorageError::from)?,
    };

    if affected == 0 {
        return Err(Error::Database(DatabaseError::NotFound(format!(
            "Lot change {:?} matched no rows in portfolio {}",
            change, portfolio_id
        ))));
    }
    Ok(())
}

#[async_trait]
impl PortfolioRepositoryTrait for PortfolioRepository {
    /// Lot changes, the new cash balance and the journal entry are written in
    /// a single immediate transaction; any failure leaves all three untouched.
    async fn commit_trade(&self, commit: TradeCommit) -> Result<TradeLog> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<TradeLog> {
                for change in &commit.lot_changes {
                    apply_lot_change(conn, &commit.portfolio_id, change)?;
                }

                let updated = diesel::update(
                    portfolios::table
                        .filter(portfolios::id.eq(&commit.portfolio_id))
                        .filter(portfolios::session_id.eq(&commit.session_id)),
                )
                .set(portfolios::cash.eq(commit.cash_after.to_string()))
                .execute(conn)
                .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::SessionNotFound(commit.session_id));
                }

                diesel::insert_into(trade_logs::table)
                    .values(TradeLogDB::from(&commit.trade))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(commit.trade)
            })
            .await
    }

    fn get_by_session(&self, session_id: &str) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)?;
        portfolios::table
            .filter(portfolios::session_id.eq(session_id))
            .select(PortfolioDB::as_select())
            .first::<PortfolioDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Portfolio::from)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Ordered oldest first: purchase date, then insertion time, then id.
    fn get_open_lots(&self, portfolio_id: &str, ticker: Option<&str>) -> Result<Vec<Lot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = lots::table
            .filter(lots::portfolio_id.eq(portfolio_id))
            .into_boxed();
        if let Some(ticker) = ticker {
            query = query.filter(lots::ticker.eq(ticker));
        }

        let lots_db = query
            .select(LotDB::as_select())
            .order((
                lots::purchase_date.asc(),
                lots::created_at.asc(),
                lots::id.asc(),
            ))
            .load::<LotDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(lots_db.into_iter().map(Lot::from).collect())
    }
}

impl TradeJournalRepositoryTrait for PortfolioRepository {
    fn list_by_session(&self, session_id: &str) -> Result<Vec<TradeLog>> {
        let mut conn = get_connection(&self.pool)?;
        let logs = trade_logs::table
            .filter(trade_logs::session_id.eq(session_id))
            .select(TradeLogDB::as_select())
            .order((
                trade_logs::trade_date.asc(),
                trade_logs::recorded_at.asc(),
                trade_logs::id.asc(),
            ))
            .load::<TradeLogDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(logs.into_iter().map(TradeLog::from).collect())
    }
}

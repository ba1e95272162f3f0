use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::info;

use papertrade_core::tickers::{normalize_ticker, Stock, StockRepositoryTrait, TickerRegistryTrait};
use papertrade_core::Result;

use super::model::StockDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::stocks;

/// Ticker registry backed by the `stocks` table.
pub struct StockRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl StockRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    /// Upserts `stocks` into the registry, keeping tickers registered by
    /// earlier runs. Returns the number of rows written.
    pub async fn seed_stocks(&self, stocks: Vec<Stock>) -> Result<usize> {
        let written = self.upsert_stocks(stocks).await?;
        info!("Seeded stock registry with {} tickers", written);
        Ok(written)
    }
}

impl TickerRegistryTrait for StockRepository {
    fn is_tradable(&self, ticker: &str) -> Result<bool> {
        Ok(self.get_stock(ticker)?.is_some())
    }

    fn get_stock(&self, ticker: &str) -> Result<Option<Stock>> {
        let mut conn = get_connection(&self.pool)?;
        let stock = stocks::table
            .find(normalize_ticker(ticker))
            .select(StockDB::as_select())
            .first::<StockDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(stock.map(Stock::from))
    }

    fn list_stocks(&self) -> Result<Vec<Stock>> {
        let mut conn = get_connection(&self.pool)?;
        let stocks_db = stocks::table
            .select(StockDB::as_select())
            .order(stocks::symbol.asc())
            .load::<StockDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(stocks_db.into_iter().map(Stock::from).collect())
    }
}

#[async_trait]
impl StockRepositoryTrait for StockRepository {
    async fn upsert_stocks(&self, stocks_to_save: Vec<Stock>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut affected = 0;
                for stock in stocks_to_save {
                    let mut db = StockDB::from(stock);
                    db.symbol = normalize_ticker(&db.symbol);
                    affected += diesel::replace_into(stocks::table)
                        .values(&db)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(affected)
            })
            .await
    }
}

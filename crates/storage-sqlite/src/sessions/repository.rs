use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;

use papertrade_core::errors::Error;
use papertrade_core::portfolio::Portfolio;
use papertrade_core::sessions::{SessionRepositoryTrait, SimulationSession};
use papertrade_core::Result;

use super::model::{SessionDB, SessionStockDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::portfolio::PortfolioDB;
use crate::schema::{portfolios, session_stocks, sessions};
use crate::utils::{chunk_for_sqlite, format_date};

pub struct SessionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SessionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn load_tickers(conn: &mut SqliteConnection, session_id: &str) -> Result<Vec<String>> {
    Ok(session_stocks::table
        .filter(session_stocks::session_id.eq(session_id))
        .select(session_stocks::symbol)
        .order(session_stocks::symbol.asc())
        .load::<String>(conn)
        .map_err(StorageError::from)?)
}

fn load_session(conn: &mut SqliteConnection, session_id: &str) -> Result<SimulationSession> {
    let session_db = sessions::table
        .find(session_id)
        .select(SessionDB::as_select())
        .first::<SessionDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
    let tickers = load_tickers(conn, session_id)?;
    Ok(session_db.into_domain(tickers))
}

#[async_trait]
impl SessionRepositoryTrait for SessionRepository {
    /// Session, allowed tickers and the empty portfolio land in one transaction.
    async fn create(
        &self,
        session: SimulationSession,
        portfolio: Portfolio,
    ) -> Result<SimulationSession> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SimulationSession> {
                diesel::insert_into(sessions::table)
                    .values(SessionDB::from(&session))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let tickers: Vec<SessionStockDB> = session
                    .tickers
                    .iter()
                    .map(|symbol| SessionStockDB {
                        session_id: session.id.clone(),
                        symbol: symbol.clone(),
                    })
                    .collect();
                if !tickers.is_empty() {
                    diesel::insert_into(session_stocks::table)
                        .values(&tickers)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                diesel::insert_into(portfolios::table)
                    .values(PortfolioDB::from(&portfolio))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                load_session(conn, &session.id)
            })
            .await
    }

    async fn update_simulated_date(
        &self,
        session_id: &str,
        date: NaiveDate,
    ) -> Result<SimulationSession> {
        let session_id = session_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SimulationSession> {
                let affected = diesel::update(sessions::table.find(&session_id))
                    .set(sessions::simulated_date.eq(format_date(date)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(Error::SessionNotFound(session_id));
                }
                load_session(conn, &session_id)
            })
            .await
    }

    /// Portfolio, lots, trades and snapshots go with the session through
    /// `ON DELETE CASCADE`.
    async fn delete(&self, session_id: &str) -> Result<usize> {
        let session_id = session_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(sessions::table.find(session_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn get_by_id(&self, session_id: &str) -> Result<SimulationSession> {
        let mut conn = get_connection(&self.pool)?;
        load_session(&mut conn, session_id)
    }

    fn get_by_name(&self, name: &str) -> Result<Option<SimulationSession>> {
        let mut conn = get_connection(&self.pool)?;
        let session_db = sessions::table
            .filter(sessions::name.eq(name))
            .select(SessionDB::as_select())
            .first::<SessionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        match session_db {
            Some(db) => {
                let tickers = load_tickers(&mut conn, &db.id)?;
                Ok(Some(db.into_domain(tickers)))
            }
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<SimulationSession>> {
        let mut conn = get_connection(&self.pool)?;
        let sessions_db = sessions::table
            .select(SessionDB::as_select())
            .order((sessions::created_at.desc(), sessions::id.desc()))
            .load::<SessionDB>(&mut conn)
            .map_err(StorageError::from)?;

        let ids: Vec<String> = sessions_db.iter().map(|s| s.id.clone()).collect();
        let mut tickers_by_session: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in chunk_for_sqlite(&ids) {
            let rows = session_stocks::table
                .filter(session_stocks::session_id.eq_any(chunk))
                .select(SessionStockDB::as_select())
                .order((session_stocks::session_id.asc(), session_stocks::symbol.asc()))
                .load::<SessionStockDB>(&mut conn)
                .map_err(StorageError::from)?;
            for row in rows {
                tickers_by_session
                    .entry(row.session_id)
                    .or_default()
                    .push(row.symbol);
            }
        }

        Ok(sessions_db
            .into_iter()
            .map(|db| {
                let tickers = tickers_by_session.remove(&db.id).unwrap_or_default();
                db.into_domain(tickers)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use chrono::{Duration, Utc};
    use papertrade_core::errors::DatabaseError;
    use rust_decimal_macros::dec;

    fn session(name: &str, tickers: &[&str]) -> SimulationSession {
        SimulationSession {
            id: uuid_like(name),
            name: name.to_string(),
            amount: dec!(10000),
            use_twitter: false,
            use_google: true,
            use_price_history: true,
            simulated_date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now().naive_utc(),
        }
    }

    fn uuid_like(name: &str) -> String {
        format!("session-{}", name.to_lowercase().replace(' ', "-"))
    }

    async fn create(repo: &SessionRepository, session: SimulationSession) -> SimulationSession {
        let portfolio = Portfolio::new(&session.id, session.amount);
        repo.create(session, portfolio).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read_back_session() {
        let (_dir, pool, writer) = test_db::setup();
        let repo = SessionRepository::new(pool, writer);

        let created = create(&repo, session("Momentum", &["MSFT", "AAPL"])).await;
        assert_eq!(created.amount, dec!(10000));
        assert_eq!(created.tickers, vec!["AAPL", "MSFT"]);
        assert!(created.use_google);

        let fetched = repo.get_by_id(&created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(repo.get_by_name("Momentum").unwrap(), Some(created));
        assert_eq!(repo.get_by_name("Nope").unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_unique_violation() {
        let (_dir, pool, writer) = test_db::setup();
        let repo = SessionRepository::new(pool, writer);
        create(&repo, session("Dup", &[])).await;

        let mut again = session("Dup", &[]);
        again.id = "other-id".to_string();
        let portfolio = Portfolio::new(&again.id, again.amount);
        let err = repo.create(again, portfolio).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Database(DatabaseError::UniqueViolation(_))
        ));
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_tickers() {
        let (_dir, pool, writer) = test_db::setup();
        let repo = SessionRepository::new(pool, writer);

        let mut older = session("Older", &["KO"]);
        older.created_at -= Duration::hours(1);
        create(&repo, older).await;
        create(&repo, session("Newer", &[])).await;

        let listed = repo.list().unwrap();
        let names: Vec<&str> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
        assert_eq!(listed[1].tickers, vec!["KO"]);
        assert!(listed[0].tickers.is_empty());
    }

    #[tokio::test]
    async fn test_update_simulated_date() {
        let (_dir, pool, writer) = test_db::setup();
        let repo = SessionRepository::new(pool, writer);
        let created = create(&repo, session("Clock", &[])).await;

        let next = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let updated = repo.update_simulated_date(&created.id, next).await.unwrap();
        assert_eq!(updated.simulated_date, next);

        let err = repo.update_simulated_date("missing", next).await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_every_dependent() {
        use crate::portfolio::valuation::PortfolioLogRepository;
        use crate::portfolio::PortfolioRepository;
        use crate::schema::{lots, portfolio_logs, trade_logs};
        use papertrade_core::portfolio::{
            Lot, LotChange, PortfolioLog, PortfolioLogRepositoryTrait, PortfolioRepositoryTrait,
            TradeCommit, TradeLog,
        };

        let (_dir, pool, writer) = test_db::setup();
        let repo = SessionRepository::new(pool.clone(), writer.clone());
        let portfolios_repo = PortfolioRepository::new(pool.clone(), writer.clone());
        let logs_repo = PortfolioLogRepository::new(pool.clone(), writer);

        let gone = session("Gone", &["AAPL"]);
        let portfolio = Portfolio::new(&gone.id, gone.amount);
        let created = repo.create(gone, portfolio.clone()).await.unwrap();

        let day = created.simulated_date;
        let lot = Lot::new(&portfolio.id, &created.id, "AAPL", dec!(5), dec!(10), day);
        portfolios_repo
            .commit_trade(TradeCommit {
                portfolio_id: portfolio.id.clone(),
                session_id: created.id.clone(),
                cash_after: dec!(9950),
                lot_changes: vec![LotChange::Open(lot)],
                trade: TradeLog::buy(&created.id, "AAPL", dec!(5), dec!(10), "test", day),
            })
            .await
            .unwrap();
        logs_repo
            .insert_log(PortfolioLog::new(&portfolio.id, day, dec!(10000)))
            .await
            .unwrap();

        let mut conn = get_connection(&pool).unwrap();
        let count = |conn: &mut SqliteConnection| -> [i64; 5] {
            [
                portfolios::table.count().get_result(conn).unwrap(),
                session_stocks::table.count().get_result(conn).unwrap(),
                lots::table.count().get_result(conn).unwrap(),
                trade_logs::table.count().get_result(conn).unwrap(),
                portfolio_logs::table.count().get_result(conn).unwrap(),
            ]
        };
        assert_eq!(count(&mut conn), [1, 1, 1, 1, 1]);

        assert_eq!(repo.delete(&created.id).await.unwrap(), 1);
        assert_eq!(repo.delete(&created.id).await.unwrap(), 0);
        assert!(matches!(
            repo.get_by_id(&created.id),
            Err(Error::SessionNotFound(_))
        ));
        assert_eq!(count(&mut conn), [0, 0, 0, 0, 0]);
    }
}

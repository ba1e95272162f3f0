use std::sync::Arc;

use anyhow::Context;
use tokio::sync::OwnedMutexGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use papertrade_core::{
    portfolio::{
        PortfolioAccount, PortfolioAccountTrait, TradeJournal, ValuationServiceTrait,
        ValuationSnapshotter,
    },
    pricing::{CachedPriceSource, PriceSourceTrait, PriceTable},
    sessions::{SessionRepositoryTrait, SessionService, SessionServiceTrait, SimulationSession},
    tickers::{StaticTickerRegistry, TickerRegistryTrait},
};
use papertrade_market_data::YahooProvider;
use papertrade_storage_sqlite::{
    db::{self, write_actor},
    PortfolioLogRepository, PortfolioRepository, SessionRepository, StockRepository,
};

use crate::config::{Config, PriceSourceKind};
use crate::locks::SessionLocks;

pub struct AppState {
    pub session_service: Arc<dyn SessionServiceTrait>,
    pub session_repository: Arc<dyn SessionRepositoryTrait>,
    pub account: Arc<dyn PortfolioAccountTrait>,
    pub journal: Arc<TradeJournal>,
    pub valuation_service: Arc<dyn ValuationServiceTrait>,
    pub registry: Arc<dyn TickerRegistryTrait>,
    /// Present only for the Yahoo source; the CSV table never goes stale.
    pub price_cache: Option<Arc<CachedPriceSource>>,
    pub session_locks: SessionLocks,
    pub db_path: String,
}

impl AppState {
    /// Takes the session's lock and returns the session as seen under it.
    ///
    /// Unknown ids fail before a lock entry is created, and a session deleted
    /// while we waited has its entry dropped again.
    pub async fn lock_session(
        &self,
        session_id: &str,
    ) -> papertrade_core::Result<(OwnedMutexGuard<()>, SimulationSession)> {
        self.session_service.get_session(session_id)?;
        let guard = self.session_locks.lock(session_id).await;
        match self.session_service.get_session(session_id) {
            Ok(session) => Ok((guard, session)),
            Err(e) => {
                drop(guard);
                self.session_locks.forget(session_id);
                Err(e)
            }
        }
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("PT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `try_init` so tests that build several routers in one process don't panic.
    let result = if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("Tracing subscriber already installed: {}", e);
    }
}

fn build_price_source(
    config: &Config,
) -> anyhow::Result<(Arc<dyn PriceSourceTrait>, Option<Arc<CachedPriceSource>>)> {
    match config.price_source {
        PriceSourceKind::Yahoo => {
            let provider = Arc::new(YahooProvider::new()?);
            let cache = Arc::new(CachedPriceSource::with_ttl(provider, config.quote_ttl));
            tracing::info!(
                "Using Yahoo Finance prices (quote TTL {}s)",
                config.quote_ttl.as_secs()
            );
            let source: Arc<dyn PriceSourceTrait> = cache.clone();
            Ok((source, Some(cache)))
        }
        PriceSourceKind::Csv => {
            let path = config
                .price_csv
                .as_deref()
                .context("PT_PRICE_SOURCE=csv requires PT_PRICE_CSV")?;
            let table = PriceTable::from_path(path)
                .with_context(|| format!("Failed to load price table from {}", path))?;
            tracing::info!("Using {} closes from {}", table.len(), path);
            let source: Arc<dyn PriceSourceTrait> = Arc::new(table);
            Ok((source, None))
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    // Keep DATABASE_URL aligned with PT_DB_PATH so storage resolves the same file.
    std::env::set_var("DATABASE_URL", &config.db_path);
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let stock_repository = Arc::new(StockRepository::new(pool.clone(), writer.clone()));
    let universe = match &config.tickers {
        Some(symbols) => StaticTickerRegistry::from_symbols(symbols),
        None => StaticTickerRegistry::default_universe(),
    };
    stock_repository.seed_stocks(universe.stocks()).await?;
    let registry: Arc<dyn TickerRegistryTrait> = stock_repository;

    let session_repository = Arc::new(SessionRepository::new(pool.clone(), writer.clone()));
    let portfolio_repository = Arc::new(PortfolioRepository::new(pool.clone(), writer.clone()));
    let log_repository = Arc::new(PortfolioLogRepository::new(pool.clone(), writer.clone()));

    let (price_source, price_cache) = build_price_source(config)?;

    let session_service = Arc::new(SessionService::new(
        session_repository.clone(),
        registry.clone(),
    ));
    let account: Arc<dyn PortfolioAccountTrait> = Arc::new(PortfolioAccount::new(
        session_repository.clone(),
        portfolio_repository.clone(),
        portfolio_repository.clone(),
        registry.clone(),
        price_source,
    ));
    let journal = Arc::new(TradeJournal::new(
        session_repository.clone(),
        portfolio_repository.clone(),
        portfolio_repository.clone(),
    ));
    let valuation_service = Arc::new(ValuationSnapshotter::new(
        account.clone(),
        portfolio_repository,
        log_repository,
    ));

    Ok(Arc::new(AppState {
        session_service,
        session_repository,
        account,
        journal,
        valuation_service,
        registry,
        price_cache,
        session_locks: SessionLocks::new(),
        db_path,
    }))
}

//! Database models for portfolios, lots and trade logs.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::warn;
use std::str::FromStr;

use papertrade_core::portfolio::{Lot, Portfolio, TradeAction, TradeLog};

use crate::utils::{format_date, parse_date, parse_decimal};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioDB {
    pub id: String,
    pub session_id: String,
    pub cash: String,
    pub created_at: NaiveDateTime,
}

impl From<PortfolioDB> for Portfolio {
    fn from(db: PortfolioDB) -> Self {
        Self {
            id: db.id,
            session_id: db.session_id,
            cash: parse_decimal(&db.cash),
            created_at: db.created_at,
        }
    }
}

impl From<&Portfolio> for PortfolioDB {
    fn from(domain: &Portfolio) -> Self {
        Self {
            id: domain.id.clone(),
            session_id: domain.session_id.clone(),
            cash: domain.cash.to_string(),
            created_at: domain.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::lots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LotDB {
    pub id: String,
    pub portfolio_id: String,
    pub session_id: String,
    pub ticker: String,
    pub shares: String,
    pub purchase_price: String,
    pub purchase_date: String,
    pub created_at: NaiveDateTime,
}

impl From<LotDB> for Lot {
    fn from(db: LotDB) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            session_id: db.session_id,
            ticker: db.ticker,
            shares: parse_decimal(&db.shares),
            purchase_price: parse_decimal(&db.purchase_price),
            purchase_date: parse_date(&db.purchase_date),
            created_at: db.created_at,
        }
    }
}

impl From<&Lot> for LotDB {
    fn from(domain: &Lot) -> Self {
        Self {
            id: domain.id.clone(),
            portfolio_id: domain.portfolio_id.clone(),
            session_id: domain.session_id.clone(),
            ticker: domain.ticker.clone(),
            shares: domain.shares.to_string(),
            purchase_price: domain.purchase_price.to_string(),
            purchase_date: format_date(domain.purchase_date),
            created_at: domain.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::trade_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeLogDB {
    pub id: String,
    pub session_id: String,
    pub action: String,
    pub symbol: String,
    pub shares: String,
    pub total_price: String,
    pub price_per_share: String,
    pub profit: String,
    pub rationale: String,
    pub trade_date: String,
    pub recorded_at: NaiveDateTime,
}

impl From<TradeLogDB> for TradeLog {
    fn from(db: TradeLogDB) -> Self {
        // The CHECK constraint only admits buy/sell.
        let action = TradeAction::from_str(&db.action).unwrap_or_else(|e| {
            warn!("Trade log {} has unreadable action: {}", db.id, e);
            TradeAction::Buy
        });
        Self {
            id: db.id,
            session_id: db.session_id,
            action,
            symbol: db.symbol,
            shares: parse_decimal(&db.shares),
            total_price: parse_decimal(&db.total_price),
            price_per_share: parse_decimal(&db.price_per_share),
            profit: parse_decimal(&db.profit),
            rationale: db.rationale,
            trade_date: parse_date(&db.trade_date),
            recorded_at: db.recorded_at,
        }
    }
}

impl From<&TradeLog> for TradeLogDB {
    fn from(domain: &TradeLog) -> Self {
        Self {
            id: domain.id.clone(),
            session_id: domain.session_id.clone(),
            action: domain.action.as_str().to_string(),
            symbol: domain.symbol.clone(),
            shares: domain.shares.to_string(),
            total_price: domain.total_price.to_string(),
            price_per_share: domain.price_per_share.to_string(),
            profit: domain.profit.to_string(),
            rationale: domain.rationale.clone(),
            trade_date: format_date(domain.trade_date),
            recorded_at: domain.recorded_at,
        }
    }
}

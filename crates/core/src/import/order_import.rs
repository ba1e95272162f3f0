//! Parses `ticker,shares[,rationale]` files and replays them as buys.
//!
//! Every row is validated before the first order executes, so a malformed
//! file never produces a partial import. Ledger rejections (funds, prices)
//! can only be known while executing; the import stops at the first one.

use std::io::Read;
use std::str::FromStr;

use csv::ReaderBuilder;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::portfolio::{PortfolioAccountTrait, TradeLog};
use crate::sessions::SimulationSession;
use crate::tickers::normalize_ticker;

#[derive(Debug, Deserialize)]
struct OrderRow {
    ticker: String,
    shares: String,
    #[serde(default)]
    rationale: Option<String>,
}

/// A validated order. `row` is the 1-based line in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyOrder {
    pub row: usize,
    pub ticker: String,
    pub shares: Decimal,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub row: usize,
    pub ticker: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_orders: usize,
    pub executed: Vec<TradeLog>,
    pub failure: Option<ImportFailure>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.executed.len() == self.total_orders
    }
}

fn csv_error(row: usize, message: String) -> Error {
    Error::Validation(ValidationError::Csv { row, message })
}

/// Parses and validates every order in the file.
pub fn parse_buy_orders<R: Read>(reader: R) -> Result<Vec<BuyOrder>> {
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for required in ["ticker", "shares"] {
        if !headers.iter().any(|h| h == required) {
            return Err(Error::Validation(ValidationError::MissingField(
                required.to_string(),
            )));
        }
    }

    let mut orders = Vec::new();
    for (index, record) in rdr.deserialize::<OrderRow>().enumerate() {
        let row = index + 2;
        let record = record.map_err(|e| csv_error(row, e.to_string()))?;

        let ticker = normalize_ticker(&record.ticker);
        if ticker.is_empty() {
            return Err(csv_error(row, "ticker is empty".to_string()));
        }
        let shares = Decimal::from_str(&record.shares)
            .map_err(|e| csv_error(row, format!("invalid shares '{}': {}", record.shares, e)))?;
        if shares <= Decimal::ZERO {
            return Err(csv_error(
                row,
                format!("shares must be greater than 0, got {}", shares),
            ));
        }

        orders.push(BuyOrder {
            row,
            ticker,
            shares,
            rationale: record.rationale.filter(|r| !r.is_empty()),
        });
    }
    Ok(orders)
}

/// Executes the orders of `reader` in file order at the session's simulated
/// date.
pub async fn import_buy_orders<R: Read>(
    account: &dyn PortfolioAccountTrait,
    session: &SimulationSession,
    reader: R,
) -> Result<ImportReport> {
    let orders = parse_buy_orders(reader)?;
    let mut report = ImportReport {
        total_orders: orders.len(),
        executed: Vec::with_capacity(orders.len()),
        failure: None,
    };

    for order in orders {
        let result = account
            .buy(
                &session.id,
                &order.ticker,
                order.shares,
                session.simulated_date,
                order.rationale.as_deref(),
            )
            .await;
        match result {
            Ok(trade) => report.executed.push(trade),
            Err(Error::Ledger(e)) => {
                warn!(
                    "Import into session {} stopped at row {}: {}",
                    session.id, order.row, e
                );
                report.failure = Some(ImportFailure {
                    row: order.row,
                    ticker: order.ticker,
                    message: e.to_string(),
                });
                break;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Imported {}/{} buy orders into session {}",
        report.executed.len(),
        report.total_orders,
        session.id
    );
    Ok(report)
}

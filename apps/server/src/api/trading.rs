use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use papertrade_core::{
    import::{import_buy_orders, ImportReport},
    portfolio::{SaleReceipt, TradeLog},
};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyRequest {
    ticker: String,
    shares: Decimal,
    rationale: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SellRequest {
    ticker: String,
    shares: Decimal,
    rationale: Option<String>,
    #[serde(default)]
    force: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportOrdersRequest {
    /// `ticker,shares[,rationale]` CSV text, header row included.
    csv: String,
}

async fn buy(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<BuyRequest>,
) -> ApiResult<Json<TradeLog>> {
    let (_guard, session) = state.lock_session(&id).await?;
    let trade = state
        .account
        .buy(
            &session.id,
            &body.ticker,
            body.shares,
            session.simulated_date,
            body.rationale.as_deref(),
        )
        .await?;
    Ok(Json(trade))
}

async fn sell(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SellRequest>,
) -> ApiResult<Json<SaleReceipt>> {
    let (_guard, session) = state.lock_session(&id).await?;
    let receipt = state
        .account
        .sell(
            &session.id,
            &body.ticker,
            body.shares,
            session.simulated_date,
            body.rationale.as_deref(),
            body.force,
        )
        .await?;
    Ok(Json(receipt))
}

async fn import_orders(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImportOrdersRequest>,
) -> ApiResult<Json<ImportReport>> {
    let (_guard, session) = state.lock_session(&id).await?;
    let report =
        import_buy_orders(state.account.as_ref(), &session, body.csv.as_bytes()).await?;
    if !report.is_complete() {
        tracing::warn!(
            "Order import for {} stopped after {} of {} orders",
            session.id,
            report.executed.len(),
            report.total_orders
        );
    }
    Ok(Json(report))
}

async fn list_trades(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TradeLog>>> {
    Ok(Json(state.journal.history(&id)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/{id}/buy", post(buy))
        .route("/sessions/{id}/sell", post(sell))
        .route("/sessions/{id}/import", post(import_orders))
        .route("/sessions/{id}/trades", get(list_trades))
}

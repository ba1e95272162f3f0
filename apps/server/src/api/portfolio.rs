use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use papertrade_core::portfolio::{
    CashReconciliation, Lot, LogOutcome, PortfolioLog, PortfolioValuation, SnapshotRunSummary,
    ValuePoint,
};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AsOfQuery {
    /// Defaults to the session's simulated date.
    date: Option<NaiveDate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HoldingsResponse {
    cash: Decimal,
    holdings: BTreeMap<String, Decimal>,
    lots: Vec<Lot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompactResponse {
    removed: usize,
}

async fn get_holdings(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<HoldingsResponse>> {
    Ok(Json(HoldingsResponse {
        cash: state.account.get_cash(&id)?,
        holdings: state.account.get_holdings(&id)?,
        lots: state.account.get_open_lots(&id)?,
    }))
}

async fn get_valuation(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(q): Query<AsOfQuery>,
) -> ApiResult<Json<PortfolioValuation>> {
    let as_of = match q.date {
        Some(date) => date,
        None => state.session_service.get_session(&id)?.simulated_date,
    };
    Ok(Json(state.account.get_valuation(&id, as_of).await?))
}

async fn get_value_history(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ValuePoint>>> {
    Ok(Json(state.valuation_service.value_points(&id)?))
}

async fn get_snapshots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PortfolioLog>>> {
    Ok(Json(state.valuation_service.history(&id)?))
}

async fn log_snapshot(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<LogOutcome>> {
    let (_guard, session) = state.lock_session(&id).await?;
    let outcome = state
        .valuation_service
        .log_value(&session.id, session.simulated_date)
        .await?;
    Ok(Json(outcome))
}

async fn compact_snapshots(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CompactResponse>> {
    let (_guard, session) = state.lock_session(&id).await?;
    let removed = state.valuation_service.compact(&session.id).await?;
    Ok(Json(CompactResponse { removed }))
}

/// Snapshots every session at its own simulated date.
async fn log_all_snapshots(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SnapshotRunSummary>> {
    let sessions = state.session_service.list_sessions()?;
    Ok(Json(state.valuation_service.log_all(&sessions).await))
}

async fn reconcile_cash(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CashReconciliation>> {
    Ok(Json(state.journal.reconcile_cash(&id)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/{id}/holdings", get(get_holdings))
        .route("/sessions/{id}/valuation", get(get_valuation))
        .route("/sessions/{id}/value-history", get(get_value_history))
        .route(
            "/sessions/{id}/snapshots",
            get(get_snapshots).post(log_snapshot),
        )
        .route("/sessions/{id}/snapshots/compact", post(compact_snapshots))
        .route("/sessions/{id}/reconcile", get(reconcile_cash))
        .route("/snapshots", post(log_all_snapshots))
}

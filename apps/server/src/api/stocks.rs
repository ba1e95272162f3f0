use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use papertrade_core::tickers::Stock;

use crate::{error::ApiResult, main_lib::AppState};

async fn list_stocks(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Stock>>> {
    Ok(Json(state.registry.list_stocks()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stocks", get(list_stocks))
}

//! Read-only view of the agent toolkit, for prompt building and debugging.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use papertrade_core::agent::{ToolResponse, TradingToolkit};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentContext {
    holdings_description: String,
    portfolio: ToolResponse,
    total_value: ToolResponse,
}

async fn get_agent_context(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<AgentContext>> {
    let toolkit = TradingToolkit::new(
        state.account.clone(),
        state.session_repository.clone(),
        id,
    );
    Ok(Json(AgentContext {
        holdings_description: toolkit.describe_holdings()?,
        portfolio: toolkit.get_portfolio(),
        total_value: toolkit.get_total_value().await,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{id}/agent/context", get(get_agent_context))
}

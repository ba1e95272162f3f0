use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use papertrade_core::sessions::{NewSession, SimulationSession};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetDateRequest {
    date: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulatedDateResponse {
    session_id: String,
    simulated_date: NaiveDate,
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SimulationSession>>> {
    Ok(Json(state.session_service.list_sessions()?))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(new_session): Json<NewSession>,
) -> ApiResult<(StatusCode, Json<SimulationSession>)> {
    let session = state.session_service.create_session(new_session).await?;
    tracing::info!("Created session {} ({})", session.name, session.id);
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SimulationSession>> {
    Ok(Json(state.session_service.get_session(&id)?))
}

async fn delete_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    {
        let (_guard, session) = state.lock_session(&id).await?;
        state.session_service.delete_session(&session.id).await?;
    }
    state.session_locks.forget(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn advance_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SimulatedDateResponse>> {
    let (_guard, session) = state.lock_session(&id).await?;
    let simulated_date = state
        .session_service
        .advance_simulated_date(&session.id)
        .await?;
    Ok(Json(SimulatedDateResponse {
        session_id: id,
        simulated_date,
    }))
}

async fn set_session_date(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetDateRequest>,
) -> ApiResult<Json<SimulatedDateResponse>> {
    let (_guard, session) = state.lock_session(&id).await?;
    let simulated_date = state
        .session_service
        .set_simulated_date(&session.id, body.date)
        .await?;
    Ok(Json(SimulatedDateResponse {
        session_id: id,
        simulated_date,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/advance", post(advance_session))
        .route("/sessions/{id}/date", post(set_session_date))
}

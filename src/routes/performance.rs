//! 作答与成绩记录

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};

use super::params::QueryParams;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{AttemptRecord, PerformanceRecord};

pub(crate) fn create_router() -> Router<AppState> {
    Router::new()
        .route("/attempt", post(submit_attempt))
        .route("/attempts", post(submit_attempt))
        .route("/performance", post(submit_performance).get(history_by_query))
        .route("/performance/:user_id", get(history_by_path))
        .route("/performance_history", get(history_by_query))
}

/// 请求体解析失败统一按参数错误返回 400
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_argument(format!("请求体不是合法 JSON: {}", e)))
}

async fn submit_attempt(State(state): State<AppState>, body: Bytes) -> AppResult<Json<JsonValue>> {
    let record: AttemptRecord = parse_body(&body)?;
    let stored = state.performance.submit_attempt(record).await?;
    Ok(Json(json!({ "status": "saved", "record": stored })))
}

async fn submit_performance(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<JsonValue>> {
    let record: PerformanceRecord = parse_body(&body)?;
    state.performance.submit_performance(record).await?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn history_by_query(
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<PerformanceRecord>>> {
    let params = QueryParams::new(raw);
    let user_id = params.required("user_id")?;
    Ok(Json(state.performance.fetch_user_history(user_id).await?))
}

async fn history_by_path(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<PerformanceRecord>>> {
    Ok(Json(state.performance.fetch_user_history(&user_id).await?))
}

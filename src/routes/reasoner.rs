//! 推理接口

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use super::params::QueryParams;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::Reasoning;

pub(crate) fn create_router() -> Router<AppState> {
    Router::new()
        .route("/reasoner", get(reason))
        .route("/deepseek", post(deepseek))
}

#[derive(Debug, Deserialize)]
struct QuestionParam {
    #[serde(default)]
    question: String,
}

async fn reason(
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<Reasoning>> {
    let params = QueryParams::new(raw);
    let question = params.required("question")?;
    Ok(Json(state.reasoner.reason(question).await?))
}

async fn deepseek(State(state): State<AppState>, body: Bytes) -> AppResult<Json<JsonValue>> {
    let param: QuestionParam = serde_json::from_slice(&body)
        .map_err(|e| AppError::invalid_argument(format!("请求体不是合法 JSON: {}", e)))?;
    let response = state.reasoner.raw(&param.question).await?;
    Ok(Json(json!({ "response": response })))
}

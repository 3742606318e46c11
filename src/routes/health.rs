use axum::{routing::get, Json, Router};
use serde_json::{json, Value as JsonValue};

use super::AppState;

pub(crate) fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}

async fn index() -> Json<JsonValue> {
    Json(json!({ "message": "ApexNurse API is running" }))
}

async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

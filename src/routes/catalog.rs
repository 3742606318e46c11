//! 题库目录与题目查询

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::params::QueryParams;
use super::AppState;
use crate::error::AppResult;
use crate::services::catalog::DEFAULT_PRACTICE_COUNT;

type RawParams = Query<HashMap<String, String>>;

pub(crate) fn create_router() -> Router<AppState> {
    Router::new()
        .route("/papers", get(papers))
        .route("/series", get(series))
        .route("/questions", get(questions))
        .route("/cached_questions", get(cached_questions))
        .route("/practice", get(practice))
}

async fn papers(State(state): State<AppState>, Query(raw): RawParams) -> AppResult<Response> {
    let params = QueryParams::new(raw);
    if params.flag("grouped")? {
        let catalog = state.catalog.paper_catalog().await?;
        return Ok(Json(catalog).into_response());
    }
    let papers = state.catalog.list_papers().await?;
    Ok(Json(papers).into_response())
}

async fn series(State(state): State<AppState>, Query(raw): RawParams) -> AppResult<Response> {
    let params = QueryParams::new(raw);
    let paper = params.required("paper")?;
    if params.flag("categorized")? {
        let buckets = state.catalog.list_series_categorized(paper).await?;
        return Ok(Json(buckets).into_response());
    }
    let series = state.catalog.list_series(paper).await?;
    Ok(Json(series).into_response())
}

async fn questions(State(state): State<AppState>, Query(raw): RawParams) -> AppResult<Response> {
    let params = QueryParams::new(raw);
    let paper = params.required("paper")?;
    let questions = state
        .catalog
        .get_questions(paper, params.text("series"))
        .await?;
    Ok(Json(questions).into_response())
}

async fn cached_questions(
    State(state): State<AppState>,
    Query(raw): RawParams,
) -> AppResult<Response> {
    let params = QueryParams::new(raw);
    let paper = params.required("paper")?;
    let questions = state
        .cache
        .get_or_fetch(&state.catalog, paper, params.text("series"))
        .await?;
    Ok(Json(questions.as_slice()).into_response())
}

async fn practice(State(state): State<AppState>, Query(raw): RawParams) -> AppResult<Response> {
    let params = QueryParams::new(raw);
    let count = params
        .number::<usize>("count")?
        .unwrap_or(DEFAULT_PRACTICE_COUNT);
    let questions = state.catalog.random_practice(count).await?;
    Ok(Json(questions).into_response())
}

//! HTTP 路由层
//!
//! 每个区域一个 `create_router()`，在 [`build_router`] 中合并。
//! 处理函数只做参数提取和响应组装，业务逻辑都在 `services/`。

use std::sync::Arc;

use axum::Router;

use crate::services::{CatalogService, PerformanceService, QuestionCache, ReasonerService};

pub mod catalog;
pub mod health;
mod params;
pub mod performance;
pub mod reasoner;

/// 所有处理函数共享的服务句柄
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub cache: Arc<QuestionCache>,
    pub performance: Arc<PerformanceService>,
    pub reasoner: Arc<ReasonerService>,
}

/// 组装完整路由（不含 CORS / Trace 等中间件）
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::create_router())
        .merge(catalog::create_router())
        .merge(performance::create_router())
        .merge(reasoner::create_router())
        .with_state(state)
}

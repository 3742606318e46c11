//! 应用生命周期 - 编排层

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{RestClient, RowStore, SupabaseStore};
use crate::routes::{build_router, AppState};
use crate::services::{
    CatalogService, LimitPolicy, PerformanceService, QuestionCache, ReasonerService,
};
use crate::utils::logging::log_startup;

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用，连接配置中的 Supabase
    pub fn initialize(config: Config) -> AppResult<Self> {
        let client = RestClient::new(
            &config.supabase_url,
            &config.supabase_service_role_key,
            config.request_timeout(),
        )?;
        let store: Arc<dyn RowStore> = Arc::new(SupabaseStore::new(client));
        Ok(Self::with_store(config, store))
    }

    /// 使用指定的行存储组装应用
    pub fn with_store(config: Config, store: Arc<dyn RowStore>) -> Self {
        let limits = LimitPolicy {
            quicktest: config.quicktest_limit,
            revision: config.revision_limit,
        };

        let state = AppState {
            catalog: Arc::new(CatalogService::new(
                Arc::clone(&store),
                &config.questions_table,
                limits,
            )),
            cache: Arc::new(QuestionCache::new(config.cache_capacity, config.cache_ttl())),
            performance: Arc::new(PerformanceService::new(
                store,
                &config.attempts_table,
                &config.performance_table,
            )),
            reasoner: Arc::new(ReasonerService::new(&config)),
        };

        if !state.reasoner.is_configured() {
            warn!("⚠️ 未配置 LLM_API_KEY，推理接口将返回 503");
        }

        Self { config, state }
    }

    /// 完整路由（含 CORS 与请求日志）
    pub fn router(&self) -> AppResult<Router> {
        let cors = cors_layer(&self.config.cors_origins)?;
        Ok(build_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http()))
    }

    /// 监听端口并处理请求，直到收到 Ctrl-C
    pub async fn run(self) -> AppResult<()> {
        log_startup(&self.config);

        let router = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(|e| AppError::Other(format!("无法监听 {}: {}", self.config.bind_addr, e)))?;

        match listener.local_addr() {
            Ok(addr) => info!("🚀 服务已启动: http://{}", addr),
            Err(_) => info!("🚀 服务已启动: {}", self.config.bind_addr),
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Other(format!("服务异常退出: {}", e)))?;

        info!("👋 服务已停止");
        Ok(())
    }
}

/// 根据允许的来源构建 CORS 中间件，`*` 表示放开所有来源
fn cors_layer(origins: &[String]) -> AppResult<CorsLayer> {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(base.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::invalid_argument(format!("非法的 CORS 来源: {}", origin)))
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(base.allow_origin(origins))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听 Ctrl-C 信号: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在停止服务...");
}

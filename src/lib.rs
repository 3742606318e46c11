//! # ApexNurse API
//!
//! 护理考试题库的 HTTP 服务：按试卷/系列查询题目、记录作答与成绩、调用推理模型解释题目。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部连接，只暴露能力
//! - `RowStore` - 行存储抽象（select / insert）
//! - `SupabaseStore` - 基于 PostgREST 的远端实现
//! - `MemoryStore` - 进程内实现，用于测试和本地演示
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `CatalogService` - 试卷/系列目录与题目匹配
//! - `QuestionCache` - 题目查询的记忆化
//! - `PerformanceService` - 作答与成绩的追加写入和历史查询
//! - `ReasonerService` - LLM 解题能力
//!
//! ### ③ 路由层（Routes）
//! - `routes/` - HTTP 处理函数，只做参数提取和响应组装
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/server` - 组装服务、挂载中间件、管理进程生命周期
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod routes;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{MemoryStore, RowStore, SupabaseStore};
pub use models::{AttemptRecord, PerformanceRecord, QuestionRecord, Reasoning, SeriesBuckets};
pub use orchestrator::App;

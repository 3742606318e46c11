/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 日志
///
/// 优先读取 `RUST_LOG`，其次 `LOG_LEVEL`，默认 `info`。
/// 重复调用不会 panic（测试中会多次初始化）。
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(std::env::var("LOG_LEVEL").unwrap_or_default()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 ApexNurse API 启动");
    info!("🌐 监听地址: {}", config.bind_addr);
    info!("🗄️ 数据存储: {}", config.supabase_url);
    info!(
        "📏 题量上限: quicktest={} / revision={}",
        config.quicktest_limit, config.revision_limit
    );
    info!(
        "🤖 推理服务: {}",
        if config.llm_api_key.is_some() {
            config.llm_model_name.as_str()
        } else {
            "未配置"
        }
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

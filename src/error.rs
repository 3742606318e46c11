use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 缺少必填参数或参数不合法
    #[error("参数错误: {0}")]
    InvalidArgument(String),
    /// 数据存储调用错误
    #[error("数据存储错误: {0}")]
    Api(#[from] ApiError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 数据存储调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 读取失败（非成功状态码或网络失败）
    #[error("读取表 {table} 失败 (status={status:?}): {message}")]
    FetchFailed {
        table: String,
        status: Option<u16>,
        message: String,
    },
    /// 写入失败（非成功状态码或网络失败）
    #[error("写入表 {table} 失败 (status={status:?}): {message}")]
    WriteFailed {
        table: String,
        status: Option<u16>,
        message: String,
    },
    /// 请求超时
    #[error("请求超时: {endpoint}")]
    Timeout { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 未配置 API Key
    #[error("推理服务未配置 (缺少 LLM_API_KEY)")]
    NotConfigured,
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 调用超时
    #[error("LLM 调用超时 (模型: {model})")]
    Timeout { model: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建参数错误
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AppError::InvalidArgument(message.into())
    }

    /// 创建读取失败错误
    pub fn fetch_failed(
        table: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        AppError::Api(ApiError::FetchFailed {
            table: table.into(),
            status,
            message: message.into(),
        })
    }

    /// 创建写入失败错误
    pub fn write_failed(
        table: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        AppError::Api(ApiError::WriteFailed {
            table: table.into(),
            status,
            message: message.into(),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            message: message.to_string(),
        })
    }

    /// 返回给客户端的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::Api(ApiError::FetchFailed { .. }) => "remote_fetch_error",
            AppError::Api(ApiError::WriteFailed { .. }) => "remote_write_error",
            AppError::Api(ApiError::JsonParseFailed { .. }) => "remote_fetch_error",
            AppError::Api(ApiError::Timeout { .. }) | AppError::Llm(LlmError::Timeout { .. }) => {
                "timeout"
            }
            AppError::Llm(_) => "external_service_error",
            AppError::Config(_) | AppError::Other(_) => "internal_error",
        }
    }

    /// 超时类错误可由调用方重试
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            AppError::Api(ApiError::Timeout { .. }) | AppError::Llm(LlmError::Timeout { .. })
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Api(ApiError::Timeout { .. }) | AppError::Llm(LlmError::Timeout { .. }) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Llm(LlmError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("❌ 请求失败 ({}): {}", status, self);
        } else {
            tracing::debug!("请求被拒绝 ({}): {}", status, self);
        }

        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "retriable": self.is_retriable(),
        });
        (status, Json(body)).into_response()
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

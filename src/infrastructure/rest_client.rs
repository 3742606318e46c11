//! REST 客户端 - 基础设施层
//!
//! 持有唯一的 HTTP 连接池，只暴露"发请求"的能力

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 原始响应
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RestResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// REST 客户端
///
/// 职责：
/// - 持有 reqwest::Client（带超时）
/// - 统一附加认证头
/// - 不认识 Question / Paper
pub struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    /// 创建新的 REST 客户端
    ///
    /// # 参数
    /// - `base_url`: 服务根地址
    /// - `api_key`: 同时作为 `apikey` 头和 Bearer token
    /// - `timeout`: 单次请求超时
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// 拼接完整 URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 发送 GET 请求
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RestResponse, reqwest::Error> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        Self::read(response).await
    }

    /// 发送 JSON POST 请求，要求服务端返回写入后的行
    pub async fn post_json(
        &self,
        path: &str,
        body: &JsonValue,
    ) -> Result<RestResponse, reqwest::Error> {
        let url = self.url(path);
        debug!("POST {} Payload: {}", url, body);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> Result<RestResponse, reqwest::Error> {
        let status = response.status();
        let body = response.text().await?;
        debug!("响应状态: {} | 长度: {} 字节", status, body.len());
        Ok(RestResponse { status, body })
    }
}

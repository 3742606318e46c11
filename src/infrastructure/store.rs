//! 行存储 - 基础设施层
//!
//! `RowStore` 是服务层访问外部数据存储的唯一入口。
//! `SupabaseStore` 把 `RowQuery` 翻译为 PostgREST 请求。

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::rest_client::{RestClient, RestResponse};
use crate::infrastructure::row_query::RowQuery;

/// 无 limit 查询的分页大小（与 PostgREST 默认 max-rows 一致）
pub const PAGE_SIZE: usize = 1000;

/// 外部行存储
#[async_trait]
pub trait RowStore: Send + Sync {
    /// 执行查询，返回 JSON 行
    async fn select(&self, query: &RowQuery) -> AppResult<Vec<JsonValue>>;

    /// 追加一行，返回存储后的行
    async fn insert(&self, table: &str, row: JsonValue) -> AppResult<JsonValue>;
}

/// 基于 Supabase REST 接口的存储
pub struct SupabaseStore {
    client: RestClient,
}

impl SupabaseStore {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn table_path(table: &str) -> String {
        format!("rest/v1/{}", table)
    }

    /// 执行单页查询
    async fn select_page(&self, query: &RowQuery) -> AppResult<Vec<JsonValue>> {
        let path = Self::table_path(query.table());
        let response = self
            .client
            .get(&path, &query.to_query_params())
            .await
            .map_err(|e| transport_error(e, &path, |message| {
                AppError::fetch_failed(query.table(), None, message)
            }))?;

        if !response.is_success() {
            warn!("读取表 {} 失败: {} {}", query.table(), response.status, response.body);
            return Err(AppError::fetch_failed(
                query.table(),
                Some(response.status.as_u16()),
                response.body,
            ));
        }

        parse_rows(&path, &response)
    }
}

#[async_trait]
impl RowStore for SupabaseStore {
    async fn select(&self, query: &RowQuery) -> AppResult<Vec<JsonValue>> {
        if query.limit_value().is_some() {
            return self.select_page(query).await;
        }

        // 未指定 limit 时按页取完整张表
        let mut rows = Vec::new();
        let mut offset = query.offset_value().unwrap_or(0);
        loop {
            let page = query.clone().offset(offset).limit(PAGE_SIZE);
            let batch = self.select_page(&page).await?;
            let fetched = batch.len();
            rows.extend(batch);

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
            debug!("表 {} 继续分页读取，offset={}", query.table(), offset);
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, row: JsonValue) -> AppResult<JsonValue> {
        let path = Self::table_path(table);
        let response = self
            .client
            .post_json(&path, &row)
            .await
            .map_err(|e| transport_error(e, &path, |message| {
                AppError::write_failed(table, None, message)
            }))?;

        if !response.is_success() {
            warn!("写入表 {} 失败: {} {}", table, response.status, response.body);
            return Err(AppError::write_failed(
                table,
                Some(response.status.as_u16()),
                response.body,
            ));
        }

        if response.body.trim().is_empty() {
            return Ok(row);
        }

        // return=representation 时返回写入后的数组
        let stored = parse_rows(&path, &response)?;
        Ok(stored.into_iter().next().unwrap_or(row))
    }
}

/// 网络层失败：超时单独归类，其余按读/写错误返回
fn transport_error<F>(err: reqwest::Error, path: &str, otherwise: F) -> AppError
where
    F: FnOnce(String) -> AppError,
{
    if err.is_timeout() {
        warn!("请求超时: {}", path);
        AppError::Api(ApiError::Timeout {
            endpoint: path.to_string(),
        })
    } else {
        warn!("请求失败 ({}): {}", path, err);
        otherwise(err.to_string())
    }
}

fn parse_rows(path: &str, response: &RestResponse) -> AppResult<Vec<JsonValue>> {
    serde_json::from_str(&response.body).map_err(|source| {
        AppError::Api(ApiError::JsonParseFailed {
            endpoint: path.to_string(),
            source,
        })
    })
}

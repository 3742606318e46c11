//! 成绩记录服务 - 业务能力层
//!
//! 作答记录与成绩记录只追加、不修改。服务端只做必填字段校验并写入时间戳，
//! 其余字段原样透传给外部存储。

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{RowQuery, RowStore};
use crate::models::{AttemptRecord, PerformanceRecord};

pub struct PerformanceService {
    store: Arc<dyn RowStore>,
    attempts_table: String,
    performance_table: String,
}

impl PerformanceService {
    /// 创建新的成绩记录服务
    pub fn new(
        store: Arc<dyn RowStore>,
        attempts_table: impl Into<String>,
        performance_table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            attempts_table: attempts_table.into(),
            performance_table: performance_table.into(),
        }
    }

    /// 写入一次作答
    ///
    /// 需要 `user_id`，并且要么带 `question_id`（单题作答），要么同时带 `score` 和 `total`。
    pub async fn submit_attempt(&self, mut record: AttemptRecord) -> AppResult<AttemptRecord> {
        require_user_id(&record.user_id)?;
        let has_score = record.score.is_some() && record.total.is_some();
        if record.question_id.is_none() && !has_score {
            return Err(AppError::invalid_argument(
                "作答记录需要 question_id 或 score/total",
            ));
        }

        record.timestamp = Some(Utc::now());
        let stored = self.append(&self.attempts_table, &record).await?;
        info!("✓ 已保存作答记录: user={}", record.user_id);
        Ok(stored.unwrap_or(record))
    }

    /// 写入一次测试成绩
    pub async fn submit_performance(
        &self,
        mut record: PerformanceRecord,
    ) -> AppResult<PerformanceRecord> {
        require_user_id(&record.user_id)?;
        if record.score.is_none() || record.total.is_none() {
            return Err(AppError::invalid_argument("成绩记录需要 score 和 total"));
        }

        record.timestamp = Some(Utc::now());
        let stored = self.append(&self.performance_table, &record).await?;
        info!(
            "✓ 已保存成绩: user={} score={:?}/{:?}",
            record.user_id, record.score, record.total
        );
        Ok(stored.unwrap_or(record))
    }

    /// 查询用户的历史成绩，最新的在前
    pub async fn fetch_user_history(&self, user_id: &str) -> AppResult<Vec<PerformanceRecord>> {
        let user_id = user_id.trim();
        require_user_id(user_id)?;

        let query = RowQuery::from(&self.performance_table)
            .eq("user_id", user_id)
            .order_desc("timestamp")
            .order_desc("id");
        let rows = self.store.select(&query).await?;

        let records: Vec<PerformanceRecord> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<PerformanceRecord>(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("跳过无法解析的成绩行 (user={}): {}", user_id, e);
                    None
                }
            })
            .collect();
        debug!("用户 {} 共 {} 条成绩", user_id, records.len());
        Ok(records)
    }

    /// 追加一行，返回存储端回显的记录（无法解析时返回 None）
    async fn append<T>(&self, table: &str, record: &T) -> AppResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let row: JsonValue = serde_json::to_value(record)
            .map_err(|e| AppError::Other(format!("无法序列化记录: {}", e)))?;
        let stored = self.store.insert(table, row).await?;
        Ok(serde_json::from_value(stored).ok())
    }
}

fn require_user_id(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::invalid_argument("缺少 user_id"));
    }
    Ok(())
}

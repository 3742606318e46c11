//! 题目缓存 - 业务能力层
//!
//! 对相同 (paper, series) 的查询结果做尽力而为的记忆化。
//! 写入不会使缓存失效，容忍 TTL 内的陈旧数据。

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::error::AppResult;
use crate::models::QuestionRecord;
use crate::services::catalog::CatalogService;
use crate::services::matching::{normalize_identifier, split_series_list};

type CacheKey = (String, String);

pub struct QuestionCache {
    cache: Cache<CacheKey, Arc<Vec<QuestionRecord>>>,
}

impl QuestionCache {
    /// 创建新的缓存
    ///
    /// # 参数
    /// - `capacity`: 最多缓存的查询数
    /// - `ttl`: 单条缓存的存活时间
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// 先查缓存，未命中再走目录服务
    pub async fn get_or_fetch(
        &self,
        catalog: &CatalogService,
        paper: &str,
        series: Option<&str>,
    ) -> AppResult<Arc<Vec<QuestionRecord>>> {
        let key = cache_key(paper, series);

        if let Some(hit) = self.cache.get(&key).await {
            debug!("缓存命中: {:?} ({} 题)", key, hit.len());
            return Ok(hit);
        }

        let questions = Arc::new(catalog.get_questions(paper, series).await?);
        self.cache.insert(key, Arc::clone(&questions)).await;
        Ok(questions)
    }
}

/// 归一化后的缓存键，大小写和空白差异视为同一查询
fn cache_key(paper: &str, series: Option<&str>) -> CacheKey {
    let paper = normalize_identifier(paper).unwrap_or_default().to_lowercase();
    let series = split_series_list(series.unwrap_or_default())
        .join(";")
        .to_lowercase();
    (paper, series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;
    use crate::services::matching::LimitPolicy;
    use serde_json::json;

    #[test]
    fn test_cache_key_normalized() {
        assert_eq!(
            cache_key("  Paper 1 ", Some("Quicktest 1 ; ;B")),
            cache_key("paper 1", Some("quicktest 1;b"))
        );
        assert_ne!(cache_key("Paper 1", None), cache_key("Paper 1", Some("A")));
    }

    #[tokio::test]
    async fn test_cached_result_is_reused() {
        let store = MemoryStore::new().with_rows(
            "questions",
            vec![json!({"id": 1, "paper": "Paper 1", "series": "Quicktest 1", "question": "Q1"})],
        );
        let catalog = CatalogService::new(Arc::new(store), "questions", LimitPolicy::default());
        let cache = QuestionCache::new(16, Duration::from_secs(60));

        let first = cache
            .get_or_fetch(&catalog, "Paper 1", Some("Quicktest 1"))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(&catalog, "paper 1", Some("quicktest 1"))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let catalog = CatalogService::new(
            Arc::new(MemoryStore::new()),
            "questions",
            LimitPolicy::default(),
        );
        let cache = QuestionCache::new(16, Duration::from_secs(60));

        assert!(cache.get_or_fetch(&catalog, " ", None).await.is_err());
        assert!(cache.cache.get(&cache_key(" ", None)).await.is_none());
    }
}

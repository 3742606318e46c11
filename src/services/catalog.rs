//! 题库目录服务 - 业务能力层
//!
//! 把 questions 表的原始行解析为：
//! - 去重排序的试卷列表
//! - 某试卷下去重排序的系列列表
//! - 按试卷 / 系列选出的题目（带分级题量上限，且去掉题干中的答案）
//!
//! 分组完全在查询时根据实时数据得出，不做任何物化。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{RowQuery, RowStore};
use crate::models::{GroupingRow, QuestionRecord, SeriesBuckets};
use crate::services::matching::{
    self, categorize_series, matches_identifier, normalize_identifier, split_series_list,
    LimitPolicy,
};
use crate::utils::truncate_text;

/// 未匹配时记录的诊断样本行数
const DIAGNOSTIC_SAMPLE_SIZE: usize = 5;
/// 随机练习的默认题量
pub const DEFAULT_PRACTICE_COUNT: usize = 20;
/// 随机练习的抽样池大小
const PRACTICE_POOL_SIZE: usize = 500;

/// 题库目录服务
///
/// 职责：
/// - 试卷 / 系列的分组与匹配
/// - 按系列应用题量上限
/// - 不写入任何数据
pub struct CatalogService {
    store: Arc<dyn RowStore>,
    table: String,
    limits: LimitPolicy,
}

impl CatalogService {
    /// 创建新的目录服务
    pub fn new(store: Arc<dyn RowStore>, table: impl Into<String>, limits: LimitPolicy) -> Self {
        Self {
            store,
            table: table.into(),
            limits,
        }
    }

    pub fn limits(&self) -> LimitPolicy {
        self.limits
    }

    /// 列出全部试卷（去重、升序）
    pub async fn list_papers(&self) -> AppResult<Vec<String>> {
        let rows = self.grouping_rows(RowQuery::from(&self.table).select("paper")).await?;

        let papers: BTreeSet<String> = rows
            .into_iter()
            .filter_map(|row| row.paper)
            .filter(|paper| !paper.trim().is_empty())
            .collect();

        debug!("共 {} 个试卷", papers.len());
        Ok(papers.into_iter().collect())
    }

    /// 列出某试卷下的系列（试卷名做不区分大小写的包含匹配）
    pub async fn list_series(&self, paper: &str) -> AppResult<Vec<String>> {
        let paper = normalize_identifier(paper)
            .ok_or_else(|| AppError::invalid_argument("缺少 paper 参数"))?;

        let query = RowQuery::from(&self.table)
            .select("paper,series")
            .ilike_contains("paper", &paper);
        let rows = self.grouping_rows(query).await?;

        let series: BTreeSet<String> = rows
            .into_iter()
            .filter(|row| {
                row.paper
                    .as_deref()
                    .is_some_and(|p| matches_identifier(p, &paper))
            })
            .filter_map(|row| row.series)
            .filter(|series| !series.trim().is_empty())
            .collect();

        debug!("试卷 '{}' 下共 {} 个系列", paper, series.len());
        Ok(series.into_iter().collect())
    }

    /// 列出系列并按 quicktest / revision 分类
    pub async fn list_series_categorized(&self, paper: &str) -> AppResult<SeriesBuckets> {
        let series = self.list_series(paper).await?;
        Ok(categorize_series(&series))
    }

    /// 试卷 → 系列 的完整映射
    pub async fn paper_catalog(&self) -> AppResult<BTreeMap<String, Vec<String>>> {
        let rows = self
            .grouping_rows(RowQuery::from(&self.table).select("paper,series"))
            .await?;

        let mut catalog: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in rows {
            let Some(paper) = row.paper.filter(|p| !p.trim().is_empty()) else {
                continue;
            };
            let entry = catalog.entry(paper).or_default();
            if let Some(series) = row.series.filter(|s| !s.trim().is_empty()) {
                entry.insert(series);
            }
        }

        Ok(catalog
            .into_iter()
            .map(|(paper, series)| (paper, series.into_iter().collect()))
            .collect())
    }

    /// 获取题目
    ///
    /// # 参数
    /// - `paper`: 试卷名（必填，包含匹配）
    /// - `series`: 系列名，可用 `;` 分隔多个；为空时取整张试卷
    ///
    /// # 返回
    /// 按系列顺序拼接的题目，多个系列重叠时不去重；没有匹配时返回空列表
    pub async fn get_questions(
        &self,
        paper: &str,
        series: Option<&str>,
    ) -> AppResult<Vec<QuestionRecord>> {
        let paper = normalize_identifier(paper)
            .ok_or_else(|| AppError::invalid_argument("缺少 paper 参数"))?;
        let tokens = split_series_list(series.unwrap_or_default());

        let mut questions = Vec::new();
        if tokens.is_empty() {
            questions.extend(self.match_questions(&paper, None, self.limits.revision).await?);
        } else {
            for token in &tokens {
                let cap = self.limits.cap_for(token);
                let matched = self.match_questions(&paper, Some(token), cap).await?;
                debug!("系列 '{}' 匹配 {} 题 (上限 {})", token, matched.len(), cap);
                if let Some(first) = matched.first() {
                    debug!("  首题: {}", first);
                }
                questions.extend(matched);
            }
        }

        if questions.is_empty() {
            warn!(
                "⚠️ 未找到题目: paper='{}' series={:?}",
                paper,
                series.unwrap_or_default()
            );
            self.log_diagnostic_sample().await;
        } else {
            info!("✓ paper='{}' 共返回 {} 题", paper, questions.len());
        }

        Ok(questions)
    }

    /// 随机抽取练习题
    pub async fn random_practice(&self, count: usize) -> AppResult<Vec<QuestionRecord>> {
        let count = count.min(self.limits.revision).max(1);
        let rows = self
            .store
            .select(&RowQuery::from(&self.table).limit(PRACTICE_POOL_SIZE))
            .await?;
        let pool = to_questions(rows);

        let mut rng = rand::thread_rng();
        let picked: Vec<QuestionRecord> = pool
            .choose_multiple(&mut rng, count)
            .cloned()
            .map(sanitize)
            .collect();

        debug!("随机练习：从 {} 题中抽取 {} 题", pool.len(), picked.len());
        Ok(picked)
    }

    /// 单个系列（或整张试卷）的一次匹配
    async fn match_questions(
        &self,
        paper: &str,
        series: Option<&str>,
        cap: usize,
    ) -> AppResult<Vec<QuestionRecord>> {
        let mut query = RowQuery::from(&self.table).ilike_contains("paper", paper);
        if let Some(series) = series {
            query = query.ilike_contains("series", series);
        }
        // 空格在 ilike 中被当作通配符，范围比包含匹配宽（`Quicktest 2` 也会命中 `Quicktest 12`），
        // 因此不能在远端截断，取回全部候选后再按包含匹配过滤并截断
        let rows = self.store.select(&query).await?;

        Ok(to_questions(rows)
            .into_iter()
            .filter(|q| matches_identifier(&q.paper, paper))
            .filter(|q| series.map_or(true, |s| matches_identifier(&q.series, s)))
            .take(cap)
            .map(sanitize)
            .collect())
    }

    async fn grouping_rows(&self, query: RowQuery) -> AppResult<Vec<GroupingRow>> {
        let rows = self.store.select(&query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<GroupingRow>(row) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!("跳过无法解析的分组行: {}", e);
                    None
                }
            })
            .collect())
    }

    /// 记录全表的少量样本，方便排查匹配不到的原因
    async fn log_diagnostic_sample(&self) {
        let query = RowQuery::from(&self.table)
            .select("paper,series")
            .limit(DIAGNOSTIC_SAMPLE_SIZE);
        match self.grouping_rows(query).await {
            Ok(rows) if rows.is_empty() => warn!("表 {} 为空", self.table),
            Ok(rows) => {
                for (idx, row) in rows.iter().enumerate() {
                    warn!(
                        "  样本 {}: paper={:?} series={:?}",
                        idx + 1,
                        row.paper.as_deref().map(|p| truncate_text(p, 60)),
                        row.series.as_deref().map(|s| truncate_text(s, 60)),
                    );
                }
            }
            Err(e) => warn!("无法读取诊断样本: {}", e),
        }
    }
}

fn to_questions(rows: Vec<JsonValue>) -> Vec<QuestionRecord> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<QuestionRecord>(row) {
            Ok(question) => Some(question),
            Err(e) => {
                warn!("跳过无法解析的题目行: {}", e);
                None
            }
        })
        .collect()
}

fn sanitize(mut question: QuestionRecord) -> QuestionRecord {
    question.question = matching::strip_inline_answer(&question.question);
    question
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;
    use serde_json::json;

    fn question(id: usize, paper: &str, series: &str) -> JsonValue {
        json!({
            "id": id,
            "paper": paper,
            "series": series,
            "question": format!("Question {} Answer: B", id),
            "option_a": "A",
            "option_b": "B",
            "option_c": "C",
            "option_d": "D",
            "correct_answer": "B",
            "rationale": "Because B",
        })
    }

    fn service(rows: Vec<JsonValue>) -> CatalogService {
        let store = MemoryStore::new().with_rows("questions", rows);
        CatalogService::new(Arc::new(store), "questions", LimitPolicy::default())
    }

    fn scenario() -> CatalogService {
        let mut rows = Vec::new();
        for i in 0..5 {
            rows.push(question(i, "Paper1", "Revision Series 1"));
        }
        for i in 5..85 {
            rows.push(question(i, "Paper1", "Quicktest 1"));
        }
        service(rows)
    }

    #[tokio::test]
    async fn test_tiered_caps() {
        let catalog = scenario();

        let quick = catalog.get_questions("Paper1", Some("Quicktest 1")).await.unwrap();
        assert_eq!(quick.len(), 60);

        let revision = catalog
            .get_questions("Paper1", Some("Revision Series 1"))
            .await
            .unwrap();
        assert_eq!(revision.len(), 5);
    }

    #[tokio::test]
    async fn test_revision_cap_is_120() {
        let rows = (0..150).map(|i| question(i, "Paper 3", "Mock Exam")).collect();
        let catalog = service(rows);
        let questions = catalog.get_questions("paper 3", Some("mock")).await.unwrap();
        assert_eq!(questions.len(), 120);
    }

    #[tokio::test]
    async fn test_series_list_is_not_deduplicated() {
        let catalog = service(vec![
            question(1, "Paper 1", "A"),
            question(2, "Paper 1", "B"),
            question(3, "Paper 1", "B"),
        ]);

        let questions = catalog.get_questions("Paper 1", Some("A;B;B")).await.unwrap();
        let ids: Vec<JsonValue> = questions.iter().map(|q| q.id.clone()).collect();
        assert_eq!(
            ids,
            vec![json!(1), json!(2), json!(3), json!(2), json!(3)]
        );
    }

    #[tokio::test]
    async fn test_answers_are_stripped() {
        let catalog = service(vec![question(1, "Paper 1", "Quicktest 1")]);
        let questions = catalog.get_questions("paper 1", None).await.unwrap();
        assert_eq!(questions[0].question, "Question 1");
        assert_eq!(questions[0].rationale.as_deref(), Some("Because B"));
    }

    #[tokio::test]
    async fn test_no_match_returns_empty() {
        let catalog = scenario();
        let questions = catalog.get_questions("Paper 9", Some("Quicktest 1")).await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_blank_paper_rejected() {
        let catalog = scenario();
        let err = catalog.get_questions("   ", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let err = catalog.list_series("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_list_series_substring_match() {
        let catalog = service(vec![
            question(1, "Paper 1 - Adult", "Quicktest 2"),
            question(2, "PAPER 1 - Child", "Revision Series 1"),
            question(3, "Paper 2", "Quicktest 9"),
            question(4, "Paper 1 - Adult", "Quicktest 2"),
        ]);

        let series = catalog.list_series("paper 1").await.unwrap();
        assert_eq!(series, vec!["Quicktest 2", "Revision Series 1"]);

        let buckets = catalog.list_series_categorized("paper 1").await.unwrap();
        assert_eq!(buckets.quicktest, vec!["Quicktest 2"]);
        assert_eq!(buckets.revision, vec!["Revision Series 1"]);
    }

    #[tokio::test]
    async fn test_list_papers_sorted_and_empty() {
        let catalog = service(vec![
            question(1, "b paper", "x"),
            question(2, "Paper 2", "x"),
            question(3, "Paper 1", "x"),
            question(4, "Paper 2", "y"),
        ]);
        // 区分大小写的字典序
        assert_eq!(
            catalog.list_papers().await.unwrap(),
            vec!["Paper 1", "Paper 2", "b paper"]
        );

        assert!(service(vec![]).list_papers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paper_catalog() {
        let catalog = service(vec![
            question(1, "Paper 1", "Quicktest 1"),
            question(2, "Paper 1", "Quicktest 1"),
            question(3, "Paper 1", "Revision Series 1"),
            question(4, "Paper 2", "Quicktest 1"),
        ]);
        let map = catalog.paper_catalog().await.unwrap();
        assert_eq!(map["Paper 1"], vec!["Quicktest 1", "Revision Series 1"]);
        assert_eq!(map["Paper 2"], vec!["Quicktest 1"]);
    }

    #[tokio::test]
    async fn test_overlapping_series_names_fill_cap() {
        // 远端宽匹配命中的 Quicktest 12 排在前面
        let mut rows: Vec<JsonValue> = (0..60)
            .map(|i| question(i, "Paper1", "Quicktest 12"))
            .collect();
        rows.extend((60..70).map(|i| question(i, "Paper1", "Quicktest 2")));
        let catalog = service(rows);

        let questions = catalog.get_questions("Paper1", Some("Quicktest 2")).await.unwrap();
        assert_eq!(questions.len(), 10);
        assert!(questions.iter().all(|q| q.series == "Quicktest 2"));

        let questions = catalog.get_questions("Paper1", Some("Quicktest 12")).await.unwrap();
        assert_eq!(questions.len(), 60);
    }

    #[tokio::test]
    async fn test_random_practice_zero_limit() {
        let store = MemoryStore::new().with_rows("questions", vec![question(1, "Paper 1", "A")]);
        let catalog = CatalogService::new(
            Arc::new(store),
            "questions",
            LimitPolicy {
                quicktest: 0,
                revision: 0,
            },
        );
        let picked = catalog.random_practice(20).await.unwrap();
        assert_eq!(picked.len(), 1);
    }

    #[tokio::test]
    async fn test_random_practice() {
        let catalog = scenario();
        let picked = catalog.random_practice(DEFAULT_PRACTICE_COUNT).await.unwrap();
        assert_eq!(picked.len(), 20);
        assert!(picked.iter().all(|q| !q.question.contains("Answer:")));

        let capped = catalog.random_practice(10_000).await.unwrap();
        assert_eq!(capped.len(), 85);
    }
}

//! 匹配规则 - 业务能力层
//!
//! 标识归一化、包含匹配、系列分类与题干答案剥离，全部为纯函数

use std::sync::LazyLock;

use regex::Regex;

use crate::models::SeriesBuckets;

/// 行内答案标记：`Answer:` / `Ans:`（不区分大小写）
static INLINE_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:answer|ans)\s*:").expect("内联答案正则无效")
});

/// 每个系列的返回上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub quicktest: usize,
    pub revision: usize,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            quicktest: 60,
            revision: 120,
        }
    }
}

impl LimitPolicy {
    /// 名称含 quicktest 的系列用短上限，其余用长上限
    pub fn cap_for(&self, series: &str) -> usize {
        if is_quicktest(series) {
            self.quicktest
        } else {
            self.revision
        }
    }
}

/// 归一化用户输入的 paper / series 标识
///
/// 去掉首尾空白并合并连续空白；为空时返回 `None`。
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// 不区分大小写、容忍空白差异的包含匹配
pub fn matches_identifier(haystack: &str, needle: &str) -> bool {
    let fold = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    fold(haystack).contains(&fold(needle))
}

/// 拆分 `;` 分隔的系列列表，丢弃空项，保留顺序和重复项
pub fn split_series_list(raw: &str) -> Vec<String> {
    raw.split(';').filter_map(normalize_identifier).collect()
}

pub fn is_quicktest(series: &str) -> bool {
    series.to_lowercase().contains("quicktest")
}

pub fn is_revision(series: &str) -> bool {
    series.to_lowercase().contains("revision")
}

/// 按 quicktest / revision 划分系列，两者都不是的归入 other
pub fn categorize_series(series: &[String]) -> SeriesBuckets {
    let mut buckets = SeriesBuckets::default();
    for name in series {
        if is_quicktest(name) {
            buckets.quicktest.push(name.clone());
        } else if is_revision(name) {
            buckets.revision.push(name.clone());
        } else {
            buckets.other.push(name.clone());
        }
    }
    buckets
}

/// 去掉题干中的行内答案及其后的全部内容
pub fn strip_inline_answer(question: &str) -> String {
    match INLINE_ANSWER.find(question) {
        Some(m) => question[..m.start()].trim_end().to_string(),
        None => question.to_string(),
    }
}

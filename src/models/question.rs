use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 题目行（来自 questions 表）
///
/// 历史版本的表结构使用过不同列名，反序列化时一并兼容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuestionRecord {
    #[serde(default, alias = "global_id", skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default)]
    pub paper: String,
    #[serde(default)]
    pub series: String,
    #[serde(default, alias = "question_text")]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_b: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_d: Option<String>,
    #[serde(default, alias = "correct_option", skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl std::fmt::Display for QuestionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 截断题干以便显示（最多60个字符）
        let preview = crate::utils::truncate_text(&self.question, 60);
        write!(f, "[{} / {}] {}", self.paper, self.series, preview)
    }
}

/// 分组用的精简行，只关心 paper / series 两列
#[derive(Debug, Clone, Deserialize)]
pub struct GroupingRow {
    #[serde(default)]
    pub paper: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
}

/// 按命名约定划分的系列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SeriesBuckets {
    pub quicktest: Vec<String>,
    pub revision: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<String>,
}

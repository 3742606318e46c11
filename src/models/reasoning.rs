use serde::{Deserialize, Serialize};

/// 推理服务返回的答案与解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reasoning {
    pub answer: String,
    pub rationale: String,
}

impl Reasoning {
    /// 模型无可用输出时的占位答案
    pub fn placeholder() -> Self {
        Self {
            answer: "No response".to_string(),
            rationale: String::new(),
        }
    }
}

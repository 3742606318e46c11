//! 推理服务 - 业务能力层
//!
//! 把题目转发给兼容 OpenAI 接口的推理模型（默认 DeepSeek），
//! 并把回复按 `Rationale:` 拆分为答案和解析。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::Reasoning;

const SYSTEM_PROMPT: &str =
    "You are a medical reasoning assistant that clearly explains exam questions. \
     Reply with the correct answer first, then a line starting with 'Rationale:' explaining why.";

const RATIONALE_MARKER: &str = "Rationale:";
const ANSWER_LABEL: &str = "Answer:";

/// 推理服务
///
/// 职责：
/// - 调用 LLM API 解释单道题
/// - 未配置 API Key 时明确报错，而不是静默失败
pub struct ReasonerService {
    client: Option<Client<OpenAIConfig>>,
    model_name: String,
    timeout: Duration,
}

impl ReasonerService {
    /// 创建新的推理服务
    pub fn new(config: &Config) -> Self {
        let client = config.llm_api_key.as_ref().map(|key| {
            let openai_config = OpenAIConfig::new()
                .with_api_key(key)
                .with_api_base(&config.llm_api_base_url);
            Client::with_config(openai_config)
        });

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            timeout: config.request_timeout(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// 解释题目，返回拆分后的答案与解析
    pub async fn reason(&self, question: &str) -> AppResult<Reasoning> {
        let content = self.complete(question).await?;
        Ok(match content {
            Some(text) => parse_reasoning(&text),
            None => Reasoning::placeholder(),
        })
    }

    /// 解释题目，返回模型原文
    pub async fn raw(&self, question: &str) -> AppResult<String> {
        let content = self.complete(question).await?;
        Ok(content.unwrap_or_else(|| Reasoning::placeholder().answer))
    }

    /// 调用模型，返回非空的回复内容
    async fn complete(&self, question: &str) -> AppResult<Option<String>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::invalid_argument("缺少 question 参数"));
        }
        let client = self.client.as_ref().ok_or(LlmError::NotConfigured)?;

        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", question.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(question)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .max_tokens(300u32)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let response = tokio::time::timeout(self.timeout, client.chat().create(request))
            .await
            .map_err(|_| {
                warn!("LLM 调用超时 ({:?})", self.timeout);
                LlmError::Timeout {
                    model: self.model_name.clone(),
                }
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                AppError::llm_api_failed(&self.model_name, e)
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if content.is_none() {
            warn!("LLM 返回内容为空，使用占位答案");
        }
        Ok(content)
    }
}

/// 按 `Rationale:` 拆分模型回复
///
/// 标记之前为答案（去掉可选的 `Answer:` 前缀），之后为解析；
/// 没有标记时整段作为答案。
pub fn parse_reasoning(text: &str) -> Reasoning {
    let (answer, rationale) = match text.split_once(RATIONALE_MARKER) {
        Some((answer, rationale)) => (answer, rationale),
        None => (text, ""),
    };

    let answer = answer.trim();
    let answer = answer.strip_prefix(ANSWER_LABEL).unwrap_or(answer).trim();

    if answer.is_empty() && rationale.trim().is_empty() {
        return Reasoning::placeholder();
    }

    Reasoning {
        answer: answer.to_string(),
        rationale: rationale.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_marker() {
        let reasoning = parse_reasoning(
            "Answer: C. Hypokalemia\nRationale: Loop diuretics waste potassium.",
        );
        assert_eq!(reasoning.answer, "C. Hypokalemia");
        assert_eq!(reasoning.rationale, "Loop diuretics waste potassium.");
    }

    #[test]
    fn test_parse_without_marker() {
        let reasoning = parse_reasoning("B is correct because of the airway.");
        assert_eq!(reasoning.answer, "B is correct because of the airway.");
        assert!(reasoning.rationale.is_empty());
    }

    #[test]
    fn test_parse_only_splits_on_first_marker() {
        let reasoning = parse_reasoning("A\nRationale: first. Rationale: second.");
        assert_eq!(reasoning.answer, "A");
        assert_eq!(reasoning.rationale, "first. Rationale: second.");
    }

    #[test]
    fn test_parse_blank_is_placeholder() {
        assert_eq!(parse_reasoning("  \n "), Reasoning::placeholder());
        assert_eq!(parse_reasoning("Rationale:"), Reasoning::placeholder());
    }

    #[tokio::test]
    async fn test_unconfigured_service() {
        let service = ReasonerService::new(&Config::default());
        assert!(!service.is_configured());

        let err = service.reason("What is BP?").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::NotConfigured)));

        // 参数校验先于配置检查
        let err = service.reason("  ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    /// 测试真实推理接口
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_live_reasoner -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_live_reasoner() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config {
            llm_api_key: std::env::var("LLM_API_KEY").ok(),
            ..Config::default()
        };
        let service = ReasonerService::new(&config);

        let reasoning = service
            .reason("A patient on furosemide reports muscle cramps. Which electrolyte should be checked first?")
            .await
            .expect("推理接口调用失败");

        println!("答案: {}", reasoning.answer);
        println!("解析: {}", reasoning.rationale);
        assert!(!reasoning.answer.is_empty());
    }
}

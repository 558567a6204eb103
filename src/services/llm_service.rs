//! LLM 服务 - 业务能力层
//!
//! 只负责"调用模型"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 通过 OpenAI 兼容端点访问 Gemini，文档以 data URL 形式随消息发送
//! - 推理强度提示以 `reasoning_effort` 字段转发

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
        ReasoningEffort as ApiReasoningEffort,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::ReasoningEffort;

/// 一次模型调用的输入
#[derive(Debug, Clone, Copy)]
pub struct ModelCall<'a> {
    /// 文档名，仅用于日志
    pub label: &'a str,
    pub mime_type: &'a str,
    pub data: &'a [u8],
    pub instruction: &'a str,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// 外部生成模型
///
/// 实现只负责一次请求/响应，不做重试。返回 `Ok(None)` 表示模型没有给出文本。
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, call: ModelCall<'_>) -> Result<Option<String>>;
}

/// 基于 OpenAI 兼容接口的模型客户端
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建交互模式使用的服务
    pub fn new(config: &Config) -> Self {
        Self::with_model(config, config.llm_model_name.clone())
    }

    /// 创建指定模型的服务（批处理模式使用 `batch_model_name`）
    pub fn with_model(config: &Config, model_name: impl Into<String>) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 构建请求：一条用户消息，包含文档（data URL）和指令文本
    fn build_request(&self, call: &ModelCall<'_>) -> Result<CreateChatCompletionRequest> {
        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: to_data_url(call.mime_type, call.data),
                        detail: Some(ImageDetail::High),
                    },
                },
            ),
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: call.instruction.to_string(),
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)]);
        if let Some(effort) = call.reasoning_effort {
            args.reasoning_effort(api_reasoning_effort(effort));
        }

        Ok(args.build()?)
    }
}

#[async_trait]
impl ModelClient for LlmService {
    async fn generate(&self, call: ModelCall<'_>) -> Result<Option<String>> {
        debug!(
            "调用 LLM API，模型: {}，文档: {} ({}, {} 字节)",
            self.model_name,
            call.label,
            call.mime_type,
            call.data.len()
        );

        let request = self.build_request(&call)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone()))
    }
}

/// 文档编码为 `data:<mime>;base64,<data>`
pub fn to_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(data))
}

fn api_reasoning_effort(effort: ReasoningEffort) -> ApiReasoningEffort {
    match effort {
        ReasoningEffort::Low => ApiReasoningEffort::Low,
        ReasoningEffort::Medium => ApiReasoningEffort::Medium,
        ReasoningEffort::High => ApiReasoningEffort::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> LlmService {
        let config = Config {
            llm_api_key: std::env::var(crate::config::API_KEY_VAR).unwrap_or_default(),
            ..Config::default()
        };
        LlmService::with_model(&config, "gemini-3-flash-preview")
    }

    #[test]
    fn test_to_data_url() {
        assert_eq!(
            to_data_url("application/pdf", b"%PDF"),
            "data:application/pdf;base64,JVBERg=="
        );
    }

    #[test]
    fn test_build_request_carries_document_and_effort() {
        let service = create_test_service();
        let call = ModelCall {
            label: "paper.pdf",
            mime_type: "application/pdf",
            data: b"%PDF",
            instruction: "summarize",
            reasoning_effort: Some(ReasoningEffort::Low),
        };
        let request = service.build_request(&call).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gemini-3-flash-preview");
        assert_eq!(json["reasoning_effort"], "low");
        let body = json.to_string();
        assert!(body.contains("data:application/pdf;base64,JVBERg=="));
        assert!(body.contains("summarize"));
    }

    #[test]
    fn test_build_request_without_effort() {
        let service = create_test_service();
        let call = ModelCall {
            label: "paper.pdf",
            mime_type: "application/pdf",
            data: b"%PDF",
            instruction: "summarize",
            reasoning_effort: None,
        };
        let request = service.build_request(&call).unwrap();
        assert_eq!(request.reasoning_effort, None);

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("reasoning_effort").is_none());
    }

    /// 需要 GEMINI_API_KEY
    #[tokio::test]
    #[ignore]
    async fn test_generate_with_real_api() {
        let _ = tracing_subscriber::fmt::try_init();
        let service = create_test_service();

        // 1x1 PNG
        let png = BASE64
            .decode("iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==")
            .unwrap();
        let call = ModelCall {
            label: "pixel.png",
            mime_type: "image/png",
            data: &png,
            instruction: "Describe this image in one sentence.",
            reasoning_effort: None,
        };

        let text = service.generate(call).await.unwrap();
        assert!(text.is_some_and(|t| !t.is_empty()));
    }
}

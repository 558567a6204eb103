//! 单个摘要执行器 - 业务能力层
//!
//! 一次调用、一次尝试，不做内部重试，除网络调用外没有副作用。

use crate::error::DigestError;
use crate::models::{DigestJob, DigestResult, ReasoningEffort};
use crate::services::llm_service::{ModelCall, ModelClient};
use tracing::{debug, warn};

/// 单个摘要执行器
pub struct DigestExecutor<C> {
    client: C,
    reasoning_effort: Option<ReasoningEffort>,
}

impl<C: ModelClient> DigestExecutor<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            reasoning_effort: None,
        }
    }

    pub fn with_reasoning_effort(mut self, effort: Option<ReasoningEffort>) -> Self {
        self.reasoning_effort = effort;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// 执行任务并对结果分类
    ///
    /// - 非空文本：成功，原样返回
    /// - 空文本或缺失：`EmptyResponse`
    /// - 调用失败：`TransportError`，带上游错误信息
    pub async fn execute(&self, job: &DigestJob) -> Result<DigestResult, DigestError> {
        let call = ModelCall {
            label: &job.label,
            mime_type: &job.mime_type,
            data: &job.source_bytes,
            instruction: &job.instruction,
            reasoning_effort: self.reasoning_effort,
        };

        match self.client.generate(call).await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                debug!("✓ {} 生成完成，{} 字符", job.label, text.chars().count());
                Ok(DigestResult { markdown: text })
            }
            Ok(_) => {
                warn!("⚠️ {} 模型返回空结果", job.label);
                Err(DigestError::EmptyResponse {
                    label: job.label.clone(),
                })
            }
            Err(e) => Err(DigestError::TransportError {
                label: job.label.clone(),
                message: format!("{:#}", e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, Language};
    use crate::services::prompt_builder::DigestRequestBuilder;
    use crate::testing::ScriptedModelClient;

    fn job(name: &str) -> DigestJob {
        DigestRequestBuilder::new().build(
            Document::new(name, b"%PDF".to_vec(), "application/pdf"),
            "# <% tp.file.title %>",
            Language::En,
        )
    }

    #[tokio::test]
    async fn test_success_returns_raw_text() {
        let client = ScriptedModelClient::new().reply_for("a.pdf", "  # Title\n\nbody\n");
        let executor = DigestExecutor::new(client);
        let result = executor.execute(&job("a.pdf")).await.unwrap();
        assert_eq!(result.markdown, "  # Title\n\nbody\n");
    }

    #[tokio::test]
    async fn test_empty_and_missing_text() {
        let client = ScriptedModelClient::new()
            .empty_for("blank.pdf")
            .reply_for("spaces.pdf", "   \n");
        let executor = DigestExecutor::new(client);

        for name in ["blank.pdf", "spaces.pdf"] {
            let err = executor.execute(&job(name)).await.unwrap_err();
            assert_eq!(
                err,
                DigestError::EmptyResponse {
                    label: name.to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn test_transport_error_carries_upstream_message() {
        let client = ScriptedModelClient::new().fail_for("a.pdf", "429 RESOURCE_EXHAUSTED");
        let executor = DigestExecutor::new(client);
        let err = executor.execute(&job("a.pdf")).await.unwrap_err();
        match err {
            DigestError::TransportError { label, message } => {
                assert_eq!(label, "a.pdf");
                assert!(message.contains("429 RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_attempt_and_effort_forwarded() {
        let client = ScriptedModelClient::new().fail_for("a.pdf", "boom");
        let executor =
            DigestExecutor::new(client).with_reasoning_effort(Some(ReasoningEffort::Medium));
        let _ = executor.execute(&job("a.pdf")).await;

        let calls = executor.client().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].label, "a.pdf");
        assert_eq!(calls[0].reasoning_effort, Some(ReasoningEffort::Medium));
    }
}

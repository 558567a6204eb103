//! 交互式摘要流程 - 流程层
//!
//! 核心职责：定义"上传一篇论文"的完整处理流程
//!
//! 状态：Idle → Analyzing → Success | Error。失败后错误可被关闭，
//! 会话回到可重试的状态。

use tracing::{error, info};

use crate::error::DigestError;
use crate::models::{Document, Language};
use crate::services::{DigestExecutor, DigestRequestBuilder, ModelClient};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Idle,
    Analyzing,
    Success,
    Error,
}

/// 交互式摘要会话
pub struct DigestSession<C> {
    executor: DigestExecutor<C>,
    builder: DigestRequestBuilder,
    language: Language,
    state: LoadingState,
    digest: Option<String>,
    error: Option<String>,
}

impl<C: ModelClient> DigestSession<C> {
    pub fn new(executor: DigestExecutor<C>) -> Self {
        Self {
            executor,
            builder: DigestRequestBuilder::new(),
            language: Language::default(),
            state: LoadingState::Idle,
            digest: None,
            error: None,
        }
    }

    pub fn state(&self) -> LoadingState {
        self.state
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// 对文档执行一次摘要
    ///
    /// 开始时清掉上一次的结果和错误。
    pub async fn analyze(
        &mut self,
        document: Document,
        template_content: &str,
    ) -> Result<&str, DigestError> {
        self.state = LoadingState::Analyzing;
        self.error = None;
        self.digest = None;

        let label = document.name.clone();
        info!("🤖 正在分析 {} (语言: {})", label, self.language);
        let job = self.builder.build(document, template_content, self.language);

        match self.executor.execute(&job).await {
            Ok(result) => {
                info!("✅ {} 摘要生成完成", label);
                self.state = LoadingState::Success;
                Ok(self.digest.insert(result.markdown).as_str())
            }
            Err(e) => {
                error!("❌ {} 摘要生成失败: {}", label, e);
                self.state = LoadingState::Error;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// 关闭错误提示
    pub fn dismiss_error(&mut self) {
        self.error = None;
        if self.state == LoadingState::Error {
            self.state = LoadingState::Idle;
        }
    }

    /// 丢弃当前结果，回到初始状态
    pub fn reset(&mut self) {
        self.digest = None;
        self.error = None;
        self.state = LoadingState::Idle;
    }
}

//! 测试替身
//!
//! 内存版的模板存储、本地存储和可编排的模型客户端。克隆出的实例共享状态，
//! 交给仓库或执行器之后仍可在测试中检查。

use crate::error::TemplateError;
use crate::models::{ReasoningEffort, Template};
use crate::services::llm_service::{ModelCall, ModelClient};
use crate::templates::fallback::{FallbackStorage, FALLBACK_KEY};
use crate::templates::store::TemplateStore;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

// ========== 模板存储 ==========

#[derive(Default)]
struct StoreState {
    templates: Vec<Template>,
    upserts: Vec<(String, String)>,
    offline: bool,
}

/// 内存模板存储，语义与模板服务端一致
#[derive(Clone, Default)]
pub struct MemoryTemplateStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        let store = Self::new();
        store.state.lock().templates = templates;
        store
    }

    /// 模拟远程不可达
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// 收到的 upsert 请求 (name, content)
    pub fn upserts(&self) -> Vec<(String, String)> {
        self.state.lock().upserts.clone()
    }

    pub fn snapshot(&self) -> Vec<Template> {
        self.state.lock().templates.clone()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn list(&self) -> Result<Vec<Template>> {
        let state = self.state.lock();
        if state.offline {
            anyhow::bail!("connection refused");
        }
        Ok(state.templates.clone())
    }

    async fn upsert(&self, name: &str, content: &str) -> Result<String> {
        let mut state = self.state.lock();
        if state.offline {
            anyhow::bail!("connection refused");
        }
        if name.trim().is_empty() || content.is_empty() {
            return Err(TemplateError::Validation("缺少 name 或 content".to_string()).into());
        }
        state.upserts.push((name.to_string(), content.to_string()));

        let template = Template::custom(name, content);
        let id = template.id.clone();
        match state.templates.iter().position(|t| t.id == id) {
            Some(index) => state.templates[index].content = template.content,
            None => state.templates.push(template),
        }
        Ok(format!("{}.md", id))
    }
}

// ========== 本地存储 ==========

/// 内存键值存储
#[derive(Clone, Default)]
pub struct MemoryFallbackStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryFallbackStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 自定义模板键下的原始内容
    pub fn raw(&self) -> Option<String> {
        self.values.lock().get(FALLBACK_KEY).cloned()
    }

    pub fn set_raw(&self, raw: impl Into<String>) {
        self.values.lock().insert(FALLBACK_KEY.to_string(), raw.into());
    }
}

impl FallbackStorage for MemoryFallbackStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ========== 模型客户端 ==========

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Empty,
    Fail(String),
}

/// 一次记录下来的模型调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub label: String,
    pub mime_type: String,
    pub instruction: String,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// 按文档名编排回复的模型客户端
///
/// 未编排的文档返回 `# Digest of <name>`。
#[derive(Clone, Default)]
pub struct ScriptedModelClient {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_for(self, label: &str, text: &str) -> Self {
        self.script(label, Reply::Text(text.to_string()))
    }

    pub fn empty_for(self, label: &str) -> Self {
        self.script(label, Reply::Empty)
    }

    pub fn fail_for(self, label: &str, message: &str) -> Self {
        self.script(label, Reply::Fail(message.to_string()))
    }

    fn script(self, label: &str, reply: Reply) -> Self {
        self.replies.lock().insert(label.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn generate(&self, call: ModelCall<'_>) -> Result<Option<String>> {
        self.calls.lock().push(RecordedCall {
            label: call.label.to_string(),
            mime_type: call.mime_type.to_string(),
            instruction: call.instruction.to_string(),
            reasoning_effort: call.reasoning_effort,
        });

        let reply = self.replies.lock().get(call.label).cloned();
        match reply {
            Some(Reply::Text(text)) => Ok(Some(text)),
            Some(Reply::Empty) => Ok(None),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(Some(format!("# Digest of {}\n", call.label))),
        }
    }
}

//! 模板仓库
//!
//! 维护当前会话的模板工作集，并与三个来源对账：
//!
//! 1. 远程存储：可用时总是胜出，整体替换工作集
//! 2. 本地兜底存储：只在远程不可用时作为补充读取
//! 3. 内置模板：进程启动时载入，永远不可修改
//!
//! 修改采用乐观写入：先改内存，再尝试远程持久化。远程失败不会回滚，
//! 结果记录在 [`IntentLog`] 中。
//!
//! 注意：`save_as_new` 的远程写入失败后，模板在本次会话中仍然可用，
//! 但下一次成功的 `list_templates()` 会用远程列表覆盖它（至多一次的持久性）。
//!
//! 工作集只允许单一调用方修改（`&mut self`），没有并发写入保护。

use super::fallback::{load_custom_templates, store_custom_templates, FallbackStorage};
use super::intent::{IntentLog, WriteKind};
use super::store::TemplateStore;
use crate::error::TemplateError;
use crate::models::{default_templates, Template};
use tracing::{debug, info, warn};

/// 工作集最近一次成功加载的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    /// 只有内置模板
    Defaults,
    /// 远程列表
    Remote,
    /// 内置模板 + 本地兜底存储
    LocalFallback,
}

/// 新模板 id 冲突时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// 原地替换同 id 的自定义模板，与服务端按 id upsert 的行为一致
    #[default]
    Overwrite,
    /// 拒绝保存
    Reject,
}

/// 远程持久化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Committed,
    Failed(String),
}

impl Persistence {
    pub fn is_committed(&self) -> bool {
        matches!(self, Persistence::Committed)
    }
}

/// `save_existing` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// 内置模板，忽略
    Ignored,
    NotFound,
    /// 内存已更新，附带远程结果
    Saved(Persistence),
}

/// `delete_template` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// 内置模板，忽略
    Ignored,
    NotFound,
    /// 调用方未确认
    Declined,
    Deleted,
}

/// 模板仓库
pub struct TemplateRepository {
    remote: Box<dyn TemplateStore>,
    fallback: Box<dyn FallbackStorage>,
    templates: Vec<Template>,
    selected_id: Option<String>,
    draft: String,
    source: TemplateSource,
    collision_policy: CollisionPolicy,
    intents: IntentLog,
}

impl TemplateRepository {
    /// 创建仓库，工作集初始化为内置模板，选中第一个
    pub fn new(remote: Box<dyn TemplateStore>, fallback: Box<dyn FallbackStorage>) -> Self {
        let templates = default_templates();
        let selected_id = templates.first().map(|t| t.id.clone());
        let draft = templates
            .first()
            .map(|t| t.content.clone())
            .unwrap_or_default();
        Self {
            remote,
            fallback,
            templates,
            selected_id,
            draft,
            source: TemplateSource::Defaults,
            collision_policy: CollisionPolicy::default(),
            intents: IntentLog::new(),
        }
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    // ========== 查询 ==========

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&Template> {
        self.selected_id.as_deref().and_then(|id| self.get(id))
    }

    /// 编辑器中的当前内容
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, content: impl Into<String>) {
        self.draft = content.into();
    }

    pub fn source(&self) -> TemplateSource {
        self.source
    }

    pub fn intents(&self) -> &IntentLog {
        &self.intents
    }

    // ========== 加载 ==========

    /// 从远程刷新工作集
    ///
    /// 远程成功时整体替换；失败时退化为内置模板 + 本地存储中的模板。
    /// 失败不会向上传播。
    pub async fn list_templates(&mut self) -> &[Template] {
        match self.remote.list().await {
            Ok(remote_templates) => {
                if remote_templates.is_empty() {
                    debug!("远程模板列表为空，保留当前工作集");
                } else {
                    info!("✓ 从远程加载 {} 个模板", remote_templates.len());
                    self.templates = remote_templates;
                }
                self.source = TemplateSource::Remote;
            }
            Err(e) => {
                warn!("⚠️ 远程模板加载失败，使用内置模板和本地存储: {}", e);
                let mut templates = default_templates();
                let local = load_custom_templates(self.fallback.as_ref());
                let mut added = 0;
                for template in local {
                    if templates.iter().all(|t| t.id != template.id) {
                        templates.push(template);
                        added += 1;
                    }
                }
                self.templates = templates;
                self.source = if added > 0 {
                    TemplateSource::LocalFallback
                } else {
                    TemplateSource::Defaults
                };
            }
        }
        self.ensure_selection();
        &self.templates
    }

    /// 选中的 id 不在工作集中时，重置为第一个模板
    fn ensure_selection(&mut self) {
        let exists = self
            .selected_id
            .as_deref()
            .is_some_and(|id| self.templates.iter().any(|t| t.id == id));
        if !exists {
            self.reset_selection();
        }
    }

    fn reset_selection(&mut self) {
        match self.templates.first() {
            Some(first) => {
                self.selected_id = Some(first.id.clone());
                self.draft = first.content.clone();
            }
            None => {
                self.selected_id = None;
                self.draft.clear();
            }
        }
    }

    // ========== 选择 ==========

    /// 选中模板并把内容载入编辑器；id 不存在时保持原状
    pub fn select_template(&mut self, id: &str) -> Option<&Template> {
        let index = self.templates.iter().position(|t| t.id == id)?;
        self.selected_id = Some(id.to_string());
        self.draft = self.templates[index].content.clone();
        Some(&self.templates[index])
    }

    // ========== 修改 ==========

    /// 保存已有模板的内容修改
    ///
    /// 内置模板直接忽略。内存立即更新，远程失败不回滚。
    pub async fn save_existing(
        &mut self,
        id: &str,
        content: &str,
    ) -> Result<SaveOutcome, TemplateError> {
        let Some(index) = self.templates.iter().position(|t| t.id == id) else {
            return Ok(SaveOutcome::NotFound);
        };
        if self.templates[index].is_default {
            debug!("内置模板 {} 不可编辑，忽略", id);
            return Ok(SaveOutcome::Ignored);
        }
        if content.is_empty() {
            return Err(TemplateError::Validation("模板内容不能为空".to_string()));
        }

        self.templates[index].content = content.to_string();
        let name = self.templates[index].name.clone();
        self.mirror_to_fallback();

        let persistence = self.persist(id, &name, content, WriteKind::Update).await;
        Ok(SaveOutcome::Saved(persistence))
    }

    /// 另存为新模板并选中它
    ///
    /// id 由名称派生。远程失败时模板只在本次会话中可用。
    pub async fn save_as_new(
        &mut self,
        name: &str,
        content: &str,
    ) -> Result<(Template, Persistence), TemplateError> {
        let name = name.trim();
        if name.is_empty() || content.is_empty() {
            return Err(TemplateError::Validation("缺少 name 或 content".to_string()));
        }
        let template = Template::custom(name, content);
        if template.id.is_empty() {
            return Err(TemplateError::Validation(format!(
                "名称 '{}' 无法生成有效 id",
                name
            )));
        }

        match self.templates.iter().position(|t| t.id == template.id) {
            Some(index) if self.templates[index].is_default => {
                return Err(TemplateError::DefaultCollision {
                    id: template.id.clone(),
                });
            }
            Some(_) if self.collision_policy == CollisionPolicy::Reject => {
                return Err(TemplateError::Duplicate {
                    id: template.id.clone(),
                });
            }
            Some(index) => {
                debug!("模板 id {} 已存在，原地覆盖", template.id);
                self.templates[index] = template.clone();
            }
            None => self.templates.push(template.clone()),
        }

        self.selected_id = Some(template.id.clone());
        self.draft = template.content.clone();
        self.mirror_to_fallback();

        let persistence = self
            .persist(&template.id, &template.name, content, WriteKind::Create)
            .await;
        Ok((template, persistence))
    }

    /// 删除自定义模板
    ///
    /// 需要调用方通过 `confirm` 明确确认。删除后选中剩余的第一个模板，
    /// 并用剩余的自定义模板整体覆盖本地存储。
    pub fn delete_template<F>(&mut self, id: &str, confirm: F) -> DeleteOutcome
    where
        F: FnOnce(&Template) -> bool,
    {
        let Some(index) = self.templates.iter().position(|t| t.id == id) else {
            return DeleteOutcome::NotFound;
        };
        if self.templates[index].is_default {
            debug!("内置模板 {} 不可删除，忽略", id);
            return DeleteOutcome::Ignored;
        }
        if !confirm(&self.templates[index]) {
            return DeleteOutcome::Declined;
        }

        let removed = self.templates.remove(index);
        info!("🗑️ 已删除模板: {}", removed.name);
        self.reset_selection();
        self.mirror_to_fallback();
        DeleteOutcome::Deleted
    }

    // ========== 持久化 ==========

    async fn persist(&mut self, id: &str, name: &str, content: &str, kind: WriteKind) -> Persistence {
        let seq = self.intents.begin(id, kind);
        match self.remote.upsert(name, content).await {
            Ok(_) => {
                self.intents.commit(seq);
                Persistence::Committed
            }
            Err(e) => {
                warn!("⚠️ 模板 {} 远程保存失败，修改仅在本次会话有效: {}", id, e);
                let reason = e.to_string();
                self.intents.fail(seq, reason.clone());
                Persistence::Failed(reason)
            }
        }
    }

    /// 本地存储整体覆盖为当前的自定义模板，失败只记录日志
    fn mirror_to_fallback(&self) {
        if let Err(e) = store_custom_templates(self.fallback.as_ref(), &self.templates) {
            warn!("⚠️ 本地模板写入失败: {}", e);
        }
    }
}

//! 基于目录的模板存储
//!
//! 每个模板是目录中的一个 `<id>.md` 文件，展示名称由文件名派生。
//! 与模板服务端的语义相同，批处理模式直接使用它来解析 `--template`。

use super::store::TemplateStore;
use crate::error::TemplateError;
use crate::models::{default_templates, display_name_from_id, is_default_id, slugify, Template};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// 目录模板存储
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    dir: PathBuf,
}

impl DirectoryTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .await
                .with_context(|| format!("无法创建模板目录: {}", self.dir.display()))?;
        }
        Ok(())
    }

    /// 把缺失的内置模板写入目录，已存在的文件不会被覆盖
    pub async fn seed_defaults(&self) -> Result<usize> {
        self.ensure_dir().await?;
        let mut written = 0;
        for template in default_templates() {
            let path = self.path_for(&template.id);
            if !path.exists() {
                fs::write(&path, template.content.trim_start())
                    .await
                    .with_context(|| format!("无法写入内置模板: {}", path.display()))?;
                written += 1;
            }
        }
        if written > 0 {
            info!("📝 已写入 {} 个内置模板到 {}", written, self.dir.display());
        }
        Ok(written)
    }

    /// 按名称查找模板，名称即文件名（不含 `.md`）
    pub async fn find(&self, name: &str) -> Result<Option<Template>> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(self.read_template(&path, name).await?))
    }

    /// 按名称加载模板，不存在时返回列出可用模板的错误
    pub async fn require(&self, name: &str) -> Result<Template> {
        match self.find(name).await? {
            Some(template) => Ok(template),
            None => Err(TemplateError::NotFound {
                name: name.to_string(),
                available: self.available().await?,
            }
            .into()),
        }
    }

    /// 可用模板名称列表
    pub async fn available(&self) -> Result<Vec<String>> {
        Ok(self.list().await?.into_iter().map(|t| t.id).collect())
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.md", id))
    }

    async fn read_template(&self, path: &Path, id: &str) -> Result<Template> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取模板: {}", path.display()))?;
        Ok(Template {
            id: id.to_string(),
            name: display_name_from_id(id),
            content,
            is_default: is_default_id(id),
        })
    }
}

#[async_trait]
impl TemplateStore for DirectoryTemplateStore {
    /// 内置模板按固定顺序排在前面，其余按 id 排序
    async fn list(&self) -> Result<Vec<Template>> {
        self.ensure_dir().await?;

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("无法读取模板目录: {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("md") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort_by_key(|id| {
            let rank = crate::models::defaults::DEFAULT_TEMPLATE_IDS
                .iter()
                .position(|d| *d == id.as_str())
                .unwrap_or(usize::MAX);
            (rank, id.clone())
        });

        let mut templates = Vec::with_capacity(ids.len());
        for id in ids {
            templates.push(self.read_template(&self.path_for(&id), &id).await?);
        }
        Ok(templates)
    }

    async fn upsert(&self, name: &str, content: &str) -> Result<String> {
        if name.trim().is_empty() || content.is_empty() {
            return Err(TemplateError::Validation("缺少 name 或 content".to_string()).into());
        }
        let id = slugify(name);
        if id.is_empty() {
            return Err(TemplateError::Validation(format!("名称 '{}' 无法生成有效 id", name)).into());
        }

        self.ensure_dir().await?;
        let path = self.path_for(&id);
        fs::write(&path, content)
            .await
            .with_context(|| format!("无法保存模板: {}", path.display()))?;
        info!("💾 模板已保存到 {}", path.display());

        Ok(format!("{}.md", id))
    }
}

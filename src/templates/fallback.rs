//! 本地兜底存储
//!
//! 只保存非内置模板，只有在远程不可用时才会被读取。

use crate::models::Template;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// 保存自定义模板的键
pub const FALLBACK_KEY: &str = "custom_templates";

/// 键值形式的本地存储
pub trait FallbackStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// 每个键对应目录下的一个 `<key>.json` 文件
#[derive(Debug, Clone)]
pub struct FileFallbackStorage {
    dir: PathBuf,
}

impl FileFallbackStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl FallbackStorage for FileFallbackStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("无法读取本地存储: {}", path.display()))?;
        Ok(Some(raw))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("无法创建本地存储目录: {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("无法写入本地存储: {}", path.display()))
    }
}

/// 读取本地保存的自定义模板
///
/// 读取或解析失败都会被吞掉并返回空列表。
pub fn load_custom_templates(storage: &dyn FallbackStorage) -> Vec<Template> {
    let raw = match storage.read(FALLBACK_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("⚠️ 读取本地模板失败: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Template>>(&raw) {
        Ok(templates) => templates
            .into_iter()
            .map(|mut t| {
                t.is_default = false;
                t
            })
            .collect(),
        Err(e) => {
            warn!("⚠️ 本地模板解析失败，忽略: {}", e);
            Vec::new()
        }
    }
}

/// 用给定集合中的非内置模板整体覆盖本地存储
pub fn store_custom_templates(storage: &dyn FallbackStorage, templates: &[Template]) -> Result<()> {
    let custom: Vec<&Template> = templates.iter().filter(|t| !t.is_default).collect();
    let raw = serde_json::to_string(&custom)?;
    storage.write(FALLBACK_KEY, &raw)?;
    debug!("本地模板已覆盖写入，共 {} 个", custom.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_templates;

    #[test]
    fn test_store_keeps_only_custom_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileFallbackStorage::new(dir.path().join("store"));

        let mut templates = default_templates();
        templates.push(Template::custom("Lab Notes", "# notes"));
        store_custom_templates(&storage, &templates).unwrap();

        let raw = storage.read(FALLBACK_KEY).unwrap().unwrap();
        assert_eq!(raw, r##"[{"id":"lab-notes","name":"Lab Notes","content":"# notes"}]"##);

        let loaded = load_custom_templates(&storage);
        assert_eq!(loaded, vec![Template::custom("Lab Notes", "# notes")]);
    }

    #[test]
    fn test_missing_or_corrupt_storage_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileFallbackStorage::new(dir.path());
        assert!(load_custom_templates(&storage).is_empty());

        storage.write(FALLBACK_KEY, "{not json").unwrap();
        assert!(load_custom_templates(&storage).is_empty());
    }
}

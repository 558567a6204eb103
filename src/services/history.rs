//! 摘要历史
//!
//! 最近生成的摘要，最新的在前，最多保留 3 条。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// 历史记录保留条数
pub const HISTORY_LIMIT: usize = 3;

/// 一条历史记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub markdown: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    pub fn new(filename: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            markdown: markdown.into(),
            created_at: Some(Utc::now()),
        }
    }
}

/// JSON 文件形式的历史存储
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 读取全部历史，文件不存在时为空
    pub async fn load(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("无法读取历史: {}", self.path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("无法解析历史: {}", self.path.display()))
    }

    /// 插入到最前面并截断，返回更新后的列表
    pub async fn push(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>> {
        let mut history = self.load().await?;
        history.insert(0, entry);
        history.truncate(HISTORY_LIMIT);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(&history)?;
        fs::write(&self.path, raw)
            .await
            .with_context(|| format!("无法写入历史: {}", self.path.display()))?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_newest_first_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("temp/history.json"));
        assert!(store.load().await.unwrap().is_empty());

        for i in 1..=4 {
            store
                .push(HistoryEntry::new(format!("p{}.pdf", i), format!("# {}", i)))
                .await
                .unwrap();
        }

        let history = store.load().await.unwrap();
        let names: Vec<_> = history.iter().map(|h| h.filename.as_str()).collect();
        assert_eq!(names, vec!["p4.pdf", "p3.pdf", "p2.pdf"]);
    }

    #[tokio::test]
    async fn test_reads_entries_without_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, r##"[{"markdown":"# x","filename":"x.pdf"}]"##).unwrap();

        let history = HistoryStore::new(&path).load().await.unwrap();
        assert_eq!(history[0].filename, "x.pdf");
        assert_eq!(history[0].created_at, None);
    }
}

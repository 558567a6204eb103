//! 失败日志 - 业务能力层
//!
//! 只负责"把失败任务追加写入文件"能力，不关心流程

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::DigestError;

/// 失败日志
///
/// 每个失败任务写一行：时间 | 文件 | 错误类别 | 错误信息
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// 追加一条失败记录
    pub async fn write(&self, label: &str, error: &DigestError) -> Result<()> {
        debug!("写入失败日志: {} | {}", label, error.kind());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开失败日志: {}", self.path.display()))?;

        let line = format!(
            "{} | {} | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            label,
            error.kind(),
            error.to_string().replace('\n', " ")
        );

        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

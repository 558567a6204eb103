//! 远程模板存储
//!
//! 协议：`GET /api/templates` 返回有序的模板列表，`POST /api/save-template`
//! 以 `{name, content}` 做 upsert，服务端用同样的规则从名称派生 id。

use crate::models::Template;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 远程模板存储接口
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// 获取全部模板（有序）
    async fn list(&self) -> Result<Vec<Template>>;

    /// 按名称 upsert，返回服务端保存的文件名
    async fn upsert(&self, name: &str, content: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct SaveTemplateRequest<'a> {
    name: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaveTemplateResponse {
    #[serde(default)]
    filename: Option<String>,
}

/// 基于 HTTP 的模板存储客户端
pub struct HttpTemplateStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTemplateStore {
    /// 创建新的客户端，超时交给底层传输
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("无法创建 HTTP 客户端")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl TemplateStore for HttpTemplateStore {
    async fn list(&self) -> Result<Vec<Template>> {
        let url = self.endpoint("/api/templates");
        debug!("获取远程模板列表: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("请求模板列表失败: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("模板列表返回错误状态 {}: {}", status, body);
        }

        response
            .json::<Vec<Template>>()
            .await
            .context("无法解析模板列表")
    }

    async fn upsert(&self, name: &str, content: &str) -> Result<String> {
        let url = self.endpoint("/api/save-template");
        debug!("保存模板到远程: {} ({})", name, url);

        let response = self
            .client
            .post(&url)
            .json(&SaveTemplateRequest { name, content })
            .send()
            .await
            .with_context(|| format!("保存模板请求失败: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("保存模板返回错误状态 {}: {}", status, body);
        }

        let saved: SaveTemplateResponse = response.json().await.context("无法解析保存结果")?;
        Ok(saved.filename.unwrap_or_default())
    }
}

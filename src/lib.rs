//! # Scholar Digest
//!
//! 把学术论文（PDF / 图片）交给多模态大模型，按 Markdown 模板生成结构化摘要
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础层（Models / Templates）
//! - `models/` - 文档、模板、任务等数据类型，slug 规则，内置模板
//! - `templates/` - 模板工作集：远程服务 / 本地存储 / 内置模板三层来源
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文档
//! - `LlmService` - 多模态模型调用能力
//! - `DigestRequestBuilder` - 组装指令
//! - `DigestExecutor` - 单次执行并分类结果
//! - `FailureLog` / `HistoryStore` - 失败日志与摘要历史
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇论文"的交互式处理流程
//! - `JobCtx` - 上下文封装（序号 + 文件名）
//! - `DigestSession` - 会话状态（Idle → Analyzing → Success | Error）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，顺序执行、冷却、失败隔离
//! - `orchestrator/progress` - 进度观察
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod templates;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ConfigError, DigestError, TemplateError};
pub use models::{Document, Language, Template};
pub use orchestrator::{BatchOptions, BatchOrchestrator, BatchReport, ProgressObserver};
pub use services::{DigestExecutor, LlmService, ModelClient};
pub use templates::{TemplateRepository, TemplateSource};
pub use workflow::{DigestSession, LoadingState};

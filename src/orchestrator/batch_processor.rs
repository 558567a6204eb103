//! 批量摘要处理器 - 编排层
//!
//! ## 职责
//!
//! 负责一次批量运行的全部调度，不处理单个文档的细节。
//!
//! ## 核心功能
//!
//! 1. **准备目录**：输入、输出目录不存在时自动创建
//! 2. **固定队列**：运行开始时扫描输入目录，之后队列不再变化
//! 3. **顺序执行**：单 worker，同一时刻只有一个模型调用
//! 4. **冷却**：任务之间固定等待，最后一个任务之后不等待
//! 5. **失败隔离**：单个任务失败记录后继续下一个
//! 6. **全局统计**：汇总为 `BatchReport`
//!
//! ## 设计特点
//!
//! - **向下委托**：单个文档交给 `DigestExecutor`
//! - **冷却不是重试**：重试由可插拔的 `RetryPolicy` 决定，默认不重试

use crate::error::DigestError;
use crate::models::{discover_documents, load_document, output_file_name, Language};
use crate::orchestrator::progress::{BatchState, Progress, ProgressObserver};
use crate::services::{DigestExecutor, DigestRequestBuilder, FailureLog, ModelClient};
use crate::utils::logging;
use crate::workflow::JobCtx;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// 每个任务只尝试一次
    #[default]
    None,
    /// 传输错误时按固定间隔重试
    Fixed { max_retries: u32, delay: Duration },
}

impl RetryPolicy {
    fn max_retries(&self) -> u32 {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_retries, .. } => *max_retries,
        }
    }

    fn delay(&self) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { delay, .. } => *delay,
        }
    }

    fn should_retry(&self, error: &DigestError, attempt: u32) -> bool {
        matches!(error, DigestError::TransportError { .. }) && attempt <= self.max_retries()
    }
}

/// 一次批量运行的参数
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// 已解析好的模板内容
    pub template_content: String,
    pub language: Language,
    pub cooldown: Duration,
    pub retry: RetryPolicy,
    /// 失败日志路径，`None` 表示不落盘
    pub failure_log: Option<PathBuf>,
}

impl BatchOptions {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        template_content: impl Into<String>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            template_content: template_content.into(),
            language: Language::default(),
            cooldown: Duration::from_secs(10),
            retry: RetryPolicy::None,
            failure_log: None,
        }
    }
}

/// 单个任务的结束状态
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Completed { output: PathBuf },
    Failed { error: DigestError },
}

/// 单个任务的结果
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub label: String,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Completed { .. })
    }

    pub fn error(&self) -> Option<&DigestError> {
        match &self.status {
            JobStatus::Failed { error } => Some(error),
            JobStatus::Completed { .. } => None,
        }
    }
}

/// 批量运行汇总
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 按队列顺序排列
    pub outcomes: Vec<JobOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// 批量摘要编排器
pub struct BatchOrchestrator<C> {
    executor: DigestExecutor<C>,
    builder: DigestRequestBuilder,
    options: BatchOptions,
    failure_log: Option<FailureLog>,
    state: BatchState,
    progress: Progress,
}

impl<C: ModelClient> BatchOrchestrator<C> {
    pub fn new(executor: DigestExecutor<C>, options: BatchOptions) -> Self {
        let failure_log = options.failure_log.clone().map(FailureLog::new);
        Self {
            executor,
            builder: DigestRequestBuilder::new(),
            options,
            failure_log,
            state: BatchState::Idle,
            progress: Progress::default(),
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// 执行整个批次
    ///
    /// 只有准备阶段（创建目录、扫描输入）的错误会返回 `Err`，
    /// 单个任务的失败记录在报告里。
    pub async fn run(&mut self, observer: &mut dyn ProgressObserver) -> Result<BatchReport> {
        let started = Instant::now();

        tokio::fs::create_dir_all(&self.options.output_dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.options.output_dir.display()))?;

        info!("\n📁 正在扫描待处理的文档...");
        let queue = discover_documents(&self.options.input_dir).await?;

        self.state = BatchState::Running;
        self.progress = Progress::new(queue.len());
        observer.on_run_started(&self.progress);

        let mut report = BatchReport {
            total: queue.len(),
            ..Default::default()
        };

        if queue.is_empty() {
            warn!(
                "⚠️ {} 中没有找到待处理的文档，程序结束",
                self.options.input_dir.display()
            );
        } else {
            logging::log_documents_loaded(queue.len(), self.options.cooldown);
        }

        let output_names = plan_output_names(&queue);
        let total = queue.len();
        for (idx, (path, output_name)) in queue.iter().zip(&output_names).enumerate() {
            let label = file_label(path);
            let ctx = JobCtx::new(idx + 1, total, label.clone());

            self.progress.current_label = Some(label.clone());
            observer.on_job_started(&self.progress);
            info!("{} 🤖 开始处理", ctx);

            let status = match self.process_job(&ctx, path, output_name).await {
                Ok(output) => {
                    info!("{} ✅ 已保存: {}", ctx, output.display());
                    self.progress.succeeded += 1;
                    JobStatus::Completed { output }
                }
                Err(e) => {
                    error!("{} ❌ 处理失败: {}", ctx, e);
                    self.record_failure(&label, &e).await;
                    self.progress.failed += 1;
                    JobStatus::Failed { error: e }
                }
            };

            let outcome = JobOutcome { label, status };
            self.progress.completed += 1;
            observer.on_job_finished(&self.progress, &outcome);
            report.outcomes.push(outcome);

            if !ctx.is_last() && !self.options.cooldown.is_zero() {
                info!(
                    "⏳ 冷却 {} 秒后继续...",
                    self.options.cooldown.as_secs_f32()
                );
                observer.on_cooldown(self.options.cooldown);
                tokio::time::sleep(self.options.cooldown).await;
            }
        }

        self.progress.current_label = None;
        self.state = BatchState::Done;

        report.succeeded = self.progress.succeeded;
        report.failed = self.progress.failed;
        report.elapsed = started.elapsed();

        logging::print_final_stats(
            report.succeeded,
            report.failed,
            report.total,
            &self.options.output_dir,
        );
        observer.on_run_finished(&report);

        Ok(report)
    }

    /// 处理单个文档：读取 → 生成 → 写出
    async fn process_job(
        &self,
        ctx: &JobCtx,
        path: &Path,
        output_name: &str,
    ) -> Result<PathBuf, DigestError> {
        let document = load_document(path).await.map_err(|e| DigestError::Io {
            path: path.display().to_string(),
            message: format!("{:#}", e),
        })?;

        let job = self.builder.build(
            document,
            &self.options.template_content,
            self.options.language,
        );

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            match self.executor.execute(&job).await {
                Ok(result) => break result,
                Err(e) if self.options.retry.should_retry(&e, attempt) => {
                    warn!("{} ⚠️ 第 {} 次尝试失败，准备重试: {}", ctx, attempt, e);
                    tokio::time::sleep(self.options.retry.delay()).await;
                }
                Err(e) => return Err(e),
            }
        };

        let output = self.options.output_dir.join(output_name);
        tokio::fs::write(&output, result.markdown.as_bytes())
            .await
            .map_err(|e| DigestError::Io {
                path: output.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(output)
    }

    async fn record_failure(&self, label: &str, error: &DigestError) {
        if let Some(log) = &self.failure_log {
            if let Err(e) = log.write(label, error).await {
                warn!("⚠️ 写入失败日志失败: {}", e);
            }
        }
    }
}

/// 为队列中的每个文档分配输出文件名
///
/// 默认是 `<stem>.md`。与前面的文档冲突时（同名不同扩展名，或只差大小写）
/// 改用 `<文件名>.md`，仍冲突则追加序号。
fn plan_output_names(queue: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::new();
    queue
        .iter()
        .map(|path| {
            let label = file_label(path);
            let mut name = output_file_name(&label);
            if taken.contains(&name.to_lowercase()) {
                let mut candidate = format!("{}.md", label);
                let mut n = 2;
                while taken.contains(&candidate.to_lowercase()) {
                    candidate = format!("{}-{}.md", label, n);
                    n += 1;
                }
                warn!("⚠️ {} 的输出文件名 {} 已被占用，改为 {}", label, name, candidate);
                name = candidate;
            }
            taken.insert(name.to_lowercase());
            name
        })
        .collect()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::batch_processor::{BatchReport, JobOutcome};
use crate::utils::logging::truncate_text;

/// 批处理运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Done,
}

/// 运行进度快照
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    /// 已结束的任务数（成功 + 失败）
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 正在处理的文件
    pub current_label: Option<String>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.total
    }
}

/// 进度观察者
///
/// 每个回调都在对应边界之后同步调用。
pub trait ProgressObserver {
    fn on_run_started(&mut self, _progress: &Progress) {}
    fn on_job_started(&mut self, _progress: &Progress) {}
    fn on_job_finished(&mut self, _progress: &Progress, _outcome: &JobOutcome) {}
    fn on_cooldown(&mut self, _duration: Duration) {}
    fn on_run_finished(&mut self, _report: &BatchReport) {}
}

/// 不做任何事的观察者
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// 终端进度条
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "Progress |{bar:40}| {percent}% || {pos}/{len} Files || {elapsed_precise} || {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░"),
        );
        Self { bar }
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_run_started(&mut self, progress: &Progress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(0);
        self.bar.set_message("Starting...");
    }

    fn on_job_started(&mut self, progress: &Progress) {
        if let Some(label) = &progress.current_label {
            self.bar
                .set_message(format!("Processing: {}", truncate_text(label, 30)));
        }
    }

    fn on_job_finished(&mut self, progress: &Progress, outcome: &JobOutcome) {
        self.bar.set_position(progress.completed as u64);
        if let Some(error) = outcome.error() {
            self.bar
                .println(format!("❌ {}: {}", outcome.label, error.kind()));
        }
    }

    fn on_cooldown(&mut self, duration: Duration) {
        self.bar
            .set_message(format!("Cooling down ({}s)...", duration.as_secs()));
    }

    fn on_run_finished(&mut self, _report: &BatchReport) {
        self.bar.finish_with_message("Done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_finished() {
        let mut progress = Progress::new(2);
        assert!(!progress.is_finished());
        progress.completed = 2;
        assert!(progress.is_finished());
        assert!(Progress::new(0).is_finished());
    }
}

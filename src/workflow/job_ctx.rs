//! 任务上下文
//!
//! 封装"我正在处理第几个文档"这一信息

use std::fmt::Display;

/// 批处理中单个任务的上下文
#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 任务序号（从1开始）
    pub index: usize,

    /// 本次运行的任务总数
    pub total: usize,

    /// 来源文件名
    pub label: String,
}

impl JobCtx {
    pub fn new(index: usize, total: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            total,
            label: label.into(),
        }
    }

    /// 是否为最后一个任务
    pub fn is_last(&self) -> bool {
        self.index >= self.total
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[任务 {}/{} {}]", self.index, self.total, self.label)
    }
}

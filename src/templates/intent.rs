//! 写入意图记录
//!
//! 乐观写入先改内存，再尝试远程持久化。每次远程写入都会留下一条记录，
//! 调用方可以查询哪些修改已经落盘、哪些失败。

use chrono::{DateTime, Utc};

/// 写入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

/// 写入状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Pending,
    Committed,
    Failed(String),
}

/// 一条写入意图
#[derive(Debug, Clone)]
pub struct WriteIntent {
    pub seq: u64,
    pub template_id: String,
    pub kind: WriteKind,
    pub status: WriteStatus,
    pub recorded_at: DateTime<Utc>,
}

/// 写入意图日志（仅存在于内存中）
#[derive(Debug, Default)]
pub struct IntentLog {
    next_seq: u64,
    entries: Vec<WriteIntent>,
}

impl IntentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条待提交的写入，返回序号
    pub fn begin(&mut self, template_id: &str, kind: WriteKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(WriteIntent {
            seq,
            template_id: template_id.to_string(),
            kind,
            status: WriteStatus::Pending,
            recorded_at: Utc::now(),
        });
        seq
    }

    pub fn commit(&mut self, seq: u64) {
        self.set_status(seq, WriteStatus::Committed);
    }

    pub fn fail(&mut self, seq: u64, reason: impl Into<String>) {
        self.set_status(seq, WriteStatus::Failed(reason.into()));
    }

    fn set_status(&mut self, seq: u64, status: WriteStatus) {
        if let Some(intent) = self.entries.iter_mut().find(|i| i.seq == seq) {
            intent.status = status;
        }
    }

    pub fn entries(&self) -> &[WriteIntent] {
        &self.entries
    }

    /// 指定模板最近一次写入
    pub fn latest_for(&self, template_id: &str) -> Option<&WriteIntent> {
        self.entries
            .iter()
            .rev()
            .find(|i| i.template_id == template_id)
    }

    /// 最近一次写入失败、尚未被后续成功写入覆盖的模板
    pub fn unsynced(&self) -> Vec<&WriteIntent> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .rev()
            .filter(|i| seen.insert(i.template_id.as_str()))
            .filter(|i| !matches!(i.status, WriteStatus::Committed))
            .collect()
    }
}

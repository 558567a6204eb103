//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量摘要处理器
//! - 扫描输入目录，生成固定的任务队列
//! - 单 worker 顺序执行，任务之间强制冷却
//! - 单个任务失败只记录，不中断整个运行
//! - 写出结果文件并汇总统计
//!
//! ### `progress` - 进度
//! - `(completed, total, current_label)`，每个任务边界之后可观察
//! - 终端进度条
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<文档>)
//!     ↓
//! services::DigestExecutor (处理单个文档)
//!     ↓
//! services::ModelClient (外部模型)
//! ```

pub mod batch_processor;
pub mod progress;

pub use batch_processor::{
    BatchOptions, BatchOrchestrator, BatchReport, JobOutcome, JobStatus, RetryPolicy,
};
pub use progress::{BatchState, NoopObserver, Progress, ProgressBarObserver, ProgressObserver};

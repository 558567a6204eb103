//! 模板管理
//!
//! 工作集来自三层来源：远程模板服务、本地存储、内置模板。
//! `TemplateRepository` 负责按层查找、选中状态和写入记录，
//! 各层存储通过 trait 注入，测试中可以替换。

pub mod directory;
pub mod fallback;
pub mod intent;
pub mod repository;
pub mod store;

pub use directory::DirectoryTemplateStore;
pub use fallback::{FallbackStorage, FileFallbackStorage};
pub use intent::{IntentLog, WriteIntent, WriteKind, WriteStatus};
pub use repository::{
    CollisionPolicy, DeleteOutcome, Persistence, SaveOutcome, TemplateRepository, TemplateSource,
};
pub use store::{HttpTemplateStore, TemplateStore};

pub mod digest_executor;
pub mod failure_log;
pub mod history;
pub mod llm_service;
pub mod prompt_builder;

pub use digest_executor::DigestExecutor;
pub use failure_log::FailureLog;
pub use history::{HistoryEntry, HistoryStore};
pub use llm_service::{LlmService, ModelCall, ModelClient};
pub use prompt_builder::DigestRequestBuilder;

pub mod digest_session;
pub mod job_ctx;

pub use digest_session::{DigestSession, LoadingState};
pub use job_ctx::JobCtx;

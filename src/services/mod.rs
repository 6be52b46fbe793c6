pub mod billing;
pub mod bio;
pub mod generation;
pub mod llm_client;
pub mod metrics;
pub mod quota;
pub mod rate_limiter;
pub mod redis;

pub use bio::BioWriter;
pub use generation::{GenerationRequest, GenerationWorkflow};
pub use llm_client::{LlmClient, LlmError};
pub use metrics::MetricsService;
pub use quota::QuotaPolicy;
pub use rate_limiter::RateLimiter;
pub use redis::RedisService;

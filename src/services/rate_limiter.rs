use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    services::redis::RedisService,
};

/// Scopes for requests that may call the bio writer.
pub const GENERATE_SCOPE: &str = "generate";
pub const BIO_SCOPE: &str = "bio";

/// Decides whether a caller may spend one more AI-backed request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestGate: Send + Sync {
    async fn admit(&self, subject: Uuid, scope: &str) -> Result<()>;
}

/// Admits everything when no gate is configured.
pub async fn admit(gate: Option<&dyn RequestGate>, subject: Uuid, scope: &str) -> Result<()> {
    match gate {
        Some(gate) => gate.admit(subject, scope).await,
        None => Ok(()),
    }
}

/// Fixed-window request counter kept in Redis.
#[derive(Clone)]
pub struct RateLimiter {
    redis: RedisService,
    capacity: u32,
    window_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub capacity: u32,
}

impl RateLimitResult {
    pub fn from_count(count: u64, capacity: u32) -> Self {
        let capacity_u64 = u64::from(capacity);
        Self {
            allowed: count <= capacity_u64,
            remaining: capacity_u64.saturating_sub(count) as u32,
            capacity,
        }
    }
}

pub fn rate_limit_key(subject: Uuid, scope: &str) -> String {
    format!("rate_limit:{}:{}", scope, subject)
}

impl RateLimiter {
    pub fn new(redis: RedisService, capacity: u32, window_secs: u64) -> Self {
        Self {
            redis,
            capacity,
            window_secs,
        }
    }

    /// Counts one request for `subject` in `scope`. The window starts with the first request.
    pub async fn check(&self, subject: Uuid, scope: &str) -> Result<RateLimitResult> {
        let key = rate_limit_key(subject, scope);
        let mut conn = self.redis.connection();

        let count: u64 = redis::cmd("INCR").arg(&key).query_async(&mut conn).await?;
        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(&key)
                .arg(self.window_secs)
                .query_async::<_, ()>(&mut conn)
                .await?;
        }

        Ok(RateLimitResult::from_count(count, self.capacity))
    }
}

/// Redis failures do not block the request.
#[async_trait]
impl RequestGate for RateLimiter {
    async fn admit(&self, subject: Uuid, scope: &str) -> Result<()> {
        match self.check(subject, scope).await {
            Ok(result) if result.allowed => Ok(()),
            Ok(_) => {
                tracing::info!(account_id = %subject, scope, "AI rate limit exceeded");
                Err(AppError::RateLimit)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rate limiter unavailable, allowing request");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_result_from_count() {
        let first = RateLimitResult::from_count(1, 3);
        assert!(first.allowed);
        assert_eq!(first.remaining, 2);

        let last = RateLimitResult::from_count(3, 3);
        assert!(last.allowed);
        assert_eq!(last.remaining, 0);

        let over = RateLimitResult::from_count(4, 3);
        assert!(!over.allowed);
        assert_eq!(over.remaining, 0);
    }

    #[tokio::test]
    async fn test_missing_gate_admits() {
        assert!(admit(None, Uuid::nil(), GENERATE_SCOPE).await.is_ok());
    }

    #[tokio::test]
    async fn test_gate_refusal_is_returned() {
        let mut gate = MockRequestGate::new();
        gate.expect_admit()
            .withf(|_, scope| scope == BIO_SCOPE)
            .returning(|_, _| Err(AppError::RateLimit));

        let err = admit(Some(&gate), Uuid::nil(), BIO_SCOPE).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimit));
    }

    #[test]
    fn test_keys_are_scoped() {
        let id = Uuid::nil();
        assert_ne!(rate_limit_key(id, BIO_SCOPE), rate_limit_key(id, GENERATE_SCOPE));
    }
}

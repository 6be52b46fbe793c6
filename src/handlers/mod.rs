use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    database::{create_store, ResumeStore},
    services::{
        rate_limiter::RequestGate, BioWriter, GenerationWorkflow, LlmClient, MetricsService,
        QuotaPolicy, RateLimiter, RedisService,
    },
    storage::{create_storage, Storage, UploadRules},
};

pub mod account;
pub mod auth;
pub mod billing;
pub mod bio;
pub mod docs;
pub mod health;
pub mod metrics;
pub mod resumes;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResumeStore>,
    pub storage: Arc<dyn Storage>,
    pub bio_writer: Arc<dyn BioWriter>,
    pub policy: Arc<QuotaPolicy>,
    pub upload_rules: Arc<UploadRules>,
    pub config: Arc<Config>,
    pub jwt: JwtService,
    pub metrics: Arc<MetricsService>,
    pub redis: Option<RedisService>,
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    /// Assembles state from already-built collaborators. Redis-backed rate
    /// limiting stays off unless attached with [`AppState::with_redis`].
    pub fn new(
        config: Config,
        store: Arc<dyn ResumeStore>,
        storage: Arc<dyn Storage>,
        bio_writer: Arc<dyn BioWriter>,
    ) -> anyhow::Result<Self> {
        let policy = QuotaPolicy::new(
            config.free_templates.iter().cloned(),
            config.premium_templates.iter().cloned(),
        );

        Ok(Self {
            store,
            storage,
            bio_writer,
            policy: Arc::new(policy),
            upload_rules: Arc::new(UploadRules::from_config(&config)),
            jwt: JwtService::new(&config.jwt_secret),
            metrics: Arc::new(MetricsService::new()?),
            config: Arc::new(config),
            redis: None,
            rate_limiter: None,
        })
    }

    pub fn with_redis(mut self, redis: RedisService) -> Self {
        self.rate_limiter = Some(RateLimiter::new(
            redis.clone(),
            self.config.ai_rate_limit_requests,
            self.config.ai_rate_limit_window,
        ));
        self.redis = Some(redis);
        self
    }

    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = create_store(&config).await?;
        let storage = Arc::new(create_storage(&config)?);

        if config.ai.api_key.is_none() {
            tracing::warn!("AI_API_KEY is not set, bios will use the fallback text");
        }
        let bio_writer = Arc::new(LlmClient::new(&config.ai)?);
        tracing::info!(model = %config.ai.model, "Bio writer initialized");

        let redis_url = config.redis_url.clone();
        let state = Self::new(config, store, storage, bio_writer)?;

        match redis_url {
            Some(url) => {
                let redis = RedisService::new(&url).await?;
                tracing::info!("Redis rate limiting enabled");
                Ok(state.with_redis(redis))
            }
            None => Ok(state),
        }
    }

    pub fn generation(&self) -> GenerationWorkflow<'_> {
        GenerationWorkflow {
            store: self.store.as_ref(),
            storage: self.storage.as_ref(),
            bio_writer: self.bio_writer.as_ref(),
            policy: &self.policy,
            upload_rules: &self.upload_rules,
            metrics: &self.metrics,
            gate: self.ai_gate(),
        }
    }

    /// Per-account limit on AI-backed requests, when Redis is configured.
    pub fn ai_gate(&self) -> Option<&dyn RequestGate> {
        self.rate_limiter
            .as_ref()
            .map(|limiter| limiter as &dyn RequestGate)
    }
}

use anyhow::{bail, Context, Result};
use std::{env, str::FromStr};

/// Which persistence backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("Unsupported store backend: {}", other),
        }
    }
}

/// Settings for the bio-writing completion endpoint.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub referer: String,
    pub title: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-chat-v3-0324:free".to_string(),
            timeout_secs: 10,
            referer: "http://localhost:3000".to_string(),
            title: "Resumify".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub store_backend: StoreBackend,
    pub redis_url: Option<String>,
    pub port: u16,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub upload_dir: String,
    pub max_upload_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub free_templates: Vec<String>,
    pub premium_templates: Vec<String>,
    pub ai: AiConfig,
    pub ai_rate_limit_requests: u32,
    pub ai_rate_limit_window: u64,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/resumify".to_string(),
            store_backend: StoreBackend::Postgres,
            redis_url: None,
            port: 3000,
            jwt_secret: "your-secret-key".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            upload_dir: "./static/uploads".to_string(),
            max_upload_size: 5 * 1024 * 1024, // 5MB
            allowed_mime_types: split_list("image/jpeg,image/png,image/webp,image/gif"),
            free_templates: split_list("classic,minimal"),
            premium_templates: split_list("modern,creative,executive"),
            ai: AiConfig::default(),
            ai_rate_limit_requests: 30,
            ai_rate_limit_window: 3600, // 1 hour
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let ai_defaults = defaults.ai.clone();

        Ok(Config {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "postgres".to_string())
                .parse()?,
            redis_url: non_empty_var("REDIS_URL"),
            port: parse_var("PORT", defaults.port)?,
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            max_upload_size: parse_var("MAX_UPLOAD_SIZE", defaults.max_upload_size)?,
            allowed_mime_types: env::var("ALLOWED_MIME_TYPES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_mime_types),
            free_templates: env::var("FREE_TEMPLATES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.free_templates),
            premium_templates: env::var("PREMIUM_TEMPLATES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.premium_templates),
            ai: AiConfig {
                api_key: non_empty_var("AI_API_KEY"),
                base_url: env::var("AI_BASE_URL").unwrap_or(ai_defaults.base_url),
                model: env::var("AI_MODEL").unwrap_or(ai_defaults.model),
                timeout_secs: parse_var("AI_TIMEOUT_SECS", ai_defaults.timeout_secs)?,
                referer: env::var("AI_REFERER").unwrap_or(ai_defaults.referer),
                title: ai_defaults.title,
            },
            ai_rate_limit_requests: parse_var(
                "AI_RATE_LIMIT_REQUESTS",
                defaults.ai_rate_limit_requests,
            )?,
            ai_rate_limit_window: parse_var("AI_RATE_LIMIT_WINDOW", defaults.ai_rate_limit_window)?,
            rust_log: env::var("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list("classic, ,minimal,"), vec!["classic", "minimal"]);
    }
}

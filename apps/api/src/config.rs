use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// Static bearer token for the admin applicant routes.
    pub admin_api_token: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on a single model call (extraction or analysis).
    pub llm_timeout: Duration,
    /// CV-processing requests allowed per client per window.
    pub cv_rate_limit: u64,
    pub cv_rate_window: Duration,
    /// Use the first `X-Forwarded-For` hop as the client key. Only enable behind a trusted proxy.
    pub trust_forwarded_for: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            admin_api_token: require_env("ADMIN_API_TOKEN")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 60)?),
            cv_rate_limit: parse_env("CV_RATE_LIMIT", 5)?,
            cv_rate_window: Duration::from_secs(parse_env("CV_RATE_WINDOW_SECS", 60)?),
            trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR", false)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

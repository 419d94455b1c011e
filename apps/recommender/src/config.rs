use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::transport::{StaticToken, TransportConfig};

const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub limits: Limits,
    /// Client-side HTTP timeout. Unset means requests wait as long as the
    /// backend takes (model builds have no predictable duration).
    pub http_timeout: Option<Duration>,
    pub rust_log: String,
}

/// Result-size limits sent as `?limit=N` on query endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub custom_job: u32,
    pub cvs_for_job: u32,
    pub jobs: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            custom_job: 20,
            cvs_for_job: 10,
            jobs: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Limits::default();

        Ok(Config {
            api_url: std::env::var("RECOMMENDER_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: std::env::var("RECOMMENDER_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            limits: Limits {
                custom_job: parse_env("RECOMMENDER_CUSTOM_JOB_LIMIT")?
                    .unwrap_or(defaults.custom_job),
                cvs_for_job: parse_env("RECOMMENDER_CVS_FOR_JOB_LIMIT")?
                    .unwrap_or(defaults.cvs_for_job),
                jobs: parse_env("RECOMMENDER_JOBS_LIMIT")?.unwrap_or(defaults.jobs),
            },
            http_timeout: parse_env::<u64>("RECOMMENDER_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Transport settings with the token fixed at startup.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.api_url.clone(),
            token_provider: Arc::new(StaticToken(self.token.clone())),
            timeout: self.http_timeout,
        }
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(None),
    }
}

// src/config/settings.rs
use std::path::PathBuf;

use crate::enrich::extractor::DEFAULT_DIFFBOT_ENDPOINT;
use crate::enrich::{EnrichPolicy, DEFAULT_INDEX_PATTERNS};
use crate::ingest::DEFAULT_STREAM_URL;
use crate::state::DEFAULT_STATE_PATH;

pub const ENV_TOKEN: &str = "DIFFBOT_TOKEN";
pub const ENV_ENDPOINT: &str = "DIFFBOT_API_URL";
pub const ENV_NEWS_URL: &str = "NEWS_URL";
pub const ENV_STATE_PATH: &str = "NEWS_STATE_PATH";
pub const ENV_CUTOFF_YEAR: &str = "MARKET_DATE_CUTOFF_YEAR";
pub const ENV_INDEX_PATTERNS: &str = "INDEX_TICKER_PATTERNS";

/// Startup failures. Any of these stops the process before a run starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DIFFBOT_TOKEN not found in environment variables")]
    MissingToken,
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub diffbot_token: String,
    pub diffbot_endpoint: String,
    pub news_url: String,
    pub state_path: PathBuf,
    pub cutoff_year: Option<i32>,
    pub index_patterns: Vec<String>,
}

impl Settings {
    /// Read settings from the process environment (call `dotenvy::dotenv()` first
    /// to pick up a local `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let diffbot_token = var(ENV_TOKEN).ok_or(ConfigError::MissingToken)?;

        let cutoff_year = match var(ENV_CUTOFF_YEAR) {
            Some(v) => Some(v.parse::<i32>().map_err(|_| ConfigError::Invalid {
                var: ENV_CUTOFF_YEAR,
                value: v.clone(),
            })?),
            None => None,
        };

        let index_patterns = match var(ENV_INDEX_PATTERNS) {
            Some(v) => {
                let list: Vec<String> = v
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
                if list.is_empty() {
                    return Err(ConfigError::Invalid {
                        var: ENV_INDEX_PATTERNS,
                        value: v,
                    });
                }
                list
            }
            None => DEFAULT_INDEX_PATTERNS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            diffbot_token,
            diffbot_endpoint: var(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_DIFFBOT_ENDPOINT.to_string()),
            news_url: var(ENV_NEWS_URL).unwrap_or_else(|| DEFAULT_STREAM_URL.to_string()),
            state_path: var(ENV_STATE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            cutoff_year,
            index_patterns,
        })
    }

    pub fn enrich_policy(&self) -> EnrichPolicy {
        EnrichPolicy {
            index_patterns: self.index_patterns.clone(),
            cutoff_year: self.cutoff_year,
            ..EnrichPolicy::default()
        }
    }
}

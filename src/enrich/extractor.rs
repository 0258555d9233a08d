// src/enrich/extractor.rs
//! Content-extraction provider: Diffbot `/v3/analyze` plus a stub for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::ingest::page::BROWSER_USER_AGENT;

pub const DEFAULT_DIFFBOT_ENDPOINT: &str = "https://api.diffbot.com/v3/analyze";
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);

/// One analyzed object. Every field is optional and unknown fields are ignored.
/// A field of an unexpected JSON type decodes as absent instead of failing the
/// whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedObject {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, rename = "estimatedDate", deserialize_with = "lenient_string")]
    pub estimated_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sentiment: Option<Number>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub objects: Vec<ExtractedObject>,
    /// Set by the API on soft failures (bad token, unreachable page).
    #[serde(default, deserialize_with = "lenient_string")]
    pub error: Option<String>,
}

/// Strings as-is, numbers and booleans in their JSON spelling, anything else absent.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Numbers as-is; numeric strings (`"0.3"`) are parsed.
fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Number>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => Some(n),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .map(Number::from)
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extractor request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("extractor returned HTTP {status}")]
    Status { status: u16 },
    #[error("extractor response unreadable: {0}")]
    Decode(String),
}

impl ExtractError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ExtractError::Status { status } => Some(*status),
            ExtractError::Transport(e) => e.status().map(|s| s.as_u16()),
            ExtractError::Decode(_) => None,
        }
    }
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<ExtractionResponse, ExtractError>;
    /// Where requests go, safe to log (no credentials).
    fn endpoint(&self) -> String;
    fn name(&self) -> &'static str;
}

pub fn parse_response(body: &str) -> Result<ExtractionResponse, ExtractError> {
    serde_json::from_str(body).map_err(|e| ExtractError::Decode(e.to_string()))
}

#[derive(Clone)]
pub struct DiffbotClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl DiffbotClient {
    pub fn new(endpoint: &str, token: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .timeout(EXTRACT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl ContentExtractor for DiffbotClient {
    async fn analyze(&self, url: &str) -> Result<ExtractionResponse, ExtractError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("token", self.token.as_str()), ("url", url)])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(ExtractError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(ExtractError::Transport)?;
        parse_response(&body)
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn name(&self) -> &'static str {
        "diffbot"
    }
}

// --- Test helper ---
/// Canned extractor: answers every call with the same response or HTTP status.
pub struct StubExtractor {
    answer: Result<ExtractionResponse, u16>,
    pub calls: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn objects(objects: Vec<ExtractedObject>) -> Self {
        Self {
            answer: Ok(ExtractionResponse {
                objects,
                error: None,
            }),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            answer: Err(status),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ContentExtractor for StubExtractor {
    async fn analyze(&self, url: &str) -> Result<ExtractionResponse, ExtractError> {
        if let Ok(mut c) = self.calls.lock() {
            c.push(url.to_string());
        }
        match &self.answer {
            Ok(r) => Ok(r.clone()),
            Err(status) => Err(ExtractError::Status { status: *status }),
        }
    }

    fn endpoint(&self) -> String {
        "stub://extractor".to_string()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

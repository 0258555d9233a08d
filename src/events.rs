// src/events.rs
//! Structured status events. Every significant step of a run emits one event,
//! written as a single JSON line by the configured sink.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use crate::enrich::ArticleRecord;
use crate::state::NewsRecord;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusEvent {
    Startup {
        token_present: bool,
        token_len: usize,
    },
    ProcessStart,
    NoPreviousData {
        file: String,
    },
    LoadedLastNews {
        title: Option<String>,
        timestamp: Option<String>,
    },
    LoadError {
        error: String,
    },
    SavedNews {
        data: NewsRecord,
    },
    SaveError {
        error: String,
    },
    SessionOpen,
    FetchingPage {
        url: String,
    },
    FoundNews {
        title: String,
        url: String,
    },
    NoNewsFound,
    FetchError {
        error: String,
    },
    EnrichStart {
        url: String,
        title: String,
    },
    ProcessedMarketUpdate {
        article: ArticleRecord,
    },
    CallingExtractor {
        endpoint: String,
    },
    ExtractorResponse {
        has_objects: bool,
        object_count: usize,
    },
    ProcessedArticle {
        article: ArticleRecord,
    },
    NoArticleData,
    ExtractorError {
        error: String,
        response_status: Option<u16>,
    },
}

impl StatusEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StatusEvent::Startup { .. } => "startup",
            StatusEvent::ProcessStart => "process_start",
            StatusEvent::NoPreviousData { .. } => "no_previous_data",
            StatusEvent::LoadedLastNews { .. } => "loaded_last_news",
            StatusEvent::LoadError { .. } => "load_error",
            StatusEvent::SavedNews { .. } => "saved_news",
            StatusEvent::SaveError { .. } => "save_error",
            StatusEvent::SessionOpen => "session_open",
            StatusEvent::FetchingPage { .. } => "fetching_page",
            StatusEvent::FoundNews { .. } => "found_news",
            StatusEvent::NoNewsFound => "no_news_found",
            StatusEvent::FetchError { .. } => "fetch_error",
            StatusEvent::EnrichStart { .. } => "enrich_start",
            StatusEvent::ProcessedMarketUpdate { .. } => "processed_market_update",
            StatusEvent::CallingExtractor { .. } => "calling_extractor",
            StatusEvent::ExtractorResponse { .. } => "extractor_response",
            StatusEvent::ProcessedArticle { .. } => "processed_article",
            StatusEvent::NoArticleData => "no_article_data",
            StatusEvent::ExtractorError { .. } => "extractor_error",
        }
    }
}

/// Destination for status lines. Components hold an `Arc<dyn EventSink>` so
/// output can be redirected or silenced without touching pipeline logic.
pub trait EventSink: Send + Sync {
    fn emit_value(&self, value: Value);

    fn emit(&self, event: StatusEvent) {
        tracing::debug!(status = event.name(), "status event");
        match serde_json::to_value(&event) {
            Ok(v) => self.emit_value(v),
            Err(e) => tracing::warn!("serialize status event: {e:#}"),
        }
    }
}

pub type SharedSink = Arc<dyn EventSink>;

/// Writes one compact JSON object per line to stdout.
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit_value(&self, value: Value) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{value}").and_then(|_| out.flush()) {
            tracing::warn!("stdout write: {e:#}");
        }
    }
}

/// Drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit_value(&self, _value: Value) {}
}

// --- Test helper ---
#[derive(Default)]
pub struct MemorySink {
    pub lines: Mutex<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.lines.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// `status` tags of everything emitted so far, in order.
    pub fn statuses(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .filter_map(|v| v.get("status").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    pub fn last(&self) -> Option<Value> {
        self.snapshot().last().cloned()
    }
}

impl EventSink for MemorySink {
    fn emit_value(&self, value: Value) {
        if let Ok(mut v) = self.lines.lock() {
            v.push(value);
        }
    }
}

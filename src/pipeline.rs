// src/pipeline.rs
//! One run: load last headline → fetch current → compare → enrich → save → report.

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::change_detector::has_changed;
use crate::config::Settings;
use crate::enrich::{ArticleRecord, DiffbotClient, Enricher};
use crate::events::{SharedSink, StatusEvent};
use crate::ingest::providers::stream_page::StreamPageProvider;
use crate::ingest::{self, HeadlineProvider};
use crate::state::StateStore;

pub const ERR_NO_HEADLINE: &str = "Failed to fetch current news";
pub const ERR_ENRICH_FAILED: &str = "Failed to process articles";
pub const STATUS_NO_NEW_CONTENT: &str = "no_new_content";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunMetadata {
    pub timestamp: String,
    pub source_url: String,
    pub title: String,
    pub previous_title: Option<String>,
}

/// Final line of every run.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct RunResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<ArticleRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RunMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_no_new_content(&self) -> bool {
        self.status.as_deref() == Some(STATUS_NO_NEW_CONTENT)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    NoHeadline,
    Unchanged {
        last_title: Option<String>,
        current_title: String,
    },
    EnrichmentFailed,
    Processed {
        articles: Vec<ArticleRecord>,
        metadata: RunMetadata,
    },
}

impl From<RunOutcome> for RunResult {
    fn from(o: RunOutcome) -> Self {
        match o {
            RunOutcome::NoHeadline => RunResult::failure(ERR_NO_HEADLINE),
            RunOutcome::Unchanged {
                last_title,
                current_title,
            } => RunResult {
                success: true,
                status: Some(STATUS_NO_NEW_CONTENT.to_string()),
                last_title,
                current_title: Some(current_title),
                ..RunResult::default()
            },
            RunOutcome::EnrichmentFailed => RunResult::failure(ERR_ENRICH_FAILED),
            RunOutcome::Processed { articles, metadata } => RunResult {
                success: true,
                articles: Some(articles),
                metadata: Some(metadata),
                ..RunResult::default()
            },
        }
    }
}

pub struct Pipeline {
    store: StateStore,
    headlines: Box<dyn HeadlineProvider>,
    enricher: Enricher,
    sink: SharedSink,
}

impl Pipeline {
    pub fn new(
        store: StateStore,
        headlines: Box<dyn HeadlineProvider>,
        enricher: Enricher,
        sink: SharedSink,
    ) -> Self {
        Self {
            store,
            headlines,
            enricher,
            sink,
        }
    }

    /// Production wiring: stream page over HTTP + Diffbot.
    pub fn from_settings(settings: &Settings, sink: SharedSink) -> Result<Self> {
        let headlines = StreamPageProvider::from_url(&settings.news_url, sink.clone())?;
        let extractor = DiffbotClient::new(&settings.diffbot_endpoint, &settings.diffbot_token)?;
        let enricher = Enricher::new(Box::new(extractor), settings.enrich_policy(), sink.clone());
        let store = StateStore::new(settings.state_path.clone(), sink.clone());
        Ok(Self::new(store, Box::new(headlines), enricher, sink))
    }

    pub async fn step(&self) -> RunOutcome {
        let (last_title, _last_url) = self.store.load().await;

        let Some(current) = ingest::fetch_current(self.headlines.as_ref()).await else {
            return RunOutcome::NoHeadline;
        };

        if !has_changed(last_title.as_deref(), &current.title) {
            tracing::info!(title = %current.title, "headline unchanged");
            return RunOutcome::Unchanged {
                last_title,
                current_title: current.title,
            };
        }

        let Some(articles) = self.enricher.enrich(&current.url, &current.title).await else {
            return RunOutcome::EnrichmentFailed;
        };

        // A failed save is already reported by the store; the articles still go out.
        if let Err(e) = self.store.save(&current.title, &current.url).await {
            tracing::warn!("state not persisted: {e:#}");
        }

        RunOutcome::Processed {
            articles,
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                source_url: current.url,
                title: current.title,
                previous_title: last_title,
            },
        }
    }

    /// Run once and emit the result as the last status line.
    pub async fn run(&self) -> RunResult {
        self.sink.emit(StatusEvent::ProcessStart);
        let result = RunResult::from(self.step().await);
        emit_result(&self.sink, &result);
        result
    }

    /// Like [`Pipeline::run`], but a panic anywhere in the run is reported as a
    /// failed result instead of taking the process down.
    pub async fn run_guarded(self) -> RunResult {
        let sink = self.sink.clone();
        match tokio::spawn(async move { self.run().await }).await {
            Ok(r) => r,
            Err(e) => {
                let msg = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                tracing::error!("run aborted: {msg}");
                let result = RunResult::failure(msg);
                emit_result(&sink, &result);
                result
            }
        }
    }
}

pub fn emit_result(sink: &SharedSink, result: &RunResult) {
    match serde_json::to_value(result) {
        Ok(v) => sink.emit_value(v),
        Err(e) => tracing::error!("serialize run result: {e:#}"),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "run panicked".to_string()
    }
}

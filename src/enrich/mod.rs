// src/enrich/mod.rs
//! Turns a (url, title) headline into an article record, either synthesized
//! locally for index-ticker pages or via the content extractor.

pub mod extractor;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::enrich::extractor::{ContentExtractor, ExtractedObject};
use crate::events::{SharedSink, StatusEvent};

pub use crate::enrich::extractor::{DiffbotClient, StubExtractor};

pub const DEFAULT_AUTHOR: &str = "Trading Economics";
pub const DEFAULT_INDEX_PATTERNS: [&str; 2] = ["indu:ind", "spx:ind"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleRecord {
    pub date: String, // RFC 3339 when we could parse it
    /// Kept as the extractor sent it; synthesized records carry integer `0`.
    pub sentiment: Number,
    pub author: String,
    pub text: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct EnrichPolicy {
    /// Substrings marking a market-index page rather than an article.
    pub index_patterns: Vec<String>,
    /// Synthesized dates never carry a later year than this.
    pub cutoff_year: Option<i32>,
    pub default_author: String,
}

impl Default for EnrichPolicy {
    fn default() -> Self {
        Self {
            index_patterns: DEFAULT_INDEX_PATTERNS.iter().map(|s| s.to_string()).collect(),
            cutoff_year: None,
            default_author: DEFAULT_AUTHOR.to_string(),
        }
    }
}

/// Force `now` back into `cutoff_year` when it has run past it.
pub fn clamp_to_cutoff(now: DateTime<Utc>, cutoff_year: Option<i32>) -> DateTime<Utc> {
    match cutoff_year {
        Some(y) if now.year() > y => now
            .with_year(y)
            // Feb 29 in a non-leap cutoff year
            .or_else(|| now.with_day(28).and_then(|d| d.with_year(y)))
            .unwrap_or(now),
        _ => now,
    }
}

/// RFC 2822 dates become RFC 3339; anything else is kept as given.
pub fn normalize_date(raw: &str) -> String {
    OffsetDateTime::parse(raw.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| dt.to_offset(UtcOffset::UTC).format(&Rfc3339).ok())
        .unwrap_or_else(|| raw.to_string())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub struct Enricher {
    extractor: Box<dyn ContentExtractor>,
    policy: EnrichPolicy,
    sink: SharedSink,
}

impl Enricher {
    pub fn new(extractor: Box<dyn ContentExtractor>, policy: EnrichPolicy, sink: SharedSink) -> Self {
        Self {
            extractor,
            policy,
            sink,
        }
    }

    pub fn is_index_url(&self, url: &str) -> bool {
        self.policy
            .index_patterns
            .iter()
            .any(|p| !p.is_empty() && url.contains(p.as_str()))
    }

    pub fn synthesize(&self, url: &str, title: &str, now: DateTime<Utc>) -> ArticleRecord {
        ArticleRecord {
            date: iso(clamp_to_cutoff(now, self.policy.cutoff_year)),
            sentiment: Number::from(0),
            author: self.policy.default_author.clone(),
            text: format!("Market Update: {title}. For detailed data, visit: {url}"),
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    /// Map the first extracted object, falling back to the headline itself.
    pub fn map_extracted(&self, obj: ExtractedObject, url: &str, title: &str) -> ArticleRecord {
        let date = non_empty(obj.estimated_date)
            .or_else(|| non_empty(obj.date))
            .map(|d| normalize_date(&d))
            .unwrap_or_else(|| iso(Utc::now()));

        ArticleRecord {
            date,
            sentiment: obj.sentiment.unwrap_or_else(|| Number::from(0)),
            author: non_empty(obj.author).unwrap_or_else(|| self.policy.default_author.clone()),
            text: non_empty(obj.text).unwrap_or_else(|| title.to_string()),
            title: non_empty(obj.title).unwrap_or_else(|| title.to_string()),
            url: url.to_string(),
        }
    }

    /// `None` on any failure or when the extractor found nothing.
    /// Success is always exactly one article.
    pub async fn enrich(&self, url: &str, title: &str) -> Option<Vec<ArticleRecord>> {
        self.sink.emit(StatusEvent::EnrichStart {
            url: url.to_string(),
            title: title.to_string(),
        });

        if self.is_index_url(url) {
            let article = self.synthesize(url, title, Utc::now());
            self.sink.emit(StatusEvent::ProcessedMarketUpdate {
                article: article.clone(),
            });
            return Some(vec![article]);
        }

        self.sink.emit(StatusEvent::CallingExtractor {
            endpoint: self.extractor.endpoint(),
        });

        let resp = match self.extractor.analyze(url).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(extractor = self.extractor.name(), url, "extraction failed: {e:#}");
                self.sink.emit(StatusEvent::ExtractorError {
                    error: e.to_string(),
                    response_status: e.status(),
                });
                return None;
            }
        };

        self.sink.emit(StatusEvent::ExtractorResponse {
            has_objects: !resp.objects.is_empty(),
            object_count: resp.objects.len(),
        });

        let Some(first) = resp.objects.into_iter().next() else {
            if let Some(err) = resp.error {
                tracing::warn!(extractor = self.extractor.name(), "extractor reported: {err}");
            }
            self.sink.emit(StatusEvent::NoArticleData);
            return None;
        };

        let article = self.map_extracted(first, url, title);
        self.sink.emit(StatusEvent::ProcessedArticle {
            article: article.clone(),
        });
        Some(vec![article])
    }
}

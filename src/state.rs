// src/state.rs
//! Last-seen headline, persisted as a small JSON file next to the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::events::{SharedSink, StatusEvent};

pub const DEFAULT_STATE_PATH: &str = "last_news.json";

/// What gets written on every successful run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsRecord {
    pub title: String,
    pub url: String,
    pub last_checked: DateTime<Utc>,
}

// tolerant read side: any field may be missing
#[derive(Debug, Clone, Deserialize, Default)]
struct StoredRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    last_checked: Option<String>,
}

pub struct StateStore {
    path: PathBuf,
    sink: SharedSink,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, sink: SharedSink) -> Self {
        Self {
            path: path.into(),
            sink,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `(None, None)` when there is no record or it cannot be parsed.
    pub async fn load(&self) -> (Option<String>, Option<String>) {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.sink.emit(StatusEvent::NoPreviousData {
                    file: self.path.display().to_string(),
                });
                return (None, None);
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "read state: {e:#}");
                self.sink.emit(StatusEvent::LoadError {
                    error: e.to_string(),
                });
                return (None, None);
            }
        };

        match serde_json::from_str::<StoredRecord>(&raw) {
            Ok(rec) => {
                self.sink.emit(StatusEvent::LoadedLastNews {
                    title: rec.title.clone(),
                    timestamp: rec.last_checked,
                });
                (rec.title, rec.url)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "corrupt state: {e:#}");
                self.sink.emit(StatusEvent::LoadError {
                    error: e.to_string(),
                });
                (None, None)
            }
        }
    }

    /// Overwrites the record. The new content is written to a sibling temp
    /// file first and renamed over the old one.
    pub async fn save(&self, title: &str, url: &str) -> Result<NewsRecord> {
        let rec = NewsRecord {
            title: title.to_string(),
            url: url.to_string(),
            last_checked: Utc::now(),
        };

        match self.write_record(&rec).await {
            Ok(()) => {
                self.sink.emit(StatusEvent::SavedNews { data: rec.clone() });
                Ok(rec)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "write state: {e:#}");
                self.sink.emit(StatusEvent::SaveError {
                    error: format!("{e:#}"),
                });
                Err(e)
            }
        }
    }

    async fn write_record(&self, rec: &NewsRecord) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        let body = serde_json::to_vec_pretty(rec).context("serialize state")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                tracing::debug!(tmp = %tmp.display(), "temp state file not removed: {cleanup}");
            }
            return Err(e).with_context(|| format!("renaming into {}", self.path.display()));
        }
        Ok(())
    }
}

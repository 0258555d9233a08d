// src/ingest/types.rs

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Headline {
    pub title: String, // whitespace-collapsed element text
    pub url: String,   // absolute link target
}

/// Source of the current top headline. Implementations swallow their own
/// failures: `None` means "nothing usable right now".
#[async_trait::async_trait]
pub trait HeadlineProvider: Send + Sync {
    async fn fetch_top_headline(&self) -> Option<Headline>;
    fn name(&self) -> &'static str;
}

// src/ingest/mod.rs
pub mod config;
pub mod page;
pub mod providers;
pub mod types;

use once_cell::sync::OnceCell;

pub use crate::ingest::types::{Headline, HeadlineProvider};

pub const DEFAULT_STREAM_URL: &str = "https://tradingeconomics.com/stream?c=united+states";

/// CSS selector for the headline links on the stream page.
pub const HEADLINE_SELECTOR: &str = ".te-stream-title";

/// Normalize element text the way a browser renders it: collapse whitespace runs
/// to one space and trim. Case and punctuation are left alone.
pub fn normalize_headline_text(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Fetch the top headline and reject anything without both a title and a URL.
pub async fn fetch_current(provider: &dyn HeadlineProvider) -> Option<Headline> {
    let h = provider.fetch_top_headline().await?;
    if h.title.is_empty() || h.url.is_empty() {
        tracing::warn!(provider = provider.name(), "headline missing title or url");
        return None;
    }
    Some(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::fixed::FixedHeadlineProvider;

    #[test]
    fn normalize_collapses_ws_but_keeps_case() {
        let s = "\n   US Stocks\tClose \n Higher  ";
        assert_eq!(normalize_headline_text(s), "US Stocks Close Higher");
    }

    #[tokio::test]
    async fn fetch_current_rejects_empty_parts() {
        let p = FixedHeadlineProvider::new(Some(Headline {
            title: "T".into(),
            url: String::new(),
        }));
        assert!(fetch_current(&p).await.is_none());

        let p = FixedHeadlineProvider::new(None);
        assert!(fetch_current(&p).await.is_none());

        let p = FixedHeadlineProvider::headline("T", "https://example.test/t");
        assert_eq!(fetch_current(&p).await.unwrap().title, "T");
    }
}

// src/ingest/providers/stream_page.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::events::{SharedSink, StatusEvent};
use crate::ingest::page::{PageSession, PAGE_TIMEOUT};
use crate::ingest::types::{Headline, HeadlineProvider};
use crate::ingest::{normalize_headline_text, HEADLINE_SELECTOR};

/// Reads the first headline element off the news stream page.
pub struct StreamPageProvider {
    mode: Mode,
    page_url: Url,
    selector: String,
    sink: SharedSink,
}

enum Mode {
    Fixture(String),
    Http { timeout: Duration },
}

impl StreamPageProvider {
    pub fn from_url(page_url: &str, sink: SharedSink) -> Result<Self> {
        Ok(Self {
            mode: Mode::Http {
                timeout: PAGE_TIMEOUT,
            },
            page_url: Url::parse(page_url).with_context(|| format!("bad page url {page_url}"))?,
            selector: HEADLINE_SELECTOR.to_string(),
            sink,
        })
    }

    /// Parse a captured page instead of fetching. Relative links resolve against `page_url`.
    pub fn from_fixture_str(html: &str, page_url: &str, sink: SharedSink) -> Result<Self> {
        Ok(Self {
            mode: Mode::Fixture(html.to_string()),
            page_url: Url::parse(page_url).with_context(|| format!("bad page url {page_url}"))?,
            selector: HEADLINE_SELECTOR.to_string(),
            sink,
        })
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = selector.to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        if let Mode::Http { timeout } = &mut self.mode {
            *timeout = Duration::from_secs(secs);
        }
        self
    }

    async fn load_html(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { timeout } => {
                self.sink.emit(StatusEvent::SessionOpen);
                let session = PageSession::open(*timeout, true)?;
                self.sink.emit(StatusEvent::FetchingPage {
                    url: self.page_url.to_string(),
                });
                session.get_html(self.page_url.as_str(), None).await
            }
        }
    }
}

/// First element matching `selector`, as (collapsed text, absolute href).
/// The href is taken from the element itself or its first linked descendant.
pub fn parse_top_headline(html: &str, page_url: &Url, selector: &str) -> Result<Option<Headline>> {
    let sel = Selector::parse(selector).map_err(|e| anyhow!("invalid selector {selector:?}: {e:?}"))?;
    let doc = Html::parse_document(html);

    let Some(first) = doc.select(&sel).next() else {
        return Ok(None);
    };

    let title = normalize_headline_text(&first.text().collect::<String>());
    let url = link_of(&first)
        .map(|href| match page_url.join(href) {
            Ok(u) => u.to_string(),
            Err(_) => href.to_string(),
        })
        .unwrap_or_default();

    Ok(Some(Headline { title, url }))
}

fn link_of<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    if let Some(href) = el.value().attr("href") {
        return Some(href);
    }
    let a = Selector::parse("a[href]").ok()?;
    el.select(&a).next().and_then(|l| l.value().attr("href"))
}

#[async_trait]
impl HeadlineProvider for StreamPageProvider {
    async fn fetch_top_headline(&self) -> Option<Headline> {
        let parsed = match self.load_html().await {
            Ok(html) => parse_top_headline(&html, &self.page_url, &self.selector),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(Some(h)) => {
                self.sink.emit(StatusEvent::FoundNews {
                    title: h.title.clone(),
                    url: h.url.clone(),
                });
                Some(h)
            }
            Ok(None) => {
                self.sink.emit(StatusEvent::NoNewsFound);
                None
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = self.name(), "headline fetch failed");
                self.sink.emit(StatusEvent::FetchError {
                    error: format!("{e:#}"),
                });
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "stream-page"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use std::sync::Arc;

    const PAGE: &str = "https://tradingeconomics.com/stream?c=united+states";

    const STREAM_HTML: &str = r#"
        <html><body>
          <ul id="stream">
            <li class="te-stream-item">
              <a class="te-stream-title" href="/united-states/stock-market">
                 US Stocks   Close
                 Higher
              </a>
            </li>
            <li class="te-stream-item">
              <a class="te-stream-title" href="/united-states/inflation-cpi">US Inflation Rate Eases</a>
            </li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn first_match_wins_and_href_is_absolute() {
        let base = Url::parse(PAGE).unwrap();
        let h = parse_top_headline(STREAM_HTML, &base, HEADLINE_SELECTOR)
            .unwrap()
            .unwrap();
        assert_eq!(h.title, "US Stocks Close Higher");
        assert_eq!(h.url, "https://tradingeconomics.com/united-states/stock-market");
    }

    #[test]
    fn nested_link_is_found() {
        let html = r#"<div class="te-stream-title"><b>Dow</b> <a href="https://x.test/dji">rises</a></div>"#;
        let base = Url::parse(PAGE).unwrap();
        let h = parse_top_headline(html, &base, HEADLINE_SELECTOR).unwrap().unwrap();
        assert_eq!(h.title, "Dow rises");
        assert_eq!(h.url, "https://x.test/dji");
    }

    #[test]
    fn no_match_is_none() {
        let base = Url::parse(PAGE).unwrap();
        let out = parse_top_headline("<p>maintenance</p>", &base, HEADLINE_SELECTOR).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn bad_selector_is_an_error() {
        let base = Url::parse(PAGE).unwrap();
        assert!(parse_top_headline(STREAM_HTML, &base, "[[").is_err());
    }

    #[tokio::test]
    async fn fixture_provider_emits_found_news() {
        let sink = Arc::new(MemorySink::new());
        let p = StreamPageProvider::from_fixture_str(STREAM_HTML, PAGE, sink.clone()).unwrap();
        let h = p.fetch_top_headline().await.unwrap();
        assert_eq!(h.title, "US Stocks Close Higher");
        assert_eq!(sink.statuses(), vec!["found_news"]);
    }

    #[tokio::test]
    async fn http_failure_is_swallowed() {
        let sink = Arc::new(MemorySink::new());
        let p = StreamPageProvider::from_url("http://127.0.0.1:9/stream", sink.clone())
            .unwrap()
            .with_timeout(2);
        assert!(p.fetch_top_headline().await.is_none());
        assert_eq!(
            sink.statuses(),
            vec!["session_open", "fetching_page", "fetch_error"]
        );
    }
}

// src/ingest/page.rs
//! Page fetching: a scoped HTTP session plus an explicit retry policy.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{ACCEPT, REFERER};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(20);

const ACCEPT_ANY: &str = "text/html,application/xhtml+xml,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_NO_IMAGES: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.1";

/// Retry/session behaviour for page fetches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Keep one session for all attempts instead of opening a fresh one each time.
    pub reuse_session: bool,
    /// After the last failed attempt, yield `Ok(None)` instead of the error.
    pub continue_on_crash: bool,
    pub block_images: bool,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            reuse_session: true,
            continue_on_crash: true,
            block_images: true,
        }
    }
}

impl FetchPolicy {
    /// One attempt, failure surfaces as an error.
    pub fn single_shot() -> Self {
        Self {
            max_retries: 0,
            reuse_session: false,
            continue_on_crash: false,
            block_images: true,
        }
    }
}

/// An open page session. Released when dropped, on every exit path.
pub struct PageSession {
    client: Client,
    block_images: bool,
}

impl PageSession {
    pub fn open(timeout: Duration, block_images: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .build()
            .context("building page session client")?;
        tracing::debug!(block_images, "page session opened");
        Ok(Self {
            client,
            block_images,
        })
    }

    pub async fn get_html(&self, url: &str, referer: Option<&str>) -> Result<String> {
        let accept = if self.block_images {
            ACCEPT_NO_IMAGES
        } else {
            ACCEPT_ANY
        };
        let mut req = self.client.get(url).header(ACCEPT, accept);
        if let Some(r) = referer {
            req = req.header(REFERER, r);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} non-2xx"))?;
        resp.text().await.context("reading page body")
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        tracing::debug!("page session closed");
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(500u64 << (attempt.saturating_sub(1)).min(6))
}

/// GET `url` under `policy`. `Ok(None)` only when every attempt failed and
/// `continue_on_crash` is set.
pub async fn fetch_with_retry(
    url: &str,
    referer: Option<&str>,
    policy: &FetchPolicy,
    timeout: Duration,
) -> Result<Option<String>> {
    fetch_until_ready(url, referer, policy, timeout, |_| true).await
}

/// Like [`fetch_with_retry`], but a 2xx body that fails `ready` (a bot
/// challenge, an unrendered shell) counts as a failed attempt.
pub async fn fetch_until_ready<F>(
    url: &str,
    referer: Option<&str>,
    policy: &FetchPolicy,
    timeout: Duration,
    ready: F,
) -> Result<Option<String>>
where
    F: Fn(&str) -> bool,
{
    let mut reused: Option<PageSession> = None;
    let mut last_err: Option<anyhow::Error> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            tokio::time::sleep(backoff_delay(attempt)).await;
        }

        let session = match reused.take() {
            Some(s) => s,
            None => match PageSession::open(timeout, policy.block_images) {
                Ok(s) => s,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            },
        };

        let outcome = session.get_html(url, referer).await;
        if policy.reuse_session {
            reused = Some(session);
        }

        match outcome {
            Ok(body) if ready(&body) => return Ok(Some(body)),
            Ok(body) => {
                tracing::warn!(attempt, url, bytes = body.len(), "page not ready");
                last_err = Some(anyhow!("page at {url} never became ready"));
            }
            Err(e) => {
                tracing::warn!(attempt, url, "page fetch failed: {e:#}");
                last_err = Some(e);
            }
        }
    }

    let err = last_err.unwrap_or_else(|| anyhow!("no fetch attempt was made for {url}"));
    if policy.continue_on_crash {
        tracing::warn!(url, "giving up after retries: {err:#}");
        Ok(None)
    } else {
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on the discard port locally; connects are refused fast.
    const DEAD_URL: &str = "http://127.0.0.1:9/";

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(50), Duration::from_millis(500 << 6));
    }

    #[tokio::test]
    async fn exhausted_retries_continue_when_tolerated() {
        let policy = FetchPolicy {
            max_retries: 1,
            ..FetchPolicy::default()
        };
        let out = fetch_with_retry(DEAD_URL, None, &policy, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn single_shot_surfaces_error() {
        let out = fetch_with_retry(
            DEAD_URL,
            None,
            &FetchPolicy::single_shot(),
            Duration::from_secs(2),
        )
        .await;
        assert!(out.is_err());
    }
}

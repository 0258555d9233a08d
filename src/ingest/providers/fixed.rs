// src/ingest/providers/fixed.rs
use async_trait::async_trait;

use crate::ingest::types::{Headline, HeadlineProvider};

/// Always answers with the same headline (or nothing). Used by tests and dry runs.
pub struct FixedHeadlineProvider {
    pub headline: Option<Headline>,
}

impl FixedHeadlineProvider {
    pub fn new(headline: Option<Headline>) -> Self {
        Self { headline }
    }

    pub fn headline(title: &str, url: &str) -> Self {
        Self::new(Some(Headline {
            title: title.to_string(),
            url: url.to_string(),
        }))
    }
}

#[async_trait]
impl HeadlineProvider for FixedHeadlineProvider {
    async fn fetch_top_headline(&self) -> Option<Headline> {
        self.headline.clone()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

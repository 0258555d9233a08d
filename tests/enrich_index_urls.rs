// tests/enrich_index_urls.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde_json::Number;
use stream_headline_watcher::enrich::{EnrichPolicy, Enricher, StubExtractor};
use stream_headline_watcher::events::NullSink;
use stream_headline_watcher::Settings;

#[tokio::test]
async fn index_urls_always_synthesize_neutral_articles() {
    let urls = [
        "https://tradingeconomics.com/indu:ind",
        "https://tradingeconomics.com/spx:ind",
        "https://tradingeconomics.com/united-states/stock-market?symbol=indu:ind",
        "indu:ind",
    ];

    for cutoff in [2024, 2025, 2100] {
        let policy = EnrichPolicy {
            cutoff_year: Some(cutoff),
            ..EnrichPolicy::default()
        };
        let enricher = Enricher::new(
            Box::new(StubExtractor::failing(500)),
            policy,
            Arc::new(NullSink),
        );

        for url in urls {
            let out = enricher
                .enrich(url, "Dow Jones Index Extends Gains")
                .await
                .expect("index urls never reach the extractor");
            assert_eq!(out.len(), 1);
            let a = &out[0];
            assert_eq!(a.sentiment, Number::from(0));
            assert_eq!(a.author, "Trading Economics");
            assert_eq!(a.title, "Dow Jones Index Extends Gains");
            let date: DateTime<Utc> = a.date.parse().expect("rfc3339 date");
            assert!(date.year() <= cutoff, "{} > {cutoff}", a.date);
        }
    }
}

#[tokio::test]
async fn non_index_url_with_failing_extractor_is_none() {
    let enricher = Enricher::new(
        Box::new(StubExtractor::failing(503)),
        EnrichPolicy::default(),
        Arc::new(NullSink),
    );
    assert!(enricher
        .enrich("https://example.com/markets/story", "Story")
        .await
        .is_none());
}

#[tokio::test]
async fn patterns_are_configurable() {
    let policy = EnrichPolicy {
        index_patterns: vec!["ndx:ind".into()],
        ..EnrichPolicy::default()
    };
    let enricher = Enricher::new(
        Box::new(StubExtractor::objects(vec![])),
        policy,
        Arc::new(NullSink),
    );
    assert!(enricher.is_index_url("https://tradingeconomics.com/ndx:ind"));
    assert!(!enricher.is_index_url("https://tradingeconomics.com/indu:ind"));
}

#[tokio::test]
async fn configured_patterns_keep_their_case() {
    let settings = Settings::from_lookup(|k: &str| match k {
        "DIFFBOT_TOKEN" => Some("t".to_string()),
        "INDEX_TICKER_PATTERNS" => Some("NDX:IND, spx:ind".to_string()),
        _ => None,
    })
    .unwrap();
    let enricher = Enricher::new(
        Box::new(StubExtractor::failing(500)),
        settings.enrich_policy(),
        Arc::new(NullSink),
    );

    let out = enricher
        .enrich("https://tradingeconomics.com/NDX:IND", "Nasdaq 100 edges up")
        .await
        .expect("mixed-case pattern matches");
    assert_eq!(out[0].author, "Trading Economics");
    assert_eq!(out[0].sentiment, Number::from(0));
    assert!(enricher.is_index_url("https://tradingeconomics.com/spx:ind"));
}

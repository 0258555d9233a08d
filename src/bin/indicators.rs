//! Scrapes the US economic indicators table once and prints it as pretty JSON.

use stream_headline_watcher::indicators::{scrape_indicators, INDICATORS_URL};
use stream_headline_watcher::ingest::config::load_fetch_policy_default;
use stream_headline_watcher::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let policy = match load_fetch_policy_default() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("fetch policy: {e:#}; using defaults");
            Default::default()
        }
    };
    let url = std::env::var("INDICATORS_URL").unwrap_or_else(|_| INDICATORS_URL.to_string());

    match scrape_indicators(&url, &policy).await {
        Ok(Some(snapshot)) => match serde_json::to_string_pretty(&snapshot) {
            Ok(s) => println!("{s}"),
            Err(e) => tracing::error!("serialize snapshot: {e:#}"),
        },
        Ok(None) => tracing::warn!(url = %url, "indicators page unavailable"),
        Err(e) => tracing::error!("indicators scrape failed: {e:#}"),
    }
}

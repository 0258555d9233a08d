// src/indicators.rs
//! US economic indicators table (name / current / previous).

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::ingest::normalize_headline_text;
use crate::ingest::page::{fetch_until_ready, FetchPolicy, PAGE_TIMEOUT};

pub const INDICATORS_URL: &str = "https://tradingeconomics.com/united-states/indicators";
const GOOGLE_REFERER: &str = "https://www.google.com/";
const ROW_SELECTOR: &str = "table#calendar tbody tr";
const READY_SELECTOR: &str = "form#aspnetForm, table#calendar";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndicatorValue {
    pub current: String,
    pub previous: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub indicators: BTreeMap<String, IndicatorValue>,
}

fn cell_text(row: &ElementRef<'_>, col: usize) -> Option<String> {
    let sel = Selector::parse(&format!("td:nth-child({col})")).ok()?;
    row.select(&sel)
        .next()
        .map(|td| normalize_headline_text(&td.text().collect::<String>()))
}

/// The rendered page carries the ASP.NET form around the calendar table;
/// challenge and placeholder pages carry neither.
pub fn page_ready(html: &str) -> bool {
    let Ok(sel) = Selector::parse(READY_SELECTOR) else {
        return false;
    };
    Html::parse_document(html).select(&sel).next().is_some()
}

/// Rows without a name cell are skipped; a later duplicate name overwrites an earlier one.
pub fn parse_indicators(html: &str) -> Result<BTreeMap<String, IndicatorValue>> {
    let rows = Selector::parse(ROW_SELECTOR).map_err(|e| anyhow!("row selector: {e:?}"))?;
    let doc = Html::parse_document(html);

    let mut out = BTreeMap::new();
    for (i, row) in doc.select(&rows).enumerate() {
        let Some(name) = cell_text(&row, 2).filter(|n| !n.is_empty()) else {
            tracing::debug!(row = i, "indicator row without a name, skipping");
            continue;
        };
        out.insert(
            name,
            IndicatorValue {
                current: cell_text(&row, 3).unwrap_or_default(),
                previous: cell_text(&row, 4).unwrap_or_default(),
            },
        );
    }
    Ok(out)
}

/// Fetch and parse the table. `Ok(None)` when the page never came back
/// rendered and the policy tolerates that.
pub async fn scrape_indicators(url: &str, policy: &FetchPolicy) -> Result<Option<IndicatorSnapshot>> {
    let fetched = fetch_until_ready(url, Some(GOOGLE_REFERER), policy, PAGE_TIMEOUT, page_ready).await?;
    let Some(html) = fetched else {
        return Ok(None);
    };
    let indicators = parse_indicators(&html)?;
    tracing::info!(count = indicators.len(), "indicators parsed");
    Ok(Some(IndicatorSnapshot {
        timestamp: Utc::now(),
        indicators,
    }))
}

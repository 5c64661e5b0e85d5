use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::FeedSegment;
use crate::feed::{PriceFeed, RawQuote};
use crate::types::Category;

// Column order matters: rows come back as positional arrays.
const COLUMNS: [&str; 5] = ["name", "description", "close", "high", "low"];

#[derive(Debug, Serialize)]
struct ScanTickers<'a> {
    tickers: &'a [String],
}

#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    columns: [&'static str; 5],
    #[serde(skip_serializing_if = "Option::is_none")]
    symbols: Option<ScanTickers<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<[usize; 2]>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    #[serde(default)]
    s: String,
    #[serde(default)]
    d: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

/// Feed backed by a market listing scanner: one POST per refresh returning
/// name/close/high/low for the segment's instruments.
pub struct ScannerFeed {
    http_client: Client,
    segment: FeedSegment,
}

impl ScannerFeed {
    pub fn new(segment: FeedSegment, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http_client, segment })
    }

    fn request(&self) -> ScanRequest<'_> {
        if self.segment.tickers.is_empty() {
            ScanRequest {
                columns: COLUMNS,
                symbols: None,
                range: Some([0, self.segment.limit.max(1)]),
            }
        } else {
            ScanRequest {
                columns: COLUMNS,
                symbols: Some(ScanTickers {
                    tickers: &self.segment.tickers,
                }),
                range: None,
            }
        }
    }
}

fn cell_text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn row_to_quote(row: &ScanRow) -> RawQuote {
    let mut symbol = cell_text(row.d.first());
    if symbol.is_empty() {
        // "EXCHANGE:SYMBOL" fallback
        symbol = row.s.rsplit(':').next().unwrap_or_default().to_string();
    }
    RawQuote {
        symbol,
        name: cell_text(row.d.get(1)),
        live: cell_text(row.d.get(2)),
        high: cell_text(row.d.get(3)),
        low: cell_text(row.d.get(4)),
    }
}

#[async_trait]
impl PriceFeed for ScannerFeed {
    fn segment(&self) -> &str {
        &self.segment.name
    }

    fn category(&self) -> Category {
        self.segment.category
    }

    async fn fetch(&self) -> Result<Vec<RawQuote>> {
        let resp = self
            .http_client
            .post(&self.segment.url)
            .json(&self.request())
            .send()
            .await
            .with_context(|| format!("scan request to {} failed", self.segment.url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("scan request to {} returned {}", self.segment.url, status);
        }

        let body: ScanResponse = resp.json().await.context("scan response was not valid JSON")?;
        Ok(body.data.iter().map(row_to_quote).collect())
    }
}

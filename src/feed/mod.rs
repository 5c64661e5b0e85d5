//! Price feeds: where samples come from and how raw rows become samples.

pub mod scanner;
pub mod task;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use crate::state::TickerRegistry;
use crate::types::{Category, PriceSample, normalize_symbol};

pub use scanner::ScannerFeed;

/// One listing row as the source printed it. Numbers are still text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuote {
    pub symbol: String,
    pub name: String,
    pub live: String,
    pub high: String,
    pub low: String,
}

/// A source of quotes for one market segment.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Segment label used in logs.
    fn segment(&self) -> &str;

    fn category(&self) -> Category;

    async fn fetch(&self) -> Result<Vec<RawQuote>>;
}

/// Outcome of one segment refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub upserted: usize,
    pub skipped: usize,
}

fn clean_number(s: &str) -> String {
    s.trim()
        .replace(',', "")
        .replace("USD", "")
        .trim()
        .to_string()
}

/// Parse a required numeric field.
fn parse_price(field: &str, raw: &str) -> Result<f64> {
    clean_number(raw)
        .parse::<f64>()
        .with_context(|| format!("unparsable {field} {raw:?}"))
}

/// Parse an optional numeric field; empty means unavailable (0).
fn parse_optional_price(field: &str, raw: &str) -> Result<f64> {
    let cleaned = clean_number(raw);
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    parse_price(field, &cleaned)
}

/// Turn a raw row into a sample.
///
/// Thousands separators and a trailing `USD` are stripped. Empty high/low
/// become 0. Any other unparsable number rejects the whole row.
pub fn normalize_quote(raw: &RawQuote, category: Category) -> Result<PriceSample> {
    let symbol = normalize_symbol(raw.symbol.split_whitespace().next().unwrap_or(""));
    if symbol.is_empty() {
        anyhow::bail!("row without symbol");
    }

    let live = parse_price("live price", &raw.live).with_context(|| format!("symbol {symbol}"))?;
    let mut high = parse_optional_price("daily high", &raw.high).with_context(|| format!("symbol {symbol}"))?;
    let mut low = parse_optional_price("daily low", &raw.low).with_context(|| format!("symbol {symbol}"))?;

    // Sources without a range for this category report nothing useful.
    if category == Category::Crypto {
        high = 0.0;
        low = 0.0;
    }

    let mut sample = PriceSample::new(&symbol, category, live, high, low);
    let name = raw.name.trim();
    if !name.is_empty() {
        sample = sample.with_name(name);
    }
    Ok(sample)
}

/// Fetch one segment and push every usable row into the registry.
///
/// A fetch failure leaves the registry untouched; a bad row is skipped and
/// the previous value for that symbol stays in place.
pub async fn refresh_segment(feed: &dyn PriceFeed, registry: &TickerRegistry) -> Result<RefreshStats> {
    let rows = feed
        .fetch()
        .await
        .with_context(|| format!("fetch failed for segment {}", feed.segment()))?;

    let mut stats = RefreshStats::default();
    for raw in &rows {
        match normalize_quote(raw, feed.category()) {
            Ok(sample) => {
                let symbol = sample.symbol.clone();
                registry.upsert(&symbol, sample).await;
                stats.upserted += 1;
            }
            Err(e) => {
                warn!(segment = feed.segment(), "skipping row: {e:#}");
                stats.skipped += 1;
            }
        }
    }
    Ok(stats)
}

/// Feed that serves a fixed set of rows. Handy for tests and demos.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    pub segment: String,
    pub category: Category,
    pub rows: Vec<RawQuote>,
}

#[async_trait]
impl PriceFeed for StaticFeed {
    fn segment(&self) -> &str {
        &self.segment
    }

    fn category(&self) -> Category {
        self.category
    }

    async fn fetch(&self) -> Result<Vec<RawQuote>> {
        Ok(self.rows.clone())
    }
}

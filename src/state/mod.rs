pub mod ticker;

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{Category, PriceSample, normalize_symbol};
use ticker::Ticker;

/// Latest price per symbol, shared between feed tasks, the evaluator and
/// user lookups.
///
/// Every access goes through the lock; callers only ever get clones, so an
/// entry can't be observed half-written. Last write wins.
#[derive(Clone, Debug, Default)]
pub struct TickerRegistry {
    tickers: Arc<RwLock<HashMap<String, Ticker>>>,
}

impl TickerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `symbol`.
    pub async fn upsert(&self, symbol: &str, sample: PriceSample) {
        let key = normalize_symbol(symbol);
        let now = Utc::now();

        let mut g = self.tickers.write().await;
        match g.get_mut(&key) {
            Some(existing) => existing.apply(sample, now),
            None => {
                let mut t = Ticker::new(sample, now);
                t.symbol = key.clone();
                g.insert(key, t);
            }
        }
    }

    pub async fn get(&self, symbol: &str) -> Option<Ticker> {
        let key = normalize_symbol(symbol);
        self.tickers.read().await.get(&key).cloned()
    }

    /// Point-in-time snapshot of every entry matching `pred`.
    ///
    /// The snapshot is taken under one read lock; filtering runs lazily on
    /// the copy, so later upserts don't show up in an iterator already
    /// handed out. Call again to see fresh data.
    pub async fn list<F>(&self, pred: F) -> impl Iterator<Item = Ticker>
    where
        F: Fn(&Ticker) -> bool,
    {
        let snapshot: Vec<Ticker> = self.tickers.read().await.values().cloned().collect();
        snapshot.into_iter().filter(move |t| pred(t))
    }

    pub async fn len(&self) -> usize {
        self.tickers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickers.read().await.is_empty()
    }
}

/// Filters used by symbol listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolFilter {
    All,
    Category(Category),
    /// Case-insensitive substring of symbol or name.
    Search(String),
}

impl SymbolFilter {
    /// A category keyword selects that category; anything else is a search.
    pub fn parse(arg: Option<&str>) -> SymbolFilter {
        match arg.map(str::trim) {
            None | Some("") => SymbolFilter::All,
            Some(s) => match Category::parse(s) {
                Some(c) => SymbolFilter::Category(c),
                None => SymbolFilter::Search(s.to_string()),
            },
        }
    }

    pub fn matches(&self, t: &Ticker) -> bool {
        match self {
            SymbolFilter::All => true,
            SymbolFilter::Category(c) => t.category == *c,
            SymbolFilter::Search(needle) => {
                let needle = needle.to_ascii_uppercase();
                t.symbol.contains(&needle)
                    || t
                        .name
                        .as_deref()
                        .is_some_and(|n| n.to_ascii_uppercase().contains(&needle))
            }
        }
    }
}

use chrono::{DateTime, Utc};

use crate::types::{Category, PriceSample};

/// Registry entry: the latest sample for a symbol plus bookkeeping times.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub symbol: String,
    pub name: Option<String>,
    pub category: Category,
    pub live_price: f64,
    pub daily_high: f64,
    pub daily_low: f64,
    pub observed_at: DateTime<Utc>,

    // First time the registry saw this symbol. Never changes.
    pub created_at: DateTime<Utc>,
    // Bumped on every overwrite.
    pub updated_at: DateTime<Utc>,
}

impl Ticker {
    pub fn new(sample: PriceSample, now: DateTime<Utc>) -> Self {
        Self {
            symbol: sample.symbol,
            name: sample.name,
            category: sample.category,
            live_price: sample.live_price,
            daily_high: sample.daily_high,
            daily_low: sample.daily_low,
            observed_at: sample.observed_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite price fields in one go. A sample without a name keeps the
    /// name we already know.
    pub fn apply(&mut self, sample: PriceSample, now: DateTime<Utc>) {
        if sample.name.is_some() {
            self.name = sample.name;
        }
        self.category = sample.category;
        self.live_price = sample.live_price;
        self.daily_high = sample.daily_high;
        self.daily_low = sample.daily_low;
        self.observed_at = sample.observed_at;
        self.updated_at = now;
    }

    pub fn has_daily_range(&self) -> bool {
        self.daily_high > 0.0 && self.daily_low > 0.0
    }

    /// True when `price` sits strictly inside today's observed range.
    pub fn in_daily_range(&self, price: f64) -> bool {
        price < self.daily_high && price > self.daily_low
    }

    pub fn render(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => format!(
                "{} ({}) [{}] {:.5} H:{:.5} L:{:.5}",
                self.symbol,
                name,
                self.category.as_str(),
                self.live_price,
                self.daily_high,
                self.daily_low
            ),
            _ => format!(
                "{} [{}] {:.5} H:{:.5} L:{:.5}",
                self.symbol,
                self.category.as_str(),
                self.live_price,
                self.daily_high,
                self.daily_low
            ),
        }
    }
}

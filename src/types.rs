use chrono::{DateTime, Utc};

/// Market segment an instrument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Forex,
    Metal,
    Energy,
    Crypto,
    Unknown,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Forex => "forex",
            Category::Metal => "metal",
            Category::Energy => "energy",
            Category::Crypto => "crypto",
            Category::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forex" => Some(Category::Forex),
            "metal" | "metals" => Some(Category::Metal),
            "energy" => Some(Category::Energy),
            "crypto" | "cryptos" => Some(Category::Crypto),
            "unknown" => Some(Category::Unknown),
            _ => None,
        }
    }
}

/// Normalized price observation produced by a feed.
///
/// `daily_high` / `daily_low` are 0 when the source has no daily range.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub symbol: String,
    pub name: Option<String>,
    pub category: Category,
    pub live_price: f64,
    pub daily_high: f64,
    pub daily_low: f64,
    pub observed_at: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(symbol: &str, category: Category, live_price: f64, daily_high: f64, daily_low: f64) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            name: None,
            category,
            live_price,
            daily_high,
            daily_low,
            observed_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn has_daily_range(&self) -> bool {
        self.daily_high > 0.0 && self.daily_low > 0.0
    }
}

/// Registry keys are upper-case, trimmed symbols.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// A user's standing price-target request.
///
/// `number` is the per-user ordinal shown to users; `id` is the storage key.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    pub user_id: i64,
    pub number: i32,
    pub symbol: String,
    pub description: String,
    pub target_price: f64,
    pub start_price: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// New, active alert. `number` is 0 until the store assigns one.
    pub fn new(user_id: i64, symbol: &str, description: &str, target_price: f64, start_price: f64) -> Self {
        let now = Utc::now();
        Self {
            id: format!("AL{}", uuid::Uuid::new_v4().simple()),
            user_id,
            number: 0,
            symbol: normalize_symbol(symbol),
            description: description.trim().to_string(),
            target_price,
            start_price,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// One-line summary relative to the current live price.
    pub fn render(&self, live_price: f64) -> String {
        let diff_target = self.target_price - live_price;
        let diff_start = live_price - self.start_price;

        let active_icon = if self.active { "\u{1F7E2}" } else { "\u{1F534}" };
        let start_icon = if diff_start == 0.0 {
            "\u{27A1}\u{FE0F}"
        } else if diff_start > 0.0 {
            "\u{2B06}\u{FE0F}"
        } else {
            "\u{2B07}\u{FE0F}"
        };
        let target_icon = if diff_target > 0.0 { "\u{1F538}" } else { "\u{1F539}" };

        format!(
            "#{} [{}] {} {}\n({:.5}) => [{} {:.5}]\n({:.5}) => [{} {:.5}]",
            self.number,
            self.symbol,
            active_icon,
            self.description,
            self.target_price,
            target_icon,
            diff_target.abs(),
            live_price,
            start_icon,
            diff_start,
        )
    }
}

/// Message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: i64,
    pub text: String,
}

impl Notification {
    pub fn triggered(alert: &Alert, live_price: f64) -> Self {
        Self {
            user_id: alert.user_id,
            text: format!(
                "Alert triggered for {}! Current price: {:.5} TargetPrice was: {:.5}, with Description: {}",
                alert.symbol, live_price, alert.target_price, alert.description
            ),
        }
    }

    pub fn symbol_unavailable(alert: &Alert) -> Self {
        Self {
            user_id: alert.user_id,
            text: format!("Symbol not found: {}", alert.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_alert_is_active_and_normalized() {
        let a = Alert::new(7, " eurusd ", "  breakout ", 1.15, 1.10);
        assert!(a.active);
        assert_eq!(a.symbol, "EURUSD");
        assert_eq!(a.description, "breakout");
        assert_eq!(a.number, 0);
        assert!(a.id.starts_with("AL"));
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn render_shows_number_symbol_and_distances() {
        let mut a = Alert::new(1, "xauusd", "gold top", 2000.0, 1900.0);
        a.number = 3;
        let s = a.render(1950.0);
        assert!(s.starts_with("#3 [XAUUSD]"));
        assert!(s.contains("gold top"));
        assert!(s.contains("(2000.00000)"));
        assert!(s.contains("50.00000"));
    }

    #[test]
    fn category_parse_accepts_plurals() {
        assert_eq!(Category::parse("cryptos"), Some(Category::Crypto));
        assert_eq!(Category::parse("Metals"), Some(Category::Metal));
        assert_eq!(Category::parse("stocks"), None);
    }
}

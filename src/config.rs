use anyhow::{Context, Result, bail};
use std::env;
use std::time::Duration;

use crate::types::Category;

/// One market segment a feed task refreshes.
#[derive(Debug, Clone)]
pub struct FeedSegment {
    pub name: String,
    pub category: Category,
    // Scanner endpoint for this market, e.g. ".../forex/scan".
    pub url: String,
    // Exchange-qualified tickers. Empty means "top `limit` rows of the market".
    pub tickers: Vec<String>,
    pub limit: usize,
}

impl FeedSegment {
    fn new(name: &str, category: Category, market: &str, tickers: &[&str], limit: usize) -> Self {
        Self {
            name: name.to_string(),
            category,
            url: format!("{SCANNER_BASE}/{market}/scan"),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            limit,
        }
    }
}

const SCANNER_BASE: &str = "https://scanner.tradingview.com";

/// Runtime settings.
///
/// `Default` carries the tuning values; `from_env` overlays whatever is set
/// in the environment (or `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    // How often the evaluator sweeps all alerts.
    pub sweep_interval_ms: u64,

    // How often every feed segment is re-fetched.
    pub feed_refresh_ms: u64,

    // Proximity window used when a ticker has no daily range, as a fraction of target.
    pub band_ratio: f64,

    pub database_url: String,

    pub http_timeout_ms: u64,

    // Upper bound for one outgoing chat message, in bytes.
    pub max_message_size: usize,

    pub telegram_token: Option<String>,
    pub admin_user_id: Option<i64>,

    pub segments: Vec<FeedSegment>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 60_000,
            feed_refresh_ms: 300_000,
            band_ratio: 0.01,

            database_url: "sqlite://database/alertify.db".to_string(),
            http_timeout_ms: 15_000,
            max_message_size: 4096,

            telegram_token: None,
            admin_user_id: None,

            segments: default_segments(),
        }
    }
}

fn default_segments() -> Vec<FeedSegment> {
    vec![
        FeedSegment::new(
            "forex-majors",
            Category::Forex,
            "forex",
            &[
                "FX_IDC:EURUSD", "FX_IDC:GBPUSD", "FX_IDC:USDJPY", "FX_IDC:USDCHF",
                "FX_IDC:AUDUSD", "FX_IDC:USDCAD", "FX_IDC:NZDUSD",
            ],
            0,
        ),
        FeedSegment::new(
            "forex-minors",
            Category::Forex,
            "forex",
            &[
                "FX_IDC:EURGBP", "FX_IDC:EURJPY", "FX_IDC:GBPJPY", "FX_IDC:EURCHF",
                "FX_IDC:AUDJPY", "FX_IDC:EURAUD", "FX_IDC:GBPCHF", "FX_IDC:CADJPY",
            ],
            0,
        ),
        FeedSegment::new(
            "metals",
            Category::Metal,
            "futures",
            &["COMEX:GC1!", "COMEX:SI1!", "COMEX:HG1!", "NYMEX:PL1!", "NYMEX:PA1!"],
            0,
        ),
        FeedSegment::new(
            "energy",
            Category::Energy,
            "futures",
            &["NYMEX:CL1!", "ICEEUR:BRN1!", "NYMEX:NG1!", "NYMEX:RB1!", "NYMEX:HO1!"],
            0,
        ),
        FeedSegment::new("crypto", Category::Crypto, "crypto", &[], 100),
    ]
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match env::var(key) {
        Ok(v) => Ok(Some(v.trim().parse().with_context(|| format!("invalid {key}: {v:?}"))?)),
        Err(_) => Ok(None),
    }
}

// At least one second; huge values clamp instead of wrapping.
fn secs_to_ms(secs: u64) -> u64 {
    secs.max(1).saturating_mul(1000)
}

impl Config {
    /// Defaults overlaid with `DATABASE_URL`, `ALERT_SWEEP_SECS`,
    /// `FEED_REFRESH_SECS`, `FEED_SEGMENTS`, `TELEGRAM_BOT_API_KEY` and
    /// `ADMIN_USER_ID`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Config::default();

        if let Ok(url) = env::var("DATABASE_URL") {
            cfg.database_url = url;
        }
        if let Some(s) = env_u64("ALERT_SWEEP_SECS")? {
            cfg.sweep_interval_ms = secs_to_ms(s);
        }
        if let Some(s) = env_u64("FEED_REFRESH_SECS")? {
            cfg.feed_refresh_ms = secs_to_ms(s);
        }
        if let Ok(list) = env::var("FEED_SEGMENTS") {
            cfg.select_segments(&list)?;
        }

        cfg.telegram_token = env::var("TELEGRAM_BOT_API_KEY").ok().filter(|s| !s.trim().is_empty());
        cfg.admin_user_id = match env::var("ADMIN_USER_ID") {
            Ok(v) => Some(v.trim().parse().with_context(|| format!("invalid ADMIN_USER_ID: {v:?}"))?),
            Err(_) => None,
        };

        Ok(cfg)
    }

    /// Keep only the segments named in a comma-separated `list`.
    /// A list that names none of them is an error rather than a silent
    /// empty feed.
    pub fn select_segments(&mut self, list: &str) -> Result<()> {
        let wanted: Vec<String> = list
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        self.segments.retain(|s| wanted.contains(&s.name));
        if self.segments.is_empty() {
            bail!("FEED_SEGMENTS {list:?} names no known segment");
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn feed_refresh(&self) -> Duration {
        Duration::from_millis(self.feed_refresh_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_segment() {
        let cfg = Config::default();
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(60));
        assert_eq!(cfg.band_ratio, 0.01);
        let names: Vec<&str> = cfg.segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["forex-majors", "forex-minors", "metals", "energy", "crypto"]);
        assert!(cfg.segments[2].url.ends_with("/futures/scan"));
    }

    #[test]
    fn interval_seconds_clamp_at_both_ends() {
        assert_eq!(secs_to_ms(0), 1000);
        assert_eq!(secs_to_ms(90), 90_000);
        assert_eq!(secs_to_ms(u64::MAX), u64::MAX);
    }

    #[test]
    fn select_segments_keeps_named_ones() {
        let mut cfg = Config::default();
        cfg.select_segments(" Metals, crypto,,bogus").unwrap();
        let names: Vec<&str> = cfg.segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["metals", "crypto"]);
    }

    #[test]
    fn select_segments_rejects_unknown_only_list() {
        let mut cfg = Config::default();
        let err = cfg.select_segments("metal, cryptos").unwrap_err();
        assert!(err.to_string().contains("names no known segment"));

        let mut cfg = Config::default();
        assert!(cfg.select_segments("").is_err());
    }
}

use chrono::{DateTime, Utc};

use crate::state::ticker::Ticker;
use crate::types::Alert;

/// Which way the price has to move from `start_price` to reach the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
    Flat,
}

impl Direction {
    pub fn of(target: f64, start: f64) -> Direction {
        if target > start {
            Direction::Ascending
        } else if target < start {
            Direction::Descending
        } else {
            Direction::Flat
        }
    }
}

/// What a sweep should do with one alert.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Triggered on an earlier UTC day; arm it again and skip evaluation.
    Rearm,
    /// Inactive and still within its trigger day.
    Idle,
    /// No registry entry for the symbol.
    SymbolMissing,
    Trigger { live_price: f64 },
    Hold,
}

/// Midnight UTC of the day `now` falls in.
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(now)
}

pub fn needs_rearm(alert: &Alert, now: DateTime<Utc>) -> bool {
    !alert.active && alert.updated_at < start_of_utc_day(now)
}

/// Trigger test against one price observation.
///
/// An exact hit always triggers. With a daily range, the target counts as
/// reached once it lies inside the range on the far side of the start price,
/// or the live price is already past it, so a touch earlier today still
/// fires after the price has pulled back. Without a range, the live price
/// must be within `band_ratio * target` of the target.
pub fn is_triggered(target: f64, start: f64, live: f64, high: f64, low: f64, band_ratio: f64) -> bool {
    if live == target {
        return true;
    }

    let has_range = high > 0.0 && low > 0.0;
    match Direction::of(target, start) {
        Direction::Flat => false,
        Direction::Ascending if has_range => target < high || target < live,
        Direction::Descending if has_range => target > low || target > live,
        Direction::Ascending => target < live + band_ratio * target,
        Direction::Descending => target > live - band_ratio * target,
    }
}

pub fn decide(alert: &Alert, ticker: Option<&Ticker>, now: DateTime<Utc>, band_ratio: f64) -> Decision {
    if needs_rearm(alert, now) {
        return Decision::Rearm;
    }
    if !alert.active {
        return Decision::Idle;
    }
    let Some(t) = ticker else {
        return Decision::SymbolMissing;
    };

    if is_triggered(
        alert.target_price,
        alert.start_price,
        t.live_price,
        t.daily_high,
        t.daily_low,
        band_ratio,
    ) {
        Decision::Trigger { live_price: t.live_price }
    } else {
        Decision::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const BAND: f64 = 0.01;

    #[test]
    fn range_mode_target_below_high_triggers() {
        assert!(is_triggered(1.15, 1.10, 1.12, 1.16, 1.08, BAND));
    }

    #[test]
    fn range_mode_target_above_high_holds() {
        assert!(!is_triggered(1.15, 1.10, 1.12, 1.14, 1.08, BAND));
    }

    #[test]
    fn range_mode_live_past_target_triggers() {
        // High lags behind live on some sources.
        assert!(is_triggered(1.15, 1.10, 1.17, 1.14, 1.08, BAND));
    }

    #[test]
    fn range_mode_descending() {
        assert!(is_triggered(1.05, 1.10, 1.07, 1.12, 1.04, BAND));
        assert!(!is_triggered(1.05, 1.10, 1.07, 1.12, 1.06, BAND));
        assert!(is_triggered(1.05, 1.10, 1.04, 1.12, 1.06, BAND));
    }

    #[test]
    fn band_fallback_ascending() {
        assert!(is_triggered(110.0, 100.0, 109.5, 0.0, 0.0, BAND));
        assert!(!is_triggered(110.0, 100.0, 105.0, 0.0, 0.0, BAND));
    }

    #[test]
    fn band_fallback_descending() {
        assert!(is_triggered(90.0, 100.0, 90.5, 0.0, 0.0, BAND));
        assert!(!is_triggered(90.0, 100.0, 95.0, 0.0, 0.0, BAND));
    }

    #[test]
    fn one_sided_range_uses_band() {
        // high known, low missing => band
        assert!(!is_triggered(110.0, 100.0, 105.0, 120.0, 0.0, BAND));
    }

    #[test]
    fn flat_target_only_exact_match() {
        assert!(is_triggered(100.0, 100.0, 100.0, 101.0, 99.0, BAND));
        assert!(!is_triggered(100.0, 100.0, 100.5, 101.0, 99.0, BAND));
        assert!(!is_triggered(100.0, 100.0, 99.9, 0.0, 0.0, BAND));
    }

    #[test]
    fn exact_match_triggers_against_direction() {
        assert!(is_triggered(1.15, 1.10, 1.15, 1.15, 1.08, BAND));
    }

    #[test]
    fn day_start_is_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 17, 45, 12).unwrap();
        assert_eq!(start_of_utc_day(now), Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn rearm_only_after_the_next_midnight() {
        let triggered_at = Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 0).unwrap();
        let mut a = Alert::new(1, "EURUSD", "", 1.2, 1.1);
        a.active = false;
        a.updated_at = triggered_at;

        assert!(!needs_rearm(&a, triggered_at + Duration::seconds(59)));
        assert!(needs_rearm(&a, triggered_at + Duration::seconds(60)));

        a.active = true;
        assert!(!needs_rearm(&a, triggered_at + Duration::days(3)));
    }

    #[test]
    fn decide_paths() {
        let now = Utc::now();
        let mut a = Alert::new(1, "EURUSD", "", 1.15, 1.10);
        let t = Ticker::new(
            crate::types::PriceSample::new("EURUSD", crate::types::Category::Forex, 1.12, 1.16, 1.08),
            now,
        );

        assert_eq!(decide(&a, None, now, BAND), Decision::SymbolMissing);
        assert_eq!(decide(&a, Some(&t), now, BAND), Decision::Trigger { live_price: 1.12 });

        a.active = false;
        a.updated_at = now;
        assert_eq!(decide(&a, Some(&t), now, BAND), Decision::Idle);
        assert_eq!(decide(&a, None, now, BAND), Decision::Idle);
    }
}

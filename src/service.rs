//! Alert operations a front-end calls on behalf of a user.
//!
//! Command parsing and reply formatting live outside this crate; these
//! functions take already-validated arguments and return domain results.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::AlertError;
use crate::state::{SymbolFilter, TickerRegistry};
use crate::store::AlertStore;
use crate::types::{Alert, normalize_symbol};

#[derive(Clone)]
pub struct AlertService {
    registry: TickerRegistry,
    store: Arc<dyn AlertStore>,
}

impl AlertService {
    pub fn new(registry: TickerRegistry, store: Arc<dyn AlertStore>) -> Self {
        Self { registry, store }
    }

    /// Create an alert seeded with the current live price.
    ///
    /// A target strictly inside today's low/high is refused: it would fire on
    /// the very next sweep.
    pub async fn create_alert(
        &self,
        user_id: i64,
        symbol: &str,
        target_price: f64,
        description: &str,
    ) -> Result<Alert, AlertError> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(AlertError::InvalidTarget { target: target_price });
        }

        let ticker = self
            .registry
            .get(symbol)
            .await
            .ok_or_else(|| AlertError::SymbolNotFound {
                symbol: normalize_symbol(symbol),
            })?;

        if ticker.in_daily_range(target_price) {
            return Err(AlertError::TargetInDailyRange {
                target: target_price,
                high: ticker.daily_high,
                low: ticker.daily_low,
            });
        }

        let alert = Alert::new(user_id, &ticker.symbol, description, target_price, ticker.live_price);
        let stored = self.store.create_alert(&alert).await?;
        info!(user_id, number = stored.number, symbol = %stored.symbol, "alert created");
        Ok(stored)
    }

    /// Rendered alerts for a user, optionally for one symbol only.
    /// Symbols missing from the registry render against a live price of 0.
    pub async fn list_alerts(&self, user_id: i64, symbol: Option<&str>) -> Result<Vec<String>, AlertError> {
        let alerts = match symbol {
            Some(s) => self.store.get_alerts_by_user_and_symbol(user_id, s).await?,
            None => self.store.get_alerts_by_user(user_id).await?,
        };

        let mut out = Vec::with_capacity(alerts.len());
        for a in &alerts {
            let live = self.registry.get(&a.symbol).await.map_or(0.0, |t| t.live_price);
            out.push(a.render(live));
        }
        Ok(out)
    }

    /// Move an alert's target. The start price is re-seeded from the live
    /// price so the direction is measured from now. `updated_at` is refreshed
    /// too, so a triggered alert re-arms no earlier than the next UTC day
    /// after the edit.
    pub async fn update_alert(&self, user_id: i64, number: i32, target_price: f64) -> Result<Alert, AlertError> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(AlertError::InvalidTarget { target: target_price });
        }

        let mut alert = self
            .store
            .get_alert_by_number(user_id, number)
            .await?
            .ok_or(AlertError::AlertNotFound { number })?;

        let ticker = self
            .registry
            .get(&alert.symbol)
            .await
            .ok_or_else(|| AlertError::SymbolNotFound {
                symbol: alert.symbol.clone(),
            })?;

        alert.start_price = ticker.live_price;
        alert.target_price = target_price;
        alert.updated_at = Utc::now();
        self.store.update_alert(&alert).await?;
        info!(user_id, number, "alert updated");
        Ok(alert)
    }

    pub async fn delete_alert(&self, user_id: i64, number: i32) -> Result<(), AlertError> {
        let alert = self
            .store
            .get_alert_by_number(user_id, number)
            .await?
            .ok_or(AlertError::AlertNotFound { number })?;
        self.store.delete_alert(&alert.id).await?;
        info!(user_id, number, "alert deleted");
        Ok(())
    }

    /// Cascade used when a user account goes away.
    pub async fn delete_user_alerts(&self, user_id: i64) -> Result<u64, AlertError> {
        let n = self.store.delete_alerts_by_user(user_id).await?;
        info!(user_id, removed = n, "user alerts deleted");
        Ok(n)
    }

    /// Rendered registry entries matching `filter`, sorted by symbol.
    pub async fn list_symbols(&self, filter: &SymbolFilter) -> Vec<String> {
        let mut tickers: Vec<_> = self.registry.list(|t| filter.matches(t)).await.collect();
        tickers.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        tickers.iter().map(|t| t.render()).collect()
    }
}

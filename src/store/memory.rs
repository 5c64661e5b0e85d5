use anyhow::{Result, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::store::AlertStore;
use crate::types::Alert;

/// Alerts kept in a map keyed by owner.
///
/// Holding a user's shard entry while computing `max + 1` serializes number
/// assignment per user. `set_failing(true)` makes every call error;
/// `set_failing_updates(true)` fails only `update_alert`, so a sweep can load
/// alerts but not commit changes to them.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAlertStore {
    by_user: Arc<DashMap<i64, Vec<Alert>>>,
    failing: Arc<AtomicBool>,
    failing_updates: Arc<AtomicBool>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    pub fn set_failing_updates(&self, failing: bool) {
        self.failing_updates.store(failing, Ordering::Release);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            bail!("alert store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn list_all_alerts(&self) -> Result<Vec<Alert>> {
        self.check()?;
        let mut out: Vec<Alert> = self
            .by_user
            .iter()
            .flat_map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| a.user_id.cmp(&b.user_id).then(a.number.cmp(&b.number)));
        Ok(out)
    }

    async fn get_alerts_by_user(&self, user_id: i64) -> Result<Vec<Alert>> {
        self.check()?;
        Ok(self
            .by_user
            .get(&user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn get_alerts_by_user_and_symbol(&self, user_id: i64, symbol: &str) -> Result<Vec<Alert>> {
        let alerts = self.get_alerts_by_user(user_id).await?;
        Ok(alerts
            .into_iter()
            .filter(|a| a.symbol.eq_ignore_ascii_case(symbol.trim()))
            .collect())
    }

    async fn get_alert_by_number(&self, user_id: i64, number: i32) -> Result<Option<Alert>> {
        self.check()?;
        Ok(self
            .by_user
            .get(&user_id)
            .and_then(|e| e.value().iter().find(|a| a.number == number).cloned()))
    }

    async fn create_alert(&self, alert: &Alert) -> Result<Alert> {
        self.check()?;
        let mut entry = self.by_user.entry(alert.user_id).or_default();
        let next = entry.iter().map(|a| a.number).max().unwrap_or(0) + 1;

        let mut stored = alert.clone();
        stored.number = next;
        entry.push(stored.clone());
        Ok(stored)
    }

    async fn update_alert(&self, alert: &Alert) -> Result<()> {
        self.check()?;
        if self.failing_updates.load(Ordering::Acquire) {
            bail!("alert store rejected update of {}", alert.id);
        }
        let Some(mut entry) = self.by_user.get_mut(&alert.user_id) else {
            bail!("alert {} not found", alert.id);
        };
        let Some(slot) = entry.iter_mut().find(|a| a.id == alert.id) else {
            bail!("alert {} not found", alert.id);
        };
        // Owner and number are fixed once assigned.
        slot.symbol = alert.symbol.clone();
        slot.description = alert.description.clone();
        slot.target_price = alert.target_price;
        slot.start_price = alert.start_price;
        slot.active = alert.active;
        slot.updated_at = alert.updated_at;
        Ok(())
    }

    async fn delete_alert(&self, id: &str) -> Result<()> {
        self.check()?;
        for mut entry in self.by_user.iter_mut() {
            entry.value_mut().retain(|a| a.id != id);
        }
        Ok(())
    }

    async fn delete_alerts_by_user(&self, user_id: i64) -> Result<u64> {
        self.check()?;
        Ok(self
            .by_user
            .remove(&user_id)
            .map(|(_, v)| v.len() as u64)
            .unwrap_or(0))
    }
}

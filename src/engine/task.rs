use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::decision::{self, Decision};
use crate::notify::Notifier;
use crate::report::{self, FailureStage, SweepReport};
use crate::state::TickerRegistry;
use crate::store::AlertStore;
use crate::types::{Alert, Notification};

/// Sweeps every stored alert against the registry.
#[derive(Clone)]
pub struct Evaluator {
    registry: TickerRegistry,
    store: Arc<dyn AlertStore>,
    notifier: Arc<dyn Notifier>,
    band_ratio: f64,
}

impl Evaluator {
    pub fn new(
        registry: TickerRegistry,
        store: Arc<dyn AlertStore>,
        notifier: Arc<dyn Notifier>,
        band_ratio: f64,
    ) -> Self {
        Self {
            registry,
            store,
            notifier,
            band_ratio,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// One pass over all alerts as of `now`.
    ///
    /// Only a failure to load the alert list fails the sweep; anything that
    /// goes wrong with a single alert is recorded in the report and the
    /// sweep moves on.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let alerts = self
            .store
            .list_all_alerts()
            .await
            .context("Failed to load alerts for sweep")?;

        let mut report = SweepReport::default();
        for alert in alerts {
            self.process(alert, now, &mut report).await;
        }
        Ok(report)
    }

    async fn process(&self, mut alert: Alert, now: DateTime<Utc>, report: &mut SweepReport) {
        // Lookup only matters for active alerts.
        let ticker = if alert.active {
            self.registry.get(&alert.symbol).await
        } else {
            None
        };

        match decision::decide(&alert, ticker.as_ref(), now, self.band_ratio) {
            Decision::Idle => {}

            Decision::Rearm => {
                alert.active = true;
                alert.updated_at = now;
                match self.store.update_alert(&alert).await {
                    Ok(()) => {
                        debug!(alert_id = %alert.id, user_id = alert.user_id, "alert re-armed");
                        report.rearmed += 1;
                    }
                    Err(e) => report.fail(&alert.id, alert.user_id, FailureStage::Rearm, &e),
                }
            }

            Decision::SymbolMissing => {
                report.evaluated += 1;
                report.missing += 1;
                warn!(alert_id = %alert.id, symbol = %alert.symbol, "symbol not in registry");
                let n = Notification::symbol_unavailable(&alert);
                if let Err(e) = self.notifier.send(n.user_id, &n.text).await {
                    report.fail(&alert.id, alert.user_id, FailureStage::Notify, &e);
                }
            }

            Decision::Hold => {
                report.evaluated += 1;
            }

            Decision::Trigger { live_price } => {
                report.evaluated += 1;
                alert.active = false;
                alert.updated_at = now;

                // Commit first: a lost notification must not re-fire next sweep.
                if let Err(e) = self.store.update_alert(&alert).await {
                    report.fail(&alert.id, alert.user_id, FailureStage::Persist, &e);
                    return;
                }
                report.triggered += 1;
                info!(
                    alert_id = %alert.id,
                    user_id = alert.user_id,
                    symbol = %alert.symbol,
                    live_price,
                    target_price = alert.target_price,
                    "alert triggered"
                );

                let n = Notification::triggered(&alert, live_price);
                if let Err(e) = self.notifier.send(n.user_id, &n.text).await {
                    report.fail(&alert.id, alert.user_id, FailureStage::Notify, &e);
                }
            }
        }
    }
}

/// Run sweeps forever, one at a time. A tick that fires while a sweep is
/// still running is skipped rather than queued.
pub async fn run_evaluator(evaluator: Evaluator, period: Duration) -> Result<()> {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match evaluator.sweep().await {
            Ok(r) => report::log_sweep(&r),
            Err(e) => warn!("alert sweep failed, retrying next tick: {e:#}"),
        }
    }
}

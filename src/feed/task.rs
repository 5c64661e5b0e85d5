use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::feed::{PriceFeed, refresh_segment};
use crate::state::TickerRegistry;

/// Refresh one segment forever. Failures are logged and retried next tick.
pub async fn run_feed(feed: Arc<dyn PriceFeed>, registry: TickerRegistry, period: Duration) -> Result<()> {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match refresh_segment(feed.as_ref(), &registry).await {
            Ok(stats) => debug!(
                segment = feed.segment(),
                upserted = stats.upserted,
                skipped = stats.skipped,
                "feed refreshed"
            ),
            Err(e) => warn!(segment = feed.segment(), "feed refresh failed: {e:#}"),
        }
    }
}

/// One task per segment so a slow source never holds up the others.
pub fn spawn_feeds(feeds: Vec<Arc<dyn PriceFeed>>, registry: &TickerRegistry, period: Duration) -> Vec<JoinHandle<()>> {
    feeds
        .into_iter()
        .map(|feed| {
            let registry = registry.clone();
            info!(segment = feed.segment(), every_s = period.as_secs(), "starting feed");
            tokio::spawn(async move {
                let segment = feed.segment().to_string();
                if let Err(e) = run_feed(feed, registry, period).await {
                    warn!(segment = %segment, "feed task exited: {e:#}");
                }
            })
        })
        .collect()
}

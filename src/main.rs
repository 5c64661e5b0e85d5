use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use alertify::config::Config;
use alertify::engine::{self, Evaluator};
use alertify::feed::{self, PriceFeed, ScannerFeed};
use alertify::notify::{Notifier, TelegramNotifier};
use alertify::state::TickerRegistry;
use alertify::store::{AlertStore, SqliteAlertStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Basic logging: set RUST_LOG=info (or debug) to see output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::from_env()?;
    info!(version = env!("CARGO_PKG_VERSION"), admin_user_id = ?cfg.admin_user_id, "starting alertify");

    let token = cfg
        .telegram_token
        .clone()
        .context("TELEGRAM_BOT_API_KEY not set")?;

    let store: Arc<dyn AlertStore> = Arc::new(SqliteAlertStore::connect(&cfg.database_url).await?);
    let notifier: Arc<dyn Notifier> =
        Arc::new(TelegramNotifier::new(&token, cfg.http_timeout(), cfg.max_message_size)?);

    let registry = TickerRegistry::new();

    // Feed tasks: one per segment
    let mut feeds: Vec<Arc<dyn PriceFeed>> = Vec::with_capacity(cfg.segments.len());
    for seg in &cfg.segments {
        feeds.push(Arc::new(ScannerFeed::new(seg.clone(), cfg.http_timeout())?));
    }
    let _feed_handles = feed::task::spawn_feeds(feeds, &registry, cfg.feed_refresh());

    // Evaluator runs on the main task until ctrl-c.
    let evaluator = Evaluator::new(registry, store, notifier, cfg.band_ratio);
    tokio::select! {
        res = engine::run_evaluator(evaluator, cfg.sweep_interval()) => res?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}

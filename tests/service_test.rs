use chrono::{Duration, Utc};
use std::sync::Arc;

use alertify::error::AlertError;
use alertify::service::AlertService;
use alertify::state::{SymbolFilter, TickerRegistry};
use alertify::store::{AlertStore, InMemoryAlertStore};
use alertify::types::{Category, PriceSample};

async fn setup() -> (TickerRegistry, InMemoryAlertStore, AlertService) {
    let registry = TickerRegistry::new();
    registry
        .upsert("EURUSD", PriceSample::new("EURUSD", Category::Forex, 1.10, 1.12, 1.08))
        .await;
    registry
        .upsert("BTCUSD", PriceSample::new("BTCUSD", Category::Crypto, 64000.0, 0.0, 0.0).with_name("Bitcoin"))
        .await;
    let store = InMemoryAlertStore::new();
    let service = AlertService::new(registry.clone(), Arc::new(store.clone()));
    (registry, store, service)
}

#[tokio::test]
async fn create_seeds_start_price_and_numbers() {
    let (_, _, svc) = setup().await;

    let a = svc.create_alert(5, "eurusd", 1.15, "breakout").await.unwrap();
    assert_eq!(a.number, 1);
    assert_eq!(a.symbol, "EURUSD");
    assert_eq!(a.start_price, 1.10);
    assert!(a.active);

    let b = svc.create_alert(5, "BTCUSD", 70000.0, "").await.unwrap();
    assert_eq!(b.number, 2);
}

#[tokio::test]
async fn create_rejects_unknown_symbol_and_in_range_target() {
    let (_, store, svc) = setup().await;

    assert!(matches!(
        svc.create_alert(5, "XAGUSD", 30.0, "").await,
        Err(AlertError::SymbolNotFound { .. })
    ));
    assert!(matches!(
        svc.create_alert(5, "EURUSD", 1.11, "").await,
        Err(AlertError::TargetInDailyRange { .. })
    ));
    // Boundaries are not "strictly inside".
    assert!(svc.create_alert(5, "EURUSD", 1.12, "").await.is_ok());
    assert!(matches!(
        svc.create_alert(5, "EURUSD", -1.0, "").await,
        Err(AlertError::InvalidTarget { .. })
    ));

    assert_eq!(store.get_alerts_by_user(5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_reseeds_start_price_from_live() {
    let (registry, _, svc) = setup().await;
    let a = svc.create_alert(5, "EURUSD", 1.15, "").await.unwrap();

    registry
        .upsert("EURUSD", PriceSample::new("EURUSD", Category::Forex, 1.13, 1.14, 1.09))
        .await;
    let updated = svc.update_alert(5, a.number, 1.05).await.unwrap();
    assert_eq!(updated.start_price, 1.13);
    assert_eq!(updated.target_price, 1.05);
    assert_eq!(updated.id, a.id);

    assert!(matches!(
        svc.update_alert(5, 99, 1.0).await,
        Err(AlertError::AlertNotFound { number: 99 })
    ));
}

#[tokio::test]
async fn update_of_triggered_alert_keeps_it_inactive_until_next_day() {
    let (_, store, svc) = setup().await;
    let mut a = svc.create_alert(5, "EURUSD", 1.15, "").await.unwrap();
    a.active = false;
    a.updated_at = Utc::now() - Duration::days(2);
    store.update_alert(&a).await.unwrap();

    svc.update_alert(5, a.number, 1.20).await.unwrap();

    let stored = store.get_alert_by_number(5, a.number).await.unwrap().unwrap();
    assert!(!stored.active);
    assert_eq!(stored.target_price, 1.20);
    assert!(stored.updated_at > Utc::now() - Duration::minutes(1));
}

#[tokio::test]
async fn list_and_delete_by_number() {
    let (_, _, svc) = setup().await;
    svc.create_alert(5, "EURUSD", 1.15, "one").await.unwrap();
    svc.create_alert(5, "BTCUSD", 70000.0, "two").await.unwrap();
    svc.create_alert(6, "EURUSD", 1.15, "other user").await.unwrap();

    let all = svc.list_alerts(5, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].starts_with("#1 [EURUSD]"));

    let btc = svc.list_alerts(5, Some("btcusd")).await.unwrap();
    assert_eq!(btc.len(), 1);
    assert!(btc[0].contains("two"));

    svc.delete_alert(5, 1).await.unwrap();
    assert_eq!(svc.list_alerts(5, None).await.unwrap().len(), 1);
    assert!(matches!(svc.delete_alert(5, 1).await, Err(AlertError::AlertNotFound { .. })));

    assert_eq!(svc.delete_user_alerts(6).await.unwrap(), 1);
    assert!(svc.list_alerts(6, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_symbols_by_filter() {
    let (_, _, svc) = setup().await;

    assert_eq!(svc.list_symbols(&SymbolFilter::All).await.len(), 2);

    let crypto = svc.list_symbols(&SymbolFilter::Category(Category::Crypto)).await;
    assert_eq!(crypto.len(), 1);
    assert!(crypto[0].starts_with("BTCUSD (Bitcoin)"));

    let found = svc.list_symbols(&SymbolFilter::Search("bitc".into())).await;
    assert_eq!(found.len(), 1);
}

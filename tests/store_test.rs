use std::collections::BTreeSet;
use std::sync::Arc;

use alertify::store::{AlertStore, InMemoryAlertStore, SqliteAlertStore};
use alertify::types::Alert;

async fn concurrent_numbers(store: Arc<dyn AlertStore>, user: i64, n: i32) -> BTreeSet<i32> {
    let mut handles = Vec::new();
    for i in 0..n {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let a = Alert::new(user, "EURUSD", &format!("alert {i}"), 1.2, 1.1);
            store.create_alert(&a).await.expect("create").number
        }));
    }
    let mut out = BTreeSet::new();
    for h in handles {
        assert!(out.insert(h.await.unwrap()), "duplicate number");
    }
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_numbers_are_dense_under_concurrency() {
    let store = Arc::new(InMemoryAlertStore::new());
    for _ in 0..3 {
        store.create_alert(&Alert::new(7, "EURUSD", "", 1.2, 1.1)).await.unwrap();
    }

    let got = concurrent_numbers(store.clone(), 7, 20).await;
    let want: BTreeSet<i32> = (4..=23).collect();
    assert_eq!(got, want);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_numbers_are_dense_under_concurrency() {
    let store = Arc::new(SqliteAlertStore::connect("sqlite::memory:").await.unwrap());
    store.create_alert(&Alert::new(7, "EURUSD", "", 1.2, 1.1)).await.unwrap();

    let got = concurrent_numbers(store.clone(), 7, 20).await;
    let want: BTreeSet<i32> = (2..=21).collect();
    assert_eq!(got, want);

    let other = store.create_alert(&Alert::new(8, "EURUSD", "", 1.2, 1.1)).await.unwrap();
    assert_eq!(other.number, 1);
}

#[tokio::test]
async fn sqlite_crud_roundtrip() {
    let store = SqliteAlertStore::connect("sqlite::memory:").await.unwrap();

    let created = store
        .create_alert(&Alert::new(1, "xauusd", "gold", 2400.0, 2300.0))
        .await
        .unwrap();
    assert_eq!(created.number, 1);
    store.create_alert(&Alert::new(1, "EURUSD", "", 1.2, 1.1)).await.unwrap();
    store.create_alert(&Alert::new(2, "EURUSD", "", 1.2, 1.1)).await.unwrap();

    assert_eq!(store.list_all_alerts().await.unwrap().len(), 3);
    assert_eq!(store.get_alerts_by_user(1).await.unwrap().len(), 2);

    let gold = store.get_alerts_by_user_and_symbol(1, "XauUsd").await.unwrap();
    assert_eq!(gold.len(), 1);
    assert_eq!(gold[0].id, created.id);
    assert_eq!(gold[0].created_at, created.created_at);

    let mut edited = store.get_alert_by_number(1, 1).await.unwrap().unwrap();
    edited.active = false;
    edited.target_price = 2500.0;
    edited.updated_at = chrono::Utc::now();
    store.update_alert(&edited).await.unwrap();

    let reloaded = store.get_alert_by_number(1, 1).await.unwrap().unwrap();
    assert!(!reloaded.active);
    assert_eq!(reloaded.target_price, 2500.0);
    assert_eq!(reloaded.updated_at, edited.updated_at);

    store.delete_alert(&created.id).await.unwrap();
    assert!(store.get_alert_by_number(1, 1).await.unwrap().is_none());

    assert_eq!(store.delete_alerts_by_user(1).await.unwrap(), 1);
    assert_eq!(store.list_all_alerts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_update_of_unknown_alert_errors() {
    let store = SqliteAlertStore::connect("sqlite::memory:").await.unwrap();
    let ghost = Alert::new(1, "EURUSD", "", 1.2, 1.1);
    assert!(store.update_alert(&ghost).await.is_err());
}

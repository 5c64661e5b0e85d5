//! Durable alert storage.
//!
//! `AlertStore` is what the evaluator and the alert service talk to.
//! `SqliteAlertStore` is the production backend; `InMemoryAlertStore` backs
//! tests and local runs without a database file.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Alert;

pub use memory::InMemoryAlertStore;
pub use sqlite::SqliteAlertStore;

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Every alert regardless of owner.
    async fn list_all_alerts(&self) -> Result<Vec<Alert>>;

    async fn get_alerts_by_user(&self, user_id: i64) -> Result<Vec<Alert>>;

    /// Case-insensitive symbol match.
    async fn get_alerts_by_user_and_symbol(&self, user_id: i64, symbol: &str) -> Result<Vec<Alert>>;

    async fn get_alert_by_number(&self, user_id: i64, number: i32) -> Result<Option<Alert>>;

    /// Stores `alert` with the next per-user number and returns it.
    ///
    /// Number assignment is atomic per user: concurrent creations for the
    /// same user never share a number.
    async fn create_alert(&self, alert: &Alert) -> Result<Alert>;

    async fn update_alert(&self, alert: &Alert) -> Result<()>;

    async fn delete_alert(&self, id: &str) -> Result<()>;

    /// Removes every alert owned by `user_id`, returning how many went.
    async fn delete_alerts_by_user(&self, user_id: i64) -> Result<u64>;
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

use crate::store::AlertStore;
use crate::types::Alert;

const ALERT_COLUMNS: &str =
    "id, user_id, number, symbol, description, target_price, start_price, active, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct SqliteAlertStore {
    pool: SqlitePool,
}

impl SqliteAlertStore {
    /// Open (or create) the database at `db_url` and make sure the schema exists.
    pub async fn connect(db_url: &str) -> Result<Self> {
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let in_memory = db_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Each in-memory connection would be its own database.
        let max_connections = if in_memory { 1 } else { 5 };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                number INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                target_price REAL NOT NULL,
                start_price REAL NOT NULL,
                active BOOLEAN NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create alerts table")?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_user_number
            ON alerts (user_id, number);
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create alerts index")?;

        Ok(())
    }

    fn row_to_alert(row: &SqliteRow) -> Result<Alert> {
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(Alert {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            number: row.try_get("number")?,
            symbol: row.try_get("symbol")?,
            description: row.try_get("description")?,
            target_price: row.try_get("target_price")?,
            start_price: row.try_get("start_price")?,
            active: row.try_get("active")?,
            created_at,
            updated_at,
        })
    }

    fn rows_to_alerts(rows: &[SqliteRow]) -> Result<Vec<Alert>> {
        rows.iter().map(Self::row_to_alert).collect()
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn list_all_alerts(&self) -> Result<Vec<Alert>> {
        let rows = sqlx::query(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY user_id, number"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to load alerts")?;
        Self::rows_to_alerts(&rows)
    }

    async fn get_alerts_by_user(&self, user_id: i64) -> Result<Vec<Alert>> {
        let rows = sqlx::query(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE user_id = ? ORDER BY number"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load user alerts")?;
        Self::rows_to_alerts(&rows)
    }

    async fn get_alerts_by_user_and_symbol(&self, user_id: i64, symbol: &str) -> Result<Vec<Alert>> {
        let rows = sqlx::query(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE user_id = ? AND symbol = ? COLLATE NOCASE ORDER BY number"
        ))
        .bind(user_id)
        .bind(symbol.trim())
        .fetch_all(&self.pool)
        .await
        .context("Failed to load user alerts by symbol")?;
        Self::rows_to_alerts(&rows)
    }

    async fn get_alert_by_number(&self, user_id: i64, number: i32) -> Result<Option<Alert>> {
        let row = sqlx::query(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE user_id = ? AND number = ?"
        ))
        .bind(user_id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load alert by number")?;

        row.as_ref().map(Self::row_to_alert).transpose()
    }

    async fn create_alert(&self, alert: &Alert) -> Result<Alert> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // Number is computed inside the INSERT itself, so the read of MAX and
        // the write happen under the same write lock.
        let row = sqlx::query(
            r#"
            INSERT INTO alerts (id, user_id, number, symbol, description, target_price, start_price, active, created_at, updated_at)
            SELECT ?, ?, COALESCE(MAX(number), 0) + 1, ?, ?, ?, ?, ?, ?, ?
            FROM alerts WHERE user_id = ?
            RETURNING number
            "#,
        )
        .bind(&alert.id)
        .bind(alert.user_id)
        .bind(&alert.symbol)
        .bind(&alert.description)
        .bind(alert.target_price)
        .bind(alert.start_price)
        .bind(alert.active)
        .bind(alert.created_at)
        .bind(alert.updated_at)
        .bind(alert.user_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert alert")?;

        let number: i32 = row.try_get("number")?;
        tx.commit().await.context("Failed to commit alert")?;

        let mut stored = alert.clone();
        stored.number = number;
        Ok(stored)
    }

    async fn update_alert(&self, alert: &Alert) -> Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE alerts
            SET description = ?, symbol = ?, target_price = ?, start_price = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&alert.description)
        .bind(&alert.symbol)
        .bind(alert.target_price)
        .bind(alert.start_price)
        .bind(alert.active)
        .bind(alert.updated_at)
        .bind(&alert.id)
        .execute(&self.pool)
        .await
        .context("Failed to update alert")?;

        if res.rows_affected() == 0 {
            anyhow::bail!("alert {} not found", alert.id);
        }
        Ok(())
    }

    async fn delete_alert(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM alerts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete alert")?;
        Ok(())
    }

    async fn delete_alerts_by_user(&self, user_id: i64) -> Result<u64> {
        let res = sqlx::query("DELETE FROM alerts WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user alerts")?;
        Ok(res.rows_affected())
    }
}

//! Application settings
//!
//! Settings are stored as key-value pairs with JSON-serialized values. Keys
//! are defined in `cadence_core::settings`.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_storage::settings;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! settings::set_setting(pool, "audio.volume", &serde_json::json!(0.8)).await?;
//!
//! let volume = settings::get_setting(pool, "audio.volume").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use cadence_core::ConfigStore;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Setting entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting key
    pub key: String,
    /// Setting value (JSON)
    pub value: serde_json::Value,
}

/// Get a single setting value
///
/// Returns `Ok(None)` if the key was never written.
///
/// # Errors
///
/// Returns an error if the query fails or the stored value is not valid JSON
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<serde_json::Value>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Set a setting value, replacing any previous value
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &serde_json::Value) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(raw)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get every stored setting, sorted by key
pub async fn get_all_settings(pool: &SqlitePool) -> Result<Vec<Setting>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|(key, raw)| {
            Ok(Setting {
                key,
                value: serde_json::from_str(&raw)?,
            })
        })
        .collect()
}

/// Delete a setting
///
/// Returns `true` if the key existed.
pub async fn delete_setting(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// [`ConfigStore`] backed by the `settings` table
#[derive(Debug, Clone)]
pub struct SqliteConfigStore {
    pool: SqlitePool,
}

impl SqliteConfigStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn get(&self, key: &str) -> cadence_core::Result<Option<serde_json::Value>> {
        Ok(get_setting(&self.pool, key).await?)
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> cadence_core::Result<()> {
        Ok(set_setting(&self.pool, key, &value).await?)
    }
}

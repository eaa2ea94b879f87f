//! Persisted player state
//!
//! A single row holding the serialized queue, cursor, and status, written
//! after every player mutation and read once at start-up.

use async_trait::async_trait;
use cadence_core::{PersistedPlayerState, PlayerStateStore};
use sqlx::SqlitePool;

use crate::error::Result;

/// Load the saved player state, if any
pub async fn load(pool: &SqlitePool) -> Result<Option<PersistedPlayerState>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT state FROM player_state WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Save the player state, replacing the previous one
pub async fn save(pool: &SqlitePool, state: &PersistedPlayerState) -> Result<()> {
    let raw = serde_json::to_string(state)?;

    sqlx::query(
        "INSERT INTO player_state (id, state, updated_at)
         VALUES (1, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            state = excluded.state,
            updated_at = excluded.updated_at",
    )
    .bind(raw)
    .bind(chrono::Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok(())
}

/// Forget the saved state
pub async fn clear(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM player_state").execute(pool).await?;
    Ok(())
}

/// [`PlayerStateStore`] backed by the `player_state` table
#[derive(Debug, Clone)]
pub struct SqlitePlayerStateStore {
    pool: SqlitePool,
}

impl SqlitePlayerStateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerStateStore for SqlitePlayerStateStore {
    async fn load(&self) -> cadence_core::Result<Option<PersistedPlayerState>> {
        match load(&self.pool).await {
            Ok(state) => Ok(state),
            // A state written by an incompatible build is dropped, not fatal
            Err(crate::StorageError::SerializationError(e)) => {
                tracing::warn!("Discarding unreadable player state: {}", e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &PersistedPlayerState) -> cadence_core::Result<()> {
        Ok(save(&self.pool, state).await?)
    }
}

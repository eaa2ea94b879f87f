//! Playlists vertical slice
//!
//! A playlist row in `playlists`, one `playlist_tracks` row per entry keyed by
//! position. Edits load the playlist, change it in memory, and rewrite its
//! entries inside one transaction.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::TrackId;
//! use cadence_storage::playlists;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! let playlist = playlists::create(pool, "Road trip", &[TrackId::from("t1")]).await?;
//! playlists::add_tracks(pool, &playlist.id, &[TrackId::from("t7")]).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use cadence_core::{DropPosition, Playlist, PlaylistId, PlaylistStore, TrackId};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Result, StorageError};

const PLAYLIST_COLUMNS: &str = "id, name, created_at, updated_at";

#[derive(Debug, FromRow)]
struct PlaylistRow {
    id: String,
    name: String,
    created_at: i64,
    updated_at: i64,
}

impl PlaylistRow {
    fn into_playlist(self, tracks: Vec<TrackId>) -> Playlist {
        Playlist {
            id: PlaylistId::new(self.id),
            name: self.name,
            tracks,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::InvalidInput(
            "playlist name cannot be blank".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Every playlist with its tracks, sorted by name
pub async fn list(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows: Vec<PlaylistRow> = sqlx::query_as(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY name COLLATE NOCASE, created_at"
    ))
    .fetch_all(pool)
    .await?;

    let entries: Vec<(String, String)> = sqlx::query_as(
        "SELECT playlist_id, track_id FROM playlist_tracks ORDER BY playlist_id, position",
    )
    .fetch_all(pool)
    .await?;

    let mut tracks: HashMap<String, Vec<TrackId>> = HashMap::new();
    for (playlist_id, track_id) in entries {
        tracks
            .entry(playlist_id)
            .or_default()
            .push(TrackId::from(track_id));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let entries = tracks.remove(&row.id).unwrap_or_default();
            row.into_playlist(entries)
        })
        .collect())
}

/// Get a playlist by ID
pub async fn get(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let mut conn = pool.acquire().await?;
    fetch(&mut conn, id).await
}

/// Create a playlist
///
/// The name is trimmed and must not be blank.
pub async fn create(pool: &SqlitePool, name: &str, tracks: &[TrackId]) -> Result<Playlist> {
    let now = chrono::Utc::now().timestamp();
    let playlist = Playlist {
        id: PlaylistId::new(Uuid::new_v4().to_string()),
        name: validate_name(name)?,
        tracks: tracks.to_vec(),
        created_at: now,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO playlists (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(playlist.id.as_str())
        .bind(&playlist.name)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&mut *tx)
        .await?;
    write_tracks(&mut tx, &playlist).await?;

    tx.commit().await?;

    tracing::debug!(
        "Created playlist {} ({} tracks)",
        playlist.id,
        playlist.tracks.len()
    );
    Ok(playlist)
}

/// Rename a playlist
pub async fn rename(pool: &SqlitePool, id: &PlaylistId, name: &str) -> Result<Playlist> {
    let name = validate_name(name)?;
    edit(pool, id, |playlist| playlist.name = name).await
}

/// Delete a playlist and its entries
pub async fn delete(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(StorageError::not_found("Playlist", id.as_str()));
    }

    tx.commit().await?;
    Ok(())
}

/// Append tracks to a playlist
pub async fn add_tracks(
    pool: &SqlitePool,
    id: &PlaylistId,
    tracks: &[TrackId],
) -> Result<Playlist> {
    edit(pool, id, |playlist| playlist.add_tracks(tracks)).await
}

/// Remove every entry of the given tracks from a playlist
pub async fn remove_tracks(
    pool: &SqlitePool,
    id: &PlaylistId,
    tracks: &[TrackId],
) -> Result<Playlist> {
    edit(pool, id, |playlist| {
        playlist.remove_tracks(tracks);
    })
    .await
}

/// Move tracks above or below `target`
///
/// An unknown target, or a target among the moved tracks, leaves the order
/// unchanged.
pub async fn reorder(
    pool: &SqlitePool,
    id: &PlaylistId,
    moved: &[TrackId],
    target: &TrackId,
    position: DropPosition,
) -> Result<Playlist> {
    edit(pool, id, |playlist| {
        if !playlist.reorder(moved, target, position) {
            tracing::debug!("Reorder of playlist {} ignored", playlist.id);
        }
    })
    .await
}

async fn edit<F>(pool: &SqlitePool, id: &PlaylistId, change: F) -> Result<Playlist>
where
    F: FnOnce(&mut Playlist),
{
    let mut tx = pool.begin().await?;

    let mut playlist = fetch(&mut tx, id)
        .await?
        .ok_or_else(|| StorageError::not_found("Playlist", id.as_str()))?;

    change(&mut playlist);
    playlist.updated_at = chrono::Utc::now().timestamp();

    sqlx::query("UPDATE playlists SET name = ?, updated_at = ? WHERE id = ?")
        .bind(&playlist.name)
        .bind(playlist.updated_at)
        .bind(playlist.id.as_str())
        .execute(&mut *tx)
        .await?;
    write_tracks(&mut tx, &playlist).await?;

    tx.commit().await?;
    Ok(playlist)
}

async fn fetch(conn: &mut SqliteConnection, id: &PlaylistId) -> Result<Option<Playlist>> {
    let row: Option<PlaylistRow> = sqlx::query_as(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"
    ))
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let tracks: Vec<String> = sqlx::query_scalar(
        "SELECT track_id FROM playlist_tracks WHERE playlist_id = ? ORDER BY position",
    )
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(
        row.into_playlist(tracks.into_iter().map(TrackId::from).collect()),
    ))
}

async fn write_tracks(conn: &mut SqliteConnection, playlist: &Playlist) -> Result<()> {
    sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
        .bind(playlist.id.as_str())
        .execute(&mut *conn)
        .await?;

    for (position, track) in playlist.tracks.iter().enumerate() {
        sqlx::query(
            "INSERT INTO playlist_tracks (playlist_id, position, track_id) VALUES (?, ?, ?)",
        )
        .bind(playlist.id.as_str())
        .bind(position as i64)
        .bind(track.as_str())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Playlist store backed by `SQLite`
#[derive(Debug, Clone)]
pub struct SqlitePlaylistStore {
    pool: SqlitePool,
}

impl SqlitePlaylistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaylistStore for SqlitePlaylistStore {
    async fn list(&self) -> cadence_core::Result<Vec<Playlist>> {
        Ok(list(&self.pool).await?)
    }

    async fn get(&self, id: &PlaylistId) -> cadence_core::Result<Option<Playlist>> {
        Ok(get(&self.pool, id).await?)
    }

    async fn create(&self, name: &str, tracks: &[TrackId]) -> cadence_core::Result<Playlist> {
        Ok(create(&self.pool, name, tracks).await?)
    }

    async fn rename(&self, id: &PlaylistId, name: &str) -> cadence_core::Result<Playlist> {
        Ok(rename(&self.pool, id, name).await?)
    }

    async fn delete(&self, id: &PlaylistId) -> cadence_core::Result<()> {
        Ok(delete(&self.pool, id).await?)
    }

    async fn add_tracks(
        &self,
        id: &PlaylistId,
        tracks: &[TrackId],
    ) -> cadence_core::Result<Playlist> {
        Ok(add_tracks(&self.pool, id, tracks).await?)
    }

    async fn remove_tracks(
        &self,
        id: &PlaylistId,
        tracks: &[TrackId],
    ) -> cadence_core::Result<Playlist> {
        Ok(remove_tracks(&self.pool, id, tracks).await?)
    }

    async fn reorder(
        &self,
        id: &PlaylistId,
        moved: &[TrackId],
        target: &TrackId,
        position: DropPosition,
    ) -> cadence_core::Result<Playlist> {
        Ok(reorder(&self.pool, id, moved, target, position).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(validate_name("  Mix ").unwrap(), "Mix");
        assert!(matches!(
            validate_name(" \t"),
            Err(StorageError::InvalidInput(_))
        ));
    }
}

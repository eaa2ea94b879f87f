//! Library tracks
//!
//! Tracks are keyed by id and unique by file path. Rescanning a file updates
//! its metadata in place and keeps the id it was first stored with, so queues
//! and persisted state that reference it stay valid.

use crate::error::Result;
use async_trait::async_trait;
use cadence_core::{strip_accents, Track, TrackId, TrackMetadata, TrackRepository};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SQLite limits bound parameters per statement; id lookups are chunked
const MAX_IDS_PER_QUERY: usize = 500;

const TRACK_COLUMNS: &str = "id, path, title, artists, album, genres, duration_ms";

#[derive(sqlx::FromRow)]
struct TrackRow {
    id: String,
    path: String,
    title: String,
    artists: String,
    album: String,
    genres: String,
    duration_ms: i64,
}

impl TryFrom<TrackRow> for Track {
    type Error = crate::StorageError;

    fn try_from(row: TrackRow) -> Result<Self> {
        let metadata = TrackMetadata {
            title: row.title,
            artists: serde_json::from_str(&row.artists)?,
            album: Some(row.album),
            genres: serde_json::from_str(&row.genres)?,
            duration: Duration::from_millis(row.duration_ms.max(0) as u64),
        };

        Ok(Track::from_metadata(row.id, PathBuf::from(row.path), metadata))
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Get tracks by id
///
/// Unknown ids are skipped. Results come back in display order, not in the
/// order of `ids`.
pub async fn get_by_ids(pool: &SqlitePool, ids: &[TrackId]) -> Result<Vec<Track>> {
    let mut tracks = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");
        query.push(" ORDER BY lowered_artists, lowered_album, lowered_title");

        let rows: Vec<TrackRow> = query.build_query_as().fetch_all(pool).await?;
        for row in rows {
            tracks.push(Track::try_from(row)?);
        }
    }

    Ok(tracks)
}

/// Get a single track
pub async fn get_by_id(pool: &SqlitePool, id: &TrackId) -> Result<Option<Track>> {
    let row: Option<TrackRow> =
        sqlx::query_as(&format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(pool)
            .await?;

    row.map(Track::try_from).transpose()
}

/// Search the library
///
/// The term is lowered and accent-stripped, then matched as a substring of
/// the title, album, artists, or genres. An empty term returns every track.
/// Results are sorted by artist, album, then title.
pub async fn search(pool: &SqlitePool, term: &str) -> Result<Vec<Track>> {
    let needle = strip_accents(term.trim());
    let pattern = format!("%{}%", escape_like(&needle));

    let rows: Vec<TrackRow> = sqlx::query_as(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks
         WHERE lowered_title LIKE ?1 ESCAPE '\\'
            OR lowered_album LIKE ?1 ESCAPE '\\'
            OR lowered_artists LIKE ?1 ESCAPE '\\'
            OR lowered_genres LIKE ?1 ESCAPE '\\'
         ORDER BY lowered_artists, lowered_album, lowered_title"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Track::try_from).collect()
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Insert or update tracks, keyed by path
///
/// A path already in the library keeps its stored id. Runs in one transaction.
/// Returns the number of tracks written.
pub async fn upsert_many(pool: &SqlitePool, tracks: &[Track]) -> Result<u64> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for track in tracks {
        let result = sqlx::query(
            "INSERT INTO tracks
             (id, path, title, artists, album, genres, duration_ms,
              lowered_title, lowered_artists, lowered_album, lowered_genres,
              added_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(path) DO UPDATE SET
                title = excluded.title,
                artists = excluded.artists,
                album = excluded.album,
                genres = excluded.genres,
                duration_ms = excluded.duration_ms,
                lowered_title = excluded.lowered_title,
                lowered_artists = excluded.lowered_artists,
                lowered_album = excluded.lowered_album,
                lowered_genres = excluded.lowered_genres,
                updated_at = excluded.updated_at",
        )
        .bind(track.id.as_str())
        .bind(path_key(&track.path))
        .bind(&track.title)
        .bind(serde_json::to_string(&track.artists)?)
        .bind(&track.album)
        .bind(serde_json::to_string(&track.genres)?)
        .bind(track.duration.as_millis() as i64)
        .bind(&track.lowered.title)
        .bind(track.lowered.artists.join(", "))
        .bind(&track.lowered.album)
        .bind(track.lowered.genres.join(", "))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Delete tracks whose path is not in `keep`
///
/// Returns the number of tracks removed.
pub async fn remove_missing(pool: &SqlitePool, keep: &[PathBuf]) -> Result<u64> {
    let keep: HashSet<String> = keep.iter().map(|p| path_key(p)).collect();

    let stored: Vec<(String, String)> = sqlx::query_as("SELECT id, path FROM tracks")
        .fetch_all(pool)
        .await?;

    let mut tx = pool.begin().await?;
    let mut removed = 0;
    for (id, path) in stored {
        if !keep.contains(&path) {
            removed += sqlx::query("DELETE FROM tracks WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
    }
    tx.commit().await?;

    Ok(removed)
}

/// Number of tracks in the library
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Track library backed by `SQLite`
#[derive(Debug, Clone)]
pub struct TrackDatabase {
    pool: SqlitePool,
}

impl TrackDatabase {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// See [`upsert_many`]
    pub async fn upsert_tracks(&self, tracks: &[Track]) -> Result<u64> {
        upsert_many(&self.pool, tracks).await
    }

    /// See [`remove_missing`]
    pub async fn remove_missing(&self, keep: &[PathBuf]) -> Result<u64> {
        remove_missing(&self.pool, keep).await
    }

    pub async fn count(&self) -> Result<i64> {
        count(&self.pool).await
    }
}

#[async_trait]
impl TrackRepository for TrackDatabase {
    async fn find_by_id(&self, ids: &[TrackId]) -> cadence_core::Result<Vec<Track>> {
        Ok(get_by_ids(&self.pool, ids).await?)
    }

    async fn search(&self, term: &str) -> cadence_core::Result<Vec<Track>> {
        Ok(search(&self.pool, term).await?)
    }
}

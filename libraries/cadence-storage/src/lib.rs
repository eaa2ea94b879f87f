//! Cadence Storage
//!
//! `SQLite` database layer for Cadence.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each feature (tracks, playlists, settings, player
//!   state) owns its own queries
//! - **Trait Adapters**: each slice exposes a small struct implementing the
//!   matching `cadence-core` collaborator trait
//! - **Embedded Migrations**: the schema ships inside the binary
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::{ConfigStore, TrackRepository};
//! use cadence_storage::{create_pool, run_migrations, SqliteConfigStore, TrackDatabase};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://cadence.db").await?;
//! run_migrations(&pool).await?;
//!
//! let library = TrackDatabase::new(pool.clone());
//! let tracks = library.search("radiohead").await?;
//!
//! let settings = SqliteConfigStore::new(pool);
//! settings.set("audio.volume", serde_json::json!(0.8)).await?;
//! # Ok(())
//! # }
//! ```

mod error;

// Vertical slices
pub mod player_state;
pub mod playlists;
pub mod settings;
pub mod tracks;

pub use error::{Result, StorageError};
pub use player_state::SqlitePlayerStateStore;
pub use playlists::SqlitePlaylistStore;
pub use settings::SqliteConfigStore;
pub use tracks::TrackDatabase;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at start-up, before any other query.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g. `sqlite://cadence.db`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!("Creating pool with URL: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Database ready: {}", database_url);

    Ok(pool)
}

//! Collaborator traits for the playback engine
//!
//! The engine never talks to SQLite, rodio, or the UI directly; it goes through
//! these seams so every collaborator can be swapped for a fake in tests.
use crate::error::Result;
use crate::types::{
    DropPosition, PersistedPlayerState, Playlist, PlaylistId, Severity, Track, TrackId,
};
use async_trait::async_trait;

/// Track repository
///
/// Read-only access to the library database.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Resolve tracks by id
    ///
    /// The result order is not guaranteed to match `ids`; unknown ids are omitted.
    async fn find_by_id(&self, ids: &[TrackId]) -> Result<Vec<Track>>;

    /// Tracks matching a search term, sorted for display (artist, album, title)
    ///
    /// An empty term returns the whole library.
    async fn search(&self, term: &str) -> Result<Vec<Track>>;
}

/// Playlist storage
///
/// Every mutation returns the playlist as stored afterwards. Unknown playlist
/// ids fail with [`CoreError::NotFound`](crate::CoreError::NotFound), blank
/// names with [`CoreError::InvalidInput`](crate::CoreError::InvalidInput).
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Every playlist, sorted by name
    async fn list(&self) -> Result<Vec<Playlist>>;

    /// A single playlist
    async fn get(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    /// Create a playlist holding `tracks`
    async fn create(&self, name: &str, tracks: &[TrackId]) -> Result<Playlist>;

    /// Rename a playlist
    async fn rename(&self, id: &PlaylistId, name: &str) -> Result<Playlist>;

    /// Delete a playlist
    async fn delete(&self, id: &PlaylistId) -> Result<()>;

    /// Append tracks
    async fn add_tracks(&self, id: &PlaylistId, tracks: &[TrackId]) -> Result<Playlist>;

    /// Remove every entry of the given tracks
    async fn remove_tracks(&self, id: &PlaylistId, tracks: &[TrackId]) -> Result<Playlist>;

    /// Move tracks next to `target` (see [`Playlist::reorder`])
    async fn reorder(
        &self,
        id: &PlaylistId,
        moved: &[TrackId],
        target: &TrackId,
        position: DropPosition,
    ) -> Result<Playlist>;
}

/// Audio output device
///
/// `play` and `set_output_device` complete asynchronously and may fail; every other
/// call takes effect immediately.
#[async_trait]
pub trait AudioDevice: Send {
    /// Load a track, replacing the current one (does not start playback)
    fn set_track(&mut self, track: &Track);

    /// Start or resume playback of the loaded track
    async fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self);

    /// Stop playback and unload the track
    fn stop(&mut self);

    /// Mute output (preserves volume)
    fn mute(&mut self);

    /// Unmute output
    fn unmute(&mut self);

    /// Set the volume (0.0 = silent, 1.0 = full volume)
    fn set_volume(&mut self, volume: f32);

    /// Set the playback rate
    fn set_playback_rate(&mut self, rate: f64);

    /// Route output to another device
    async fn set_output_device(&mut self, device_id: &str) -> Result<()>;

    /// Elapsed time in the loaded track, in seconds
    fn current_time(&self) -> f64;

    /// Seek within the loaded track, in seconds
    fn set_current_time(&mut self, seconds: f64);

    /// Whether the device is paused (true when nothing is playing)
    fn is_paused(&self) -> bool;

    /// Names accepted by `set_output_device`
    fn output_devices(&self) -> Vec<String>;
}

/// Persistent key/value configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a value, `None` if the key was never set
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Write a value
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// User-facing notification sink (toasts)
pub trait NotificationSink: Send + Sync {
    /// Show a notification; fire-and-forget
    fn add(&self, severity: Severity, message: &str);
}

/// Storage for the queue state rehydrated on the next launch
#[async_trait]
pub trait PlayerStateStore: Send + Sync {
    /// Load the last saved state, `None` on first launch
    async fn load(&self) -> Result<Option<PersistedPlayerState>>;

    /// Save the current state
    async fn save(&self, state: &PersistedPlayerState) -> Result<()>;
}

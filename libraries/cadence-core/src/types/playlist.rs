//! User playlists
use super::ids::{PlaylistId, TrackId};
use serde::{Deserialize, Serialize};

/// Where dropped tracks land relative to the target track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Before the target
    Above,
    /// After the target
    Below,
}

/// An ordered, named list of tracks
///
/// A track may appear more than once. Tracks are referenced by id and
/// resolved through the library when played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist ID
    pub id: PlaylistId,
    /// Display name, never blank
    pub name: String,
    /// Tracks in playlist order
    pub tracks: Vec<TrackId>,
    /// Unix timestamp, seconds
    pub created_at: i64,
    /// Unix timestamp, seconds
    pub updated_at: i64,
}

impl Playlist {
    /// Navigation path of the playlist view, used as the queue origin
    pub fn view_path(&self) -> String {
        format!("/playlists/{}", self.id)
    }

    /// Append tracks
    pub fn add_tracks(&mut self, tracks: &[TrackId]) {
        self.tracks.extend_from_slice(tracks);
    }

    /// Remove every entry of the given tracks
    ///
    /// Returns the number of entries removed.
    pub fn remove_tracks(&mut self, tracks: &[TrackId]) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|id| !tracks.contains(id));
        before - self.tracks.len()
    }

    /// Move `moved` next to `target`, keeping their relative order
    ///
    /// Returns `false` and leaves the playlist untouched when `target` is not
    /// in the playlist or is one of the moved tracks.
    pub fn reorder(&mut self, moved: &[TrackId], target: &TrackId, position: DropPosition) -> bool {
        if moved.contains(target) {
            return false;
        }

        let (mut picked, mut rest): (Vec<TrackId>, Vec<TrackId>) = self
            .tracks
            .iter()
            .cloned()
            .partition(|id| moved.contains(id));

        let Some(anchor) = rest.iter().position(|id| id == target) else {
            return false;
        };
        let insert_at = match position {
            DropPosition::Above => anchor,
            DropPosition::Below => anchor + 1,
        };

        let tail = rest.split_off(insert_at);
        rest.append(&mut picked);
        rest.extend(tail);
        self.tracks = rest;
        true
    }
}

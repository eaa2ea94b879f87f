//! Queue persistence and rehydration
//!
//! The queue is saved as track ids. On launch the saved state is merged over
//! the defaults, then the ids are resolved back into tracks.

use cadence_core::{PersistedPlayerState, PlayerStatus, Track, TrackId};
use std::collections::HashMap;

/// Merge a persisted state over the defaults
///
/// Persisted fields win, except:
/// - `Play` is downgraded to `Pause`, playback never resumes on launch
/// - a cursor outside the persisted queue is discarded
/// - without a cursor the status is `Stop`, with one it is never `Stop`
///
/// No persisted state yields the defaults with status `Stop`.
pub fn merge(
    persisted: Option<PersistedPlayerState>,
    default: PersistedPlayerState,
) -> PersistedPlayerState {
    let Some(persisted) = persisted else {
        return PersistedPlayerState {
            status: PlayerStatus::Stop,
            ..default
        };
    };

    let cursor = persisted.cursor.filter(|c| *c < persisted.queue.len());
    let status = if cursor.is_some() {
        PlayerStatus::Pause
    } else {
        PlayerStatus::Stop
    };

    PersistedPlayerState {
        queue: persisted.queue,
        old_queue: persisted.old_queue,
        cursor,
        status,
        origin: persisted.origin.or(default.origin),
    }
}

/// Queue state with ids resolved into tracks
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredQueue {
    pub queue: Vec<Track>,
    pub old_queue: Vec<Track>,
    pub cursor: Option<usize>,
    pub status: PlayerStatus,
    pub origin: Option<String>,
}

/// Order `tracks` like `ids`
///
/// Repositories do not return tracks in request order. Ids without a track
/// are skipped; repeated ids yield repeated tracks.
pub fn resolve_in_order(ids: &[TrackId], tracks: &[Track]) -> Vec<Track> {
    let by_id: HashMap<&TrackId, &Track> = tracks.iter().map(|t| (&t.id, t)).collect();
    ids.iter()
        .filter_map(|id| by_id.get(id).map(|t| (*t).clone()))
        .collect()
}

/// Resolve a merged state against the tracks found in the library
///
/// Tracks that no longer exist are dropped. The cursor follows the playing
/// track; if it vanished, the cursor moves to the track that took its place
/// (clamped to the last index). An empty queue stops.
pub fn rehydrate(state: PersistedPlayerState, tracks: &[Track]) -> RestoredQueue {
    let by_id: HashMap<&TrackId, &Track> = tracks.iter().map(|t| (&t.id, t)).collect();

    let queue = resolve_in_order(&state.queue, tracks);
    let old_queue = resolve_in_order(&state.old_queue, tracks);

    let cursor = state.cursor.filter(|c| *c < state.queue.len()).and_then(|c| {
        let before = state.queue[..c]
            .iter()
            .filter(|id| by_id.contains_key(id))
            .count();
        let last = queue.len().checked_sub(1)?;
        Some(before.min(last))
    });

    let status = match cursor {
        Some(_) if state.status == PlayerStatus::Stop => PlayerStatus::Pause,
        Some(_) => state.status,
        None => PlayerStatus::Stop,
    };

    RestoredQueue {
        queue,
        old_queue,
        cursor,
        status,
        origin: state.origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[&str]) -> Vec<TrackId> {
        ids.iter().map(|id| TrackId::from(*id)).collect()
    }

    fn library(ids: &[&str]) -> Vec<Track> {
        ids.iter()
            .map(|id| Track::new(*id, id.to_uppercase(), format!("/music/{id}.flac")))
            .collect()
    }

    fn persisted(
        queue: &[&str],
        cursor: Option<usize>,
        status: PlayerStatus,
    ) -> PersistedPlayerState {
        PersistedPlayerState {
            queue: ids(queue),
            old_queue: ids(queue),
            cursor,
            status,
            origin: Some("/playlists/1".to_string()),
        }
    }

    #[test]
    fn merge_without_persisted_state_uses_defaults() {
        let default = PersistedPlayerState {
            origin: Some("/library".to_string()),
            status: PlayerStatus::Play,
            ..PersistedPlayerState::default()
        };

        let merged = merge(None, default);

        assert_eq!(merged.status, PlayerStatus::Stop);
        assert_eq!(merged.origin.as_deref(), Some("/library"));
        assert!(merged.queue.is_empty());
    }

    #[test]
    fn merge_downgrades_play_to_pause() {
        let merged = merge(
            Some(persisted(&["a", "b"], Some(1), PlayerStatus::Play)),
            PersistedPlayerState::default(),
        );

        assert_eq!(merged.status, PlayerStatus::Pause);
        assert_eq!(merged.cursor, Some(1));
        assert_eq!(merged.origin.as_deref(), Some("/playlists/1"));
    }

    #[test]
    fn merge_keeps_pause_and_stop() {
        let paused = merge(
            Some(persisted(&["a"], Some(0), PlayerStatus::Pause)),
            PersistedPlayerState::default(),
        );
        assert_eq!(paused.status, PlayerStatus::Pause);

        let stopped = merge(
            Some(persisted(&[], None, PlayerStatus::Stop)),
            PersistedPlayerState::default(),
        );
        assert_eq!(stopped.status, PlayerStatus::Stop);
    }

    #[test]
    fn merge_discards_out_of_range_cursor() {
        let merged = merge(
            Some(persisted(&["a", "b"], Some(5), PlayerStatus::Play)),
            PersistedPlayerState::default(),
        );

        assert_eq!(merged.cursor, None);
        assert_eq!(merged.status, PlayerStatus::Stop);
    }

    #[test]
    fn resolve_restores_request_order() {
        let mut tracks = library(&["a", "b", "c"]);
        tracks.reverse();

        let resolved = resolve_in_order(&ids(&["b", "missing", "a", "c", "a"]), &tracks);
        let resolved: Vec<&str> = resolved.iter().map(|t| t.id.as_str()).collect();

        assert_eq!(resolved, vec!["b", "a", "c", "a"]);
    }

    #[test]
    fn rehydrate_keeps_cursor_on_playing_track() {
        let state = persisted(&["a", "gone", "b", "c"], Some(2), PlayerStatus::Pause);

        let restored = rehydrate(state, &library(&["a", "b", "c"]));

        assert_eq!(restored.queue.len(), 3);
        assert_eq!(restored.cursor, Some(1));
        assert_eq!(restored.queue[1].id.as_str(), "b");
        assert_eq!(restored.status, PlayerStatus::Pause);
    }

    #[test]
    fn rehydrate_moves_cursor_when_playing_track_vanished() {
        let state = persisted(&["a", "b", "c"], Some(1), PlayerStatus::Pause);
        let restored = rehydrate(state, &library(&["a", "c"]));
        assert_eq!(restored.queue[restored.cursor.unwrap()].id.as_str(), "c");

        let state = persisted(&["a", "b"], Some(1), PlayerStatus::Pause);
        let restored = rehydrate(state, &library(&["a"]));
        assert_eq!(restored.cursor, Some(0));
    }

    #[test]
    fn rehydrate_with_empty_library_stops() {
        let state = persisted(&["a", "b"], Some(1), PlayerStatus::Pause);

        let restored = rehydrate(state, &[]);

        assert!(restored.queue.is_empty());
        assert_eq!(restored.cursor, None);
        assert_eq!(restored.status, PlayerStatus::Stop);
    }
}

mod ids;
mod notification;
mod playback_state;
mod playlist;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use notification::Severity;
pub use playlist::{DropPosition, Playlist};
pub use playback_state::{PersistedPlayerState, PlayerStatus, RepeatMode};
pub use track::{SearchProjection, Track, TrackMetadata, UNKNOWN_ALBUM, UNKNOWN_ARTIST};

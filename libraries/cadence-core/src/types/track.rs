//! Track domain type
use crate::search::strip_accents;
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Artist used when a file carries no artist tag
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Album used when a file carries no album tag
pub const UNKNOWN_ALBUM: &str = "Unknown";

/// Audio track
///
/// Immutable once loaded: created by the library scanner, read by everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist names, in tag order (never empty)
    pub artists: Vec<String>,

    /// Album name
    pub album: String,

    /// Genres, in tag order
    pub genres: Vec<String>,

    /// Track duration
    pub duration: Duration,

    /// File path on disk
    pub path: PathBuf,

    /// Lowercase, accent-free copies of the searchable fields
    pub lowered: SearchProjection,
}

/// Search projection of a track's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProjection {
    /// Lowered title
    pub title: String,
    /// Lowered artists
    pub artists: Vec<String>,
    /// Lowered album
    pub album: String,
    /// Lowered genres
    pub genres: Vec<String>,
}

impl SearchProjection {
    /// Compute the projection for the given fields
    pub fn new(title: &str, artists: &[String], album: &str, genres: &[String]) -> Self {
        Self {
            title: strip_accents(title),
            artists: artists.iter().map(|a| strip_accents(a)).collect(),
            album: strip_accents(album),
            genres: genres.iter().map(|g| strip_accents(g)).collect(),
        }
    }
}

/// Track metadata extracted from file tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title
    pub title: String,
    /// Artist names
    pub artists: Vec<String>,
    /// Album name
    pub album: Option<String>,
    /// Genres
    pub genres: Vec<String>,
    /// Duration
    pub duration: Duration,
}

impl TrackMetadata {
    /// Create metadata with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Track {
    /// Create a track with minimal metadata
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::from_metadata(id, path.into(), TrackMetadata::new(title))
    }

    /// Build a track from extracted tags, filling defaults and the search projection
    pub fn from_metadata(id: impl Into<TrackId>, path: PathBuf, metadata: TrackMetadata) -> Self {
        let artists: Vec<String> = metadata
            .artists
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        let artists = if artists.is_empty() {
            vec![UNKNOWN_ARTIST.to_string()]
        } else {
            artists
        };
        let album = metadata
            .album
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());

        let lowered = SearchProjection::new(&metadata.title, &artists, &album, &metadata.genres);

        Self {
            id: id.into(),
            title: metadata.title,
            artists,
            album,
            genres: metadata.genres,
            duration: metadata.duration,
            path,
            lowered,
        }
    }

    /// Whether this track matches a library search term
    ///
    /// The term is lowered and accent-stripped, then looked up as a substring of the
    /// title, album, joined artists, or joined genres. An empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let needle = strip_accents(term.trim());
        if needle.is_empty() {
            return true;
        }

        self.lowered.title.contains(&needle)
            || self.lowered.album.contains(&needle)
            || self.lowered.artists.join(", ").contains(&needle)
            || self.lowered.genres.join(", ").contains(&needle)
    }
}

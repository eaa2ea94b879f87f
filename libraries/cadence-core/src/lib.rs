//! Cadence Core
//!
//! Platform-agnostic core types, collaborator traits, and error handling for Cadence.
//!
//! This crate provides the foundational building blocks shared by the playback engine,
//! the storage layer, the library scanner, and the desktop application.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `Playlist`, `PlayerStatus`, `RepeatMode`,
//!   persisted player state
//! - **Collaborator Traits**: `TrackRepository`, `PlaylistStore`, `AudioDevice`,
//!   `ConfigStore`, `NotificationSink`, `PlayerStateStore`
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cadence_core::types::{Track, TrackMetadata};
//! use std::path::PathBuf;
//!
//! let mut metadata = TrackMetadata::new("Éclair de Lune");
//! metadata.artists = vec!["Beyoncé".to_string()];
//!
//! let track = Track::from_metadata("t1", PathBuf::from("/music/eclair.flac"), metadata);
//!
//! assert_eq!(track.lowered.title, "eclair de lune");
//! assert!(track.matches("BEYONCE"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod search;
pub mod settings;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use search::strip_accents;
pub use traits::{
    AudioDevice, ConfigStore, NotificationSink, PlayerStateStore, PlaylistStore, TrackRepository,
};

pub use types::{
    DropPosition, PersistedPlayerState, PlayerStatus, Playlist, PlaylistId, RepeatMode,
    SearchProjection, Severity, Track, TrackId, TrackMetadata,
};

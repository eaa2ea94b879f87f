//! Cadence - Playback Management
//!
//! The queue/playback state machine behind Cadence.
//!
//! This crate provides:
//! - Queue engine (cursor, history, upcoming tracks)
//! - Reversible shuffle (the playing track is pinned first)
//! - Repeat modes (None, All, One)
//! - Next/previous navigation with a restart threshold
//! - Queue persistence and rehydration across restarts
//! - Debounced volume persistence
//!
//! # Architecture
//!
//! `cadence-playback` knows nothing about SQLite, rodio, or the UI. The
//! audio device, the library, the settings store, and the toast sink are
//! reached through the traits in `cadence-core`, and state changes are
//! published as [`PlayerSnapshot`]s on a `tokio::sync::watch` channel.
//!
//! # Example: Queue Engine
//!
//! ```rust
//! use cadence_core::{RepeatMode, Track};
//! use cadence_playback::{QueueEngine, Step};
//!
//! let tracks: Vec<Track> = ["a", "b", "c"]
//!     .iter()
//!     .map(|id| Track::new(*id, id.to_uppercase(), format!("/music/{id}.mp3")))
//!     .collect();
//!
//! let mut queue = QueueEngine::with_seed(42);
//! queue.start(tracks, 2, None).unwrap();
//!
//! // Last track without repeat: playback stops
//! assert_eq!(queue.next_step(), Ok(Step::Stop));
//!
//! queue.set_repeat(RepeatMode::All);
//! assert_eq!(queue.next_step(), Ok(Step::To(0)));
//!
//! // Shuffling pins the playing track first, un-shuffling restores the order
//! queue.set_shuffle(true);
//! assert_eq!(queue.current().unwrap().id.as_str(), "c");
//! assert_eq!(queue.cursor(), Some(0));
//!
//! queue.set_shuffle(false);
//! assert_eq!(queue.cursor(), Some(2));
//! ```

mod error;
mod events;
mod manager;
pub mod persistence;
mod queue;
mod shuffle;
pub mod types;
mod volume;

// Public exports
pub use error::{PlaybackError, Result};
pub use events::PlayerSnapshot;
pub use manager::{PlaybackController, PlayerServices, OUTPUT_DEVICE_ERROR, PLAYBACK_ERROR};
pub use persistence::{merge, rehydrate, RestoredQueue};
pub use queue::{QueueEngine, Step};
pub use shuffle::{fisher_yates, shuffle_around};
pub use types::{PlayerConfig, DEFAULT_ORIGIN};
pub use volume::VolumeSaver;

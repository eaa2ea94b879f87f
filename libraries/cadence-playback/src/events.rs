//! Player snapshots
//!
//! The controller publishes an immutable snapshot after every state change.
//! Subscribers hold a `tokio::sync::watch` receiver and diff what they need.

use cadence_core::{PlayerStatus, RepeatMode, Track};
use serde::{Deserialize, Serialize};

/// Immutable view of the player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player status
    pub status: PlayerStatus,

    /// Tracks in playback order
    pub queue: Vec<Track>,

    /// Index of the current track
    pub cursor: Option<usize>,

    /// View the queue was started from
    pub origin: Option<String>,

    pub shuffle: bool,
    pub repeat: RepeatMode,

    /// Volume (0.0 - 1.0)
    pub volume: f32,
    pub muted: bool,
    pub playback_rate: f64,

    /// Output device identifier
    pub output_device: String,
}

impl PlayerSnapshot {
    /// Track at the cursor
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|c| self.queue.get(c))
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            status: PlayerStatus::Stop,
            queue: Vec::new(),
            cursor: None,
            origin: None,
            shuffle: false,
            repeat: RepeatMode::None,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            output_device: cadence_core::settings::DEFAULT_OUTPUT_DEVICE.to_string(),
        }
    }
}

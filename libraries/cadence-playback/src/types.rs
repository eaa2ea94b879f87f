//! Configuration types for the playback controller

use std::time::Duration;

/// Origin used when a queue was started without one
pub const DEFAULT_ORIGIN: &str = "/library";

/// Playback controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Elapsed time below which `previous` goes back a track instead of
    /// restarting the current one
    pub previous_threshold: Duration,

    /// Quiet period before a volume change is written to the config store
    pub volume_debounce: Duration,

    /// Initial volume (0.0 - 1.0), used when no setting is stored
    pub default_volume: f32,

    /// Allowed playback rate range (inclusive)
    pub playback_rate_range: (f64, f64),

    /// Fixed shuffle seed, `None` to seed from entropy
    pub shuffle_seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            previous_threshold: Duration::from_secs(5),
            volume_debounce: Duration::from_millis(500),
            default_volume: 1.0,
            playback_rate_range: (0.5, 5.0),
            shuffle_seed: None,
        }
    }
}

impl PlayerConfig {
    /// Whether `rate` lies in the allowed playback rate range
    pub fn accepts_rate(&self, rate: f64) -> bool {
        let (min, max) = self.playback_rate_range;
        rate >= min && rate <= max
    }
}

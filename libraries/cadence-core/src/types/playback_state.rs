//! Playback state types shared by the engine and the persistence layer
use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Player status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// No active queue
    #[default]
    Stop,
    /// Currently playing
    Play,
    /// Paused mid-track
    Pause,
}

/// Repeat mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    None,
    /// Wrap to the start of the queue
    All,
    /// Replay the current track
    One,
}

impl RepeatMode {
    /// Next mode in the cycle `None -> All -> One -> None`
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::All,
            Self::All => Self::One,
            Self::One => Self::None,
        }
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Queue state persisted across restarts
///
/// Tracks are stored by id and resolved through the track repository on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPlayerState {
    /// Queue, in playback order
    pub queue: Vec<TrackId>,

    /// Pre-shuffle queue
    #[serde(default)]
    pub old_queue: Vec<TrackId>,

    /// Index of the current track in `queue`
    pub cursor: Option<usize>,

    /// Player status at the time of saving
    pub status: PlayerStatus,

    /// View the queue was started from
    #[serde(default)]
    pub origin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_through_all_modes() {
        assert_eq!(RepeatMode::None.next(), RepeatMode::All);
        assert_eq!(RepeatMode::All.next(), RepeatMode::One);
        assert_eq!(RepeatMode::One.next(), RepeatMode::None);
    }

    #[test]
    fn repeat_string_matches_serde() {
        for mode in [RepeatMode::None, RepeatMode::All, RepeatMode::One] {
            let stored = serde_json::json!(mode.as_str());
            assert_eq!(serde_json::from_value::<RepeatMode>(stored).unwrap(), mode);
        }
        assert!(serde_json::from_str::<RepeatMode>("\"sometimes\"").is_err());
    }

    #[test]
    fn persisted_state_tolerates_missing_optional_fields() {
        let state: PersistedPlayerState =
            serde_json::from_str(r#"{"queue":["a","b"],"cursor":1,"status":"play"}"#).unwrap();

        assert_eq!(state.queue, vec![TrackId::from("a"), TrackId::from("b")]);
        assert!(state.old_queue.is_empty());
        assert_eq!(state.cursor, Some(1));
        assert_eq!(state.status, PlayerStatus::Play);
        assert_eq!(state.origin, None);
    }
}

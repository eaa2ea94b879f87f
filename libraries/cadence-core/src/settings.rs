//! Setting keys shared by the playback engine and the config store
//!
//! Values are stored as JSON, see [`crate::ConfigStore`].

/// Shuffle flag (`bool`)
pub const SETTING_SHUFFLE: &str = "audio.shuffle";

/// Repeat mode (`"none" | "all" | "one"`)
pub const SETTING_REPEAT: &str = "audio.repeat";

/// Volume (`f32`, 0.0-1.0)
pub const SETTING_VOLUME: &str = "audio.volume";

/// Muted flag (`bool`)
pub const SETTING_MUTED: &str = "audio.muted";

/// Playback rate (`f64`, 0.5-5.0)
pub const SETTING_PLAYBACK_RATE: &str = "audio.playback_rate";

/// Output device identifier (`string`)
pub const SETTING_OUTPUT_DEVICE: &str = "audio.output_device";

/// Identifier of the system default output device
pub const DEFAULT_OUTPUT_DEVICE: &str = "default";

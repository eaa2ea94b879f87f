//! Notification severity levels
use serde::{Deserialize, Serialize};

/// Severity of a user-facing notification (toast)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information
    Info,
    /// An operation succeeded
    Success,
    /// Something degraded but playback continues
    Warning,
    /// An operation failed
    Danger,
}

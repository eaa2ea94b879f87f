//! Error types for queue operations
//!
//! Queue operations report why they did nothing; the controller logs the
//! reason and carries on, since every command is a no-op on bad input.

use cadence_core::TrackId;
use thiserror::Error;

/// Queue engine errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// No candidate tracks were given
    #[error("No candidate tracks")]
    EmptyCandidates,

    /// The requested track is not part of the candidates
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// There is no active queue (cursor is unset)
    #[error("No active queue")]
    NoActiveQueue,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

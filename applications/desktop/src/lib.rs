//! Cadence desktop host
//!
//! Hosts the playback engine for a separate UI process. The UI sends one JSON
//! command per line on stdin; state snapshots and toasts come back as JSON
//! lines on stdout. Logs go to stderr.

pub mod config;
pub mod device;
pub mod error;
pub mod ipc;
pub mod toast;

pub use config::AppConfig;
pub use device::{RodioDevice, TrackEnd};
pub use error::{DesktopError, Result};
pub use ipc::{run_session, Command, Event, Library};
pub use toast::{Toast, ToastSink};

//! Cadence Metadata
//!
//! Tag reading and library scanning for Cadence.
//!
//! This crate provides:
//! - Tag reading from audio files (MP3, FLAC, OGG, OPUS, WAV, M4A, AAC)
//! - Recursive folder scanning with progress reporting
//!
//! Scanning produces [`cadence_core::Track`] records; persisting them is up to
//! the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_metadata::{LibraryScanner, LoftyMetadataReader};
//! use std::path::Path;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Read metadata from a file
//! let reader = LoftyMetadataReader::new();
//! let metadata = reader.read(Path::new("/music/song.mp3"))?;
//!
//! // Scan a folder
//! let scanner = LibraryScanner::new();
//! let outcome = scanner.scan(Path::new("/music"), None).await?;
//! println!("{} tracks", outcome.tracks.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod reader;
mod scanner;

pub use error::{MetadataError, Result};
pub use reader::LoftyMetadataReader;
pub use scanner::{LibraryScanner, ScanConfig, ScanOutcome, ScanProgress, ScanStats};

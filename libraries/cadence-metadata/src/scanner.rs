//! Library scanner implementation
use crate::error::{MetadataError, Result};
use crate::reader::LoftyMetadataReader;
use cadence_core::{Track, TrackId};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Scan configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Supported audio file extensions (lowercase, without the dot)
    pub extensions: Vec<String>,

    /// Follow symbolic links while walking folders (default: false)
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "flac", "ogg", "opus", "wav", "m4a", "aac"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            follow_links: false,
        }
    }
}

/// Scan progress updates
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// Scanning started
    Started { total_files: usize },

    /// File scanned
    FileScanned {
        path: PathBuf,
        success: bool,
        error: Option<String>,
    },

    /// Scanning completed
    Completed { stats: ScanStats },
}

/// Scan statistics
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Number of supported files discovered
    pub files_discovered: usize,

    /// Number of files whose metadata was read
    pub files_scanned: usize,

    /// Errors encountered, per file
    pub errors: Vec<(PathBuf, String)>,
}

/// Result of a scan: the tracks found and how it went
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Tracks read from the scanned files, in walk order
    pub tracks: Vec<Track>,

    /// Scan statistics
    pub stats: ScanStats,
}

impl ScanOutcome {
    /// Every supported file the scan found, readable or not
    ///
    /// This is the set to keep when pruning the library: a file that failed
    /// to read still exists and keeps its row.
    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.tracks
            .iter()
            .map(|track| track.path.clone())
            .chain(self.stats.errors.iter().map(|(path, _)| path.clone()))
            .collect()
    }
}

/// Library scanner
///
/// Every track gets a fresh random id. Storage keeps the id of a path it has
/// already seen, so rescanning does not break saved queues.
#[derive(Debug, Clone, Default)]
pub struct LibraryScanner {
    reader: LoftyMetadataReader,
    config: ScanConfig,
}

impl LibraryScanner {
    /// Create a new library scanner
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScanConfig) -> Self {
        Self {
            reader: LoftyMetadataReader::new(),
            config,
        }
    }

    /// Scan a file or directory for audio files
    ///
    /// Unreadable files are recorded in the stats and skipped.
    ///
    /// # Arguments
    /// * `path` - File or directory to scan
    /// * `progress_tx` - Optional channel for progress updates
    pub async fn scan(
        &self,
        path: &Path,
        progress_tx: Option<mpsc::Sender<ScanProgress>>,
    ) -> Result<ScanOutcome> {
        let mut outcome = ScanOutcome::default();

        let files = self.discover_files(path)?;
        outcome.stats.files_discovered = files.len();
        tracing::info!("Scanning {} files under {}", files.len(), path.display());

        notify(
            progress_tx.as_ref(),
            ScanProgress::Started {
                total_files: files.len(),
            },
        )
        .await;

        for file_path in files {
            let reader = self.reader;
            let read_path = file_path.clone();
            // Tag parsing is blocking file I/O
            let result = tokio::task::spawn_blocking(move || reader.read(&read_path))
                .await
                .map_err(|e| MetadataError::ParseError(e.to_string()))
                .and_then(|read| read);

            let error = match result {
                Ok(metadata) => {
                    outcome.stats.files_scanned += 1;
                    let id = TrackId::new(uuid::Uuid::new_v4().to_string());
                    outcome
                        .tracks
                        .push(Track::from_metadata(id, file_path.clone(), metadata));
                    None
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", file_path.display(), e);
                    outcome.stats.errors.push((file_path.clone(), e.to_string()));
                    Some(e.to_string())
                }
            };

            notify(
                progress_tx.as_ref(),
                ScanProgress::FileScanned {
                    path: file_path,
                    success: error.is_none(),
                    error,
                },
            )
            .await;
        }

        notify(
            progress_tx.as_ref(),
            ScanProgress::Completed {
                stats: outcome.stats.clone(),
            },
        )
        .await;

        Ok(outcome)
    }

    /// Discover audio files in a directory recursively, in sorted walk order
    fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        if path.is_file() {
            return Ok(if self.is_supported_file(path) {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let files = walkdir::WalkDir::new(path)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file() && self.is_supported_file(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();

        Ok(files)
    }

    /// Check if file is a supported audio format
    fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.config.extensions.contains(&e.to_lowercase()))
    }
}

async fn notify(tx: Option<&mpsc::Sender<ScanProgress>>, progress: ScanProgress) {
    if let Some(tx) = tx {
        // A dropped receiver only means nobody is watching
        let _ = tx.send(progress).await;
    }
}

//! Metadata reader implementation using lofty
use crate::error::{MetadataError, Result};
use cadence_core::TrackMetadata;
use lofty::{AudioFile, ItemKey, TaggedFileExt};
use std::path::Path;

/// Separators accepted between several artists or genres in a single tag value
const LIST_SEPARATORS: &[char] = &[';', '/'];

/// Metadata reader using the lofty library
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyMetadataReader;

impl LoftyMetadataReader {
    /// Create a new metadata reader
    pub fn new() -> Self {
        Self
    }

    /// Read tags and duration from an audio file
    ///
    /// Files without tags still succeed: the title falls back to the file
    /// stem and artists, album, and genres are left empty for
    /// [`cadence_core::Track::from_metadata`] to default.
    pub fn read(&self, path: &Path) -> Result<TrackMetadata> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        let tagged_file = lofty::read_from_path(path)?;

        let mut metadata = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            Some(tag) => Self::extract_from_tag(tag),
            None => TrackMetadata::default(),
        };
        metadata.duration = tagged_file.properties().duration();

        if metadata.title.trim().is_empty() {
            metadata.title = file_stem(path);
        }

        Ok(metadata)
    }

    fn extract_from_tag(tag: &lofty::Tag) -> TrackMetadata {
        let mut metadata = TrackMetadata::default();

        // Multi-valued fields may come as repeated items or as one joined value
        for item in tag.items() {
            let Some(text) = item.value().text() else {
                continue;
            };

            match item.key() {
                ItemKey::TrackTitle => metadata.title = text.trim().to_string(),
                ItemKey::TrackArtist => metadata.artists.extend(split_list(text)),
                ItemKey::AlbumTitle => metadata.album = Some(text.trim().to_string()),
                ItemKey::Genre => metadata.genres.extend(split_list(text)),
                _ => {}
            }
        }

        metadata
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(LIST_SEPARATORS)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

//! Search projections
//!
//! Library search compares lowercase, accent-free text so that "beyonce" finds
//! "Beyoncé". The projections are computed once when a track is loaded.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Lowercase `input` and strip diacritics.
///
/// The text is decomposed (NFD) and combining marks are dropped, so "Ångström"
/// becomes "angstrom". Characters without a decomposition (e.g. "ø") are kept.
pub fn strip_accents(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

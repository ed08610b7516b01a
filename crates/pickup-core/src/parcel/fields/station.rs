//! Collection station extraction.

use super::patterns::{PatternLibrary, PatternSet};
use super::FieldExtractor;
use crate::models::parcel::ParcelField;

/// Station extractor. Any non-empty candidate is accepted as-is.
pub struct StationExtractor<'a> {
    patterns: &'a PatternSet,
}

impl<'a> StationExtractor<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            patterns: library.set(ParcelField::Station),
        }
    }
}

impl Default for StationExtractor<'static> {
    fn default() -> Self {
        Self::new(PatternLibrary::builtin())
    }
}

impl FieldExtractor for StationExtractor<'_> {
    fn field(&self) -> ParcelField {
        ParcelField::Station
    }

    fn patterns(&self) -> &PatternSet {
        self.patterns
    }

    fn accept(&self, candidate: &str) -> Option<String> {
        (!candidate.is_empty()).then(|| candidate.to_string())
    }
}

/// Extract a station name from text with the built-in patterns.
pub fn extract_station(text: &str) -> Option<String> {
    StationExtractor::default().extract(text)
}

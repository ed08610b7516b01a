//! Pattern-driven field extractors.

pub mod address;
pub mod code;
pub mod patterns;
pub mod station;

pub use address::{
    clean_address, extract_address, AddressCleaner, AddressExtractor, TRAILING_PHRASES,
};
pub use code::{extract_code, is_valid_code, CodeExtractor};
pub use patterns::{
    Pattern, PatternHit, PatternLibrary, PatternMatch, PatternSet, PatternSpec, ADDRESS_PATTERNS,
    CODE_PATTERNS, STATION_PATTERNS,
};
pub use station::{extract_station, StationExtractor};

use tracing::{debug, trace};

use crate::models::parcel::ParcelField;

/// Trait for single-field extractors driven by an ordered pattern set.
pub trait FieldExtractor {
    /// The field this extractor fills.
    fn field(&self) -> ParcelField;

    /// Patterns in precedence order.
    fn patterns(&self) -> &PatternSet;

    /// Turn a trimmed candidate into the final value, or reject it.
    fn accept(&self, candidate: &str) -> Option<String>;

    /// First accepted candidate. A rejected candidate moves on to the next
    /// pattern rather than ending the search.
    fn extract(&self, text: &str) -> Option<String> {
        for pattern in self.patterns().iter() {
            let Some(m) = pattern.find(text) else {
                continue;
            };
            match self.accept(&m.value) {
                Some(value) => {
                    debug!(
                        field = %self.field(),
                        pattern = pattern.name(),
                        %value,
                        "field extracted"
                    );
                    return Some(value);
                }
                None => {
                    trace!(
                        field = %self.field(),
                        pattern = pattern.name(),
                        candidate = %m.value,
                        "candidate rejected"
                    );
                }
            }
        }
        None
    }

    /// Every pattern that matched, in order, with its acceptance outcome.
    fn explain(&self, text: &str) -> Vec<PatternHit> {
        self.patterns()
            .iter()
            .filter_map(|pattern| {
                pattern.find(text).map(|m| PatternHit {
                    field: self.field(),
                    pattern: pattern.name().to_string(),
                    accepted: self.accept(&m.value),
                    candidate: m.value,
                    position: (m.start, m.end),
                })
            })
            .collect()
    }
}

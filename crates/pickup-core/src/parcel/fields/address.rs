//! Address extraction and cleanup.

use super::patterns::{PatternLibrary, PatternSet};
use super::FieldExtractor;
use crate::models::parcel::{ParcelField, UNKNOWN_ADDRESS};

/// Boilerplate reminders that trail an address in pickup notices.
pub const TRAILING_PHRASES: &[&str] = &[
    "请", "请您", "佩戴", "口罩", "个人", "防护", "及时", "取件", "联系", "电话", "取包裹", "领取包裹",
];

const DELIMITERS: [char; 2] = [',', '，'];

/// Strips trailing reminders and everything after the first comma.
///
/// Cleaning repeats until the string stops changing, so
/// `clean(clean(x)) == clean(x)` holds for every input. A candidate that
/// cleans down to nothing becomes the unknown-address sentinel.
#[derive(Debug, Clone)]
pub struct AddressCleaner {
    sentinel: String,
}

impl Default for AddressCleaner {
    fn default() -> Self {
        Self::new(UNKNOWN_ADDRESS)
    }
}

impl AddressCleaner {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn clean(&self, candidate: &str) -> String {
        let mut current = candidate.trim().to_string();
        loop {
            let next = clean_once(&current);
            if next == current {
                break;
            }
            current = next;
        }

        if current.is_empty() {
            self.sentinel.clone()
        } else {
            current
        }
    }
}

fn clean_once(candidate: &str) -> String {
    let mut cleaned = candidate.trim();

    loop {
        let Some(stripped) = TRAILING_PHRASES
            .iter()
            .find_map(|phrase| cleaned.strip_suffix(*phrase))
        else {
            break;
        };
        cleaned = stripped.trim();
    }

    if let Some(idx) = cleaned.find(&DELIMITERS[..]) {
        cleaned = &cleaned[..idx];
    }

    cleaned.trim().to_string()
}

/// Clean an address candidate with the default sentinel.
pub fn clean_address(candidate: &str) -> String {
    AddressCleaner::default().clean(candidate)
}

/// Address extractor. Candidates shorter than `min_chars` characters (never
/// less than two) are skipped; accepted ones go through the cleaner.
pub struct AddressExtractor<'a> {
    patterns: &'a PatternSet,
    cleaner: AddressCleaner,
    min_chars: usize,
}

impl<'a> AddressExtractor<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            patterns: library.set(ParcelField::Address),
            cleaner: AddressCleaner::default(),
            min_chars: 2,
        }
    }

    pub fn with_cleaner(mut self, cleaner: AddressCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars.max(2);
        self
    }
}

impl Default for AddressExtractor<'static> {
    fn default() -> Self {
        Self::new(PatternLibrary::builtin())
    }
}

impl FieldExtractor for AddressExtractor<'_> {
    fn field(&self) -> ParcelField {
        ParcelField::Address
    }

    fn patterns(&self) -> &PatternSet {
        self.patterns
    }

    fn accept(&self, candidate: &str) -> Option<String> {
        if candidate.chars().count() < self.min_chars {
            return None;
        }
        Some(self.cleaner.clean(candidate))
    }
}

/// Extract an address from text with the built-in patterns.
pub fn extract_address(text: &str) -> Option<String> {
    AddressExtractor::default().extract(text)
}

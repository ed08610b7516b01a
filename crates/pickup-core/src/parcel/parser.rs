//! Pattern parser combining the three field extractors.

use serde::Serialize;
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::parcel::{ParcelField, ParseResult};

use super::fields::{
    AddressCleaner, AddressExtractor, CodeExtractor, FieldExtractor, PatternHit, PatternLibrary,
    StationExtractor,
};
use super::ParcelExtractor;

/// Result of [`PatternParser::explain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    /// Same value [`ParcelExtractor::extract`] returns.
    pub result: ParseResult,
    /// Every pattern that matched, grouped by field in extraction order.
    pub hits: Vec<PatternHit>,
}

/// Extractor backed by an ordered pattern library.
#[derive(Debug, Clone)]
pub struct PatternParser<'a> {
    library: &'a PatternLibrary,
    cleaner: AddressCleaner,
    min_address_chars: usize,
}

impl Default for PatternParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternParser<'static> {
    /// Create a parser over the built-in pattern library.
    pub fn new() -> Self {
        Self::with_library(PatternLibrary::builtin())
    }

    /// Create a parser configured from the extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_unknown_address(config.unknown_address.clone())
            .with_min_address_chars(config.min_address_chars)
    }
}

impl<'a> PatternParser<'a> {
    /// Create a parser over a caller-supplied library.
    pub fn with_library(library: &'a PatternLibrary) -> Self {
        Self {
            library,
            cleaner: AddressCleaner::default(),
            min_address_chars: 2,
        }
    }

    /// Set the value stored when an address cleans down to nothing.
    pub fn with_unknown_address(mut self, sentinel: impl Into<String>) -> Self {
        self.cleaner = AddressCleaner::new(sentinel);
        self
    }

    /// Set the minimum address candidate length, in characters.
    pub fn with_min_address_chars(mut self, min_chars: usize) -> Self {
        self.min_address_chars = min_chars;
        self
    }

    pub fn library(&self) -> &PatternLibrary {
        self.library
    }

    fn extractor(&self, field: ParcelField) -> Box<dyn FieldExtractor + '_> {
        match field {
            ParcelField::Code => Box::new(CodeExtractor::new(self.library)),
            ParcelField::Station => Box::new(StationExtractor::new(self.library)),
            ParcelField::Address => Box::new(
                AddressExtractor::new(self.library)
                    .with_cleaner(self.cleaner.clone())
                    .with_min_chars(self.min_address_chars),
            ),
        }
    }

    /// Extract like [`ParcelExtractor::extract`] and also report every
    /// pattern that matched along the way.
    pub fn explain(&self, text: &str) -> Explanation {
        let mut hits = Vec::new();
        for field in ParcelField::ALL {
            hits.extend(self.extractor(field).explain(text));
        }
        Explanation {
            result: self.extract(text),
            hits,
        }
    }
}

impl ParcelExtractor for PatternParser<'_> {
    fn extract(&self, text: &str) -> ParseResult {
        let mut result = ParseResult::default();
        for field in ParcelField::ALL {
            result.set(field, self.extractor(field).extract(text));
        }
        debug!(
            code = result.code.is_some(),
            station = result.station.is_some(),
            address = result.address.is_some(),
            "message parsed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parcel::UNKNOWN_ADDRESS;
    use crate::parcel::fields::{Pattern, PatternSet};
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "【菜鸟驿站】您的取件码为AB-1234，请到沃尔玛超市东门取件";

    #[test]
    fn test_end_to_end_sample() {
        let result = PatternParser::new().extract(SAMPLE);
        assert_eq!(result.station.as_deref(), Some("菜鸟驿站"));
        assert_eq!(result.code.as_deref(), Some("AB-1234"));
        assert_eq!(result.address.as_deref(), Some("沃尔玛超市东门"));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let parser = PatternParser::new();
        let texts = [SAMPLE, "取件码 7K2M9", "", "hello 123456789"];
        for text in texts {
            assert_eq!(parser.extract(text), parser.extract(text));
        }
    }

    #[test]
    fn test_labeled_code_beats_bare_run() {
        let result = PatternParser::new().extract("运单 YT88776655 已到，取货码 3-2-118");
        assert_eq!(result.code.as_deref(), Some("3-2-118"));
    }

    #[test]
    fn test_rejected_code_continues_with_next_pattern() {
        let result = PatternParser::new().extract("取件码：123456，凭 AB12 到店取件");
        assert_eq!(result.code.as_deref(), Some("AB12"));
    }

    #[test]
    fn test_phone_number_is_not_a_code() {
        let result = PatternParser::new().extract("有问题请联系13800001234");
        assert_eq!(result.code, None);
    }

    #[test]
    fn test_empty_text() {
        assert!(PatternParser::new().extract("").is_empty());
    }

    #[test]
    fn test_custom_sentinel() {
        let parser = PatternParser::new().with_unknown_address("unknown");
        let result = parser.extract("取件码 A123 地址：请您及时取件");
        assert_eq!(result.address.as_deref(), Some("unknown"));

        let default = PatternParser::new().extract("取件码 A123 地址：请您及时取件");
        assert_eq!(default.address.as_deref(), Some(UNKNOWN_ADDRESS));
    }

    #[test]
    fn test_from_config() {
        let config = ExtractionConfig {
            unknown_address: "?".to_string(),
            min_address_chars: 50,
        };
        let result = PatternParser::from_config(&config).extract(SAMPLE);
        assert_eq!(result.address, None);
        assert_eq!(result.code.as_deref(), Some("AB-1234"));
    }

    #[test]
    fn test_injected_library() {
        let code = PatternSet::new(vec![Pattern::new("hash", r"#(\d+)", Some(1)).unwrap()]);
        let library = PatternLibrary::from_sets(code, PatternSet::default(), PatternSet::default());
        let result = PatternParser::with_library(&library).extract("柜 #42 号");
        assert_eq!(result.code.as_deref(), Some("42"));
        assert_eq!(result.station, None);
        assert_eq!(result.address, None);
    }

    #[test]
    fn test_explain_reports_rejections() {
        let explanation = PatternParser::new().explain("取件码：123456，凭 AB12 到店取件");
        assert_eq!(explanation.result.code.as_deref(), Some("AB12"));

        let codes: Vec<_> = explanation
            .hits
            .iter()
            .filter(|h| h.field == ParcelField::Code)
            .collect();
        assert_eq!(codes[0].pattern, "pickup_code_label");
        assert_eq!(codes[0].candidate, "123456");
        assert_eq!(codes[0].accepted, None);
        assert_eq!(codes[1].pattern, "present_code_phrase");
        assert_eq!(codes[1].accepted.as_deref(), Some("AB12"));
    }
}

//! Core library for parcel pickup notifications.
//!
//! This crate provides:
//! - Built-in pattern extraction of pickup code, station and address
//! - Code validation and address cleanup heuristics
//! - User rules (prefix/suffix or regex) and their evaluation
//! - Keyword lexicons for message classification by callers
//!
//! Everything here is pure and synchronous: no file or network I/O.

pub mod error;
pub mod keywords;
pub mod models;
pub mod parcel;
pub mod rules;

pub use error::{PickupError, Result, RuleError};
pub use keywords::{KeywordCategory, KeywordHit, KeywordLexicon, KeywordScope};
pub use models::config::{ExtractionConfig, OutputConfig, PickupConfig, RulesConfig};
pub use models::parcel::{ParcelField, ParseResult, UNKNOWN_ADDRESS};
pub use models::rule::{
    FieldMatch, FieldRule, KeywordEntry, Rule, RuleBook, RuleEvalResult, RuleKind, RulePattern,
    RuleRecord,
};
pub use parcel::fields::{clean_address, is_valid_code, AddressCleaner, PatternHit, PatternLibrary};
pub use parcel::{Explanation, ParcelExtractor, PatternParser};
pub use rules::{evaluate, RuleMatch, RuleSet};

/// Extract pickup fields from `text` with the built-in patterns.
pub fn extract(text: &str) -> ParseResult {
    PatternParser::new().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_strategies_share_the_trait() {
        let text = "【丰巢】取件码 5521，请到柜机";
        let rules = RuleSet::new(vec![Rule::new("hive").with_field(
            ParcelField::Code,
            FieldRule::prefix_suffix("取件码", "，"),
        )]);

        let strategies: Vec<Box<dyn ParcelExtractor>> =
            vec![Box::new(PatternParser::new()), Box::new(rules)];
        for strategy in &strategies {
            assert_eq!(strategy.extract(text).code.as_deref(), Some("5521"));
        }
    }

    #[test]
    fn test_extract_free_function() {
        assert_eq!(extract("取件码 A123").code.as_deref(), Some("A123"));
    }

    #[test]
    fn test_shared_values_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternLibrary>();
        assert_send_sync::<KeywordLexicon>();
        assert_send_sync::<Rule>();
        assert_send_sync::<RuleSet>();
    }
}

//! WASM bindings for parcel pickup notification extraction.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use pickup_core::{
    ExtractionConfig, KeywordLexicon, ParcelExtractor, PatternParser, Rule, RuleBook, RuleRecord,
    RuleSet,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Extract code, station and address with the built-in patterns.
#[wasm_bindgen]
pub fn parse(text: &str) -> Result<JsValue, JsValue> {
    to_js(&pickup_core::extract(text))
}

/// Evaluate a single rule record against a sample message.
///
/// This is the check an administrator runs before enabling a rule. A
/// malformed record is reported as an error rather than a non-match.
#[wasm_bindgen]
pub fn evaluate_rule(rule: JsValue, text: &str) -> Result<JsValue, JsValue> {
    let record: RuleRecord = serde_wasm_bindgen::from_value(rule).map_err(js_error)?;
    let rule = Rule::try_from(record).map_err(js_error)?;
    to_js(&pickup_core::evaluate(&rule, text))
}

/// Check whether a candidate is acceptable as a pickup code.
#[wasm_bindgen]
pub fn is_valid_code(candidate: &str) -> bool {
    pickup_core::is_valid_code(candidate)
}

/// Clean an address candidate.
#[wasm_bindgen]
pub fn clean_address(candidate: &str) -> String {
    pickup_core::clean_address(candidate)
}

/// Keyword categories and keyword hits for a message.
#[wasm_bindgen]
pub fn keywords(text: &str, sender: Option<String>) -> Result<JsValue, JsValue> {
    #[derive(Serialize)]
    struct KeywordReport<'a> {
        categories: Vec<&'a str>,
        hits: Vec<pickup_core::KeywordHit<'a>>,
    }

    let lexicon = KeywordLexicon::builtin();
    let report = KeywordReport {
        categories: lexicon.matching_categories(text, sender.as_deref()),
        hits: lexicon.hits(text, sender.as_deref()),
    };
    to_js(&report)
}

/// Pickup extractor class for browser use.
///
/// User rules, when loaded, are tried before the built-in patterns.
#[wasm_bindgen]
pub struct PickupParser {
    extraction: ExtractionConfig,
    rules: Option<RuleSet>,
}

#[wasm_bindgen]
impl PickupParser {
    /// Create a parser using only the built-in patterns.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            rules: None,
        }
    }

    /// Set the value used when an address cleans down to nothing.
    #[wasm_bindgen]
    pub fn set_unknown_address(&mut self, sentinel: &str) {
        self.extraction.unknown_address = sentinel.to_string();
    }

    /// Load user rules from a rule book JSON document.
    #[wasm_bindgen]
    pub fn load_rules(&mut self, json: &str) -> Result<usize, JsValue> {
        let book = RuleBook::from_json(json).map_err(js_error)?;
        let rules = RuleSet::from_book(&book).map_err(js_error)?;
        let count = rules.len();
        self.rules = Some(rules);
        Ok(count)
    }

    /// Drop any loaded user rules.
    #[wasm_bindgen]
    pub fn clear_rules(&mut self) {
        self.rules = None;
    }

    /// Extract fields from a message.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        if let Some(m) = self.rules.as_ref().and_then(|rules| rules.first_match(text)) {
            return to_js(&m.into_parse_result());
        }
        to_js(&PatternParser::from_config(&self.extraction).extract(text))
    }

    /// Extract fields and list every built-in pattern that matched.
    #[wasm_bindgen]
    pub fn explain(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&PatternParser::from_config(&self.extraction).explain(text))
    }
}

impl Default for PickupParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_is_valid_code() {
        assert!(is_valid_code("A1"));
        assert!(!is_valid_code("13800001234"));
        assert!(!is_valid_code("2024-05-01"));
    }

    #[wasm_bindgen_test]
    fn test_clean_address() {
        assert_eq!(clean_address("沃尔玛超市东门取件"), "沃尔玛超市东门");
        assert_eq!(clean_address("请您"), pickup_core::UNKNOWN_ADDRESS);
    }

    #[wasm_bindgen_test]
    fn test_load_rules() {
        let mut parser = PickupParser::new();
        let count = parser
            .load_rules(r#"{"rules": [{"name": "hive", "codePrefix": "取件码"}]}"#)
            .unwrap();
        assert_eq!(count, 1);
        assert!(parser.load_rules(r#"{"rules": [{"name": ""}]}"#).is_err());
    }

    #[wasm_bindgen_test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

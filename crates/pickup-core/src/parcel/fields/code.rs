//! Pickup code extraction and validation.

use lazy_static::lazy_static;
use regex::Regex;

use super::patterns::{PatternLibrary, PatternSet};
use super::FieldExtractor;
use crate::models::parcel::ParcelField;

lazy_static! {
    static ref CODE_CHARS: Regex = Regex::new(r"^[A-Za-z0-9\-]+$").unwrap();

    // Numeric shapes that show up next to codes in the same message.
    static ref DATE_SHAPE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref TIME_SHAPE: Regex = Regex::new(r"^\d{1,2}:\d{2}$").unwrap();
    static ref PHONE_SHAPE: Regex = Regex::new(r"^\d{11}$").unwrap();
    static ref POSTAL_SHAPE: Regex = Regex::new(r"^\d{6}$").unwrap();
}

const MIN_CODE_LEN: usize = 2;
const MAX_CODE_LEN: usize = 20;

/// Pickup code extractor.
pub struct CodeExtractor<'a> {
    patterns: &'a PatternSet,
}

impl<'a> CodeExtractor<'a> {
    /// Create an extractor over the code patterns of `library`.
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            patterns: library.set(ParcelField::Code),
        }
    }
}

impl Default for CodeExtractor<'static> {
    fn default() -> Self {
        Self::new(PatternLibrary::builtin())
    }
}

impl FieldExtractor for CodeExtractor<'_> {
    fn field(&self) -> ParcelField {
        ParcelField::Code
    }

    fn patterns(&self) -> &PatternSet {
        self.patterns
    }

    fn accept(&self, candidate: &str) -> Option<String> {
        is_valid_code(candidate).then(|| candidate.to_string())
    }
}

/// Extract a pickup code from text with the built-in patterns.
pub fn extract_code(text: &str) -> Option<String> {
    CodeExtractor::default().extract(text)
}

/// Decide whether a matched candidate can be a pickup code.
///
/// A code is 2-20 ASCII letters, digits or dashes with at least one digit,
/// and is not a date, a clock time, a mobile number or a postal code.
pub fn is_valid_code(candidate: &str) -> bool {
    if candidate.is_empty() || !CODE_CHARS.is_match(candidate) {
        return false;
    }

    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&candidate.len()) {
        return false;
    }

    ![&*DATE_SHAPE, &*TIME_SHAPE, &*PHONE_SHAPE, &*POSTAL_SHAPE]
        .iter()
        .any(|shape| shape.is_match(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_code_accepts() {
        assert!(is_valid_code("A1"));
        assert!(is_valid_code("AB-1234"));
        assert!(is_valid_code("8-2-1031"));
        assert!(is_valid_code("12345")); // five digits is not a postal code
        assert!(is_valid_code("1234567")); // seven digits neither
    }

    #[test]
    fn test_is_valid_code_rejects() {
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("13800001234")); // phone
        assert!(!is_valid_code("2024-05-01")); // date
        assert!(!is_valid_code("100086")); // postal code
        assert!(!is_valid_code("ABCDEF")); // no digit
        assert!(!is_valid_code("1")); // too short
        assert!(!is_valid_code("A1234567890123456789Z")); // too long
        assert!(!is_valid_code("12:30")); // colon is not a code character
        assert!(!is_valid_code("取件1"));
    }

    #[test]
    fn test_extract_code_labeled() {
        assert_eq!(extract_code("您的取件码：5-3-2011，请尽快领取"), Some("5-3-2011".to_string()));
        assert_eq!(extract_code("取货码 A8K3"), Some("A8K3".to_string()));
        assert_eq!(extract_code("请凭 66-2-3001 到驿站取件"), Some("66-2-3001".to_string()));
    }

    #[test]
    fn test_labeled_marker_beats_bare_run() {
        let text = "订单 ZX98765432 已到站，取件码 7K2M9 请及时领取";
        assert_eq!(extract_code(text), Some("7K2M9".to_string()));
    }

    #[test]
    fn test_password_and_code_labels() {
        assert_eq!(extract_code("单号 AB-99887，开柜密码 4471"), Some("4471".to_string()));
        assert_eq!(extract_code("单号 AB-99887，提货代码 5521"), Some("5521".to_string()));
        // The password label is tried before the code label.
        assert_eq!(extract_code("代码 K7，密码 5521"), Some("5521".to_string()));
    }

    #[test]
    fn test_rejected_candidate_falls_through_to_next_pattern() {
        // The labeled candidate is a postal code; the dashed code wins instead.
        let text = "取件码100086，柜号 AB-5521";
        assert_eq!(extract_code(text), Some("AB-5521".to_string()));
    }

    #[test]
    fn test_all_candidates_rejected() {
        assert_eq!(extract_code("验证码 13800001234"), None);
        assert_eq!(extract_code("明天见"), None);
    }
}

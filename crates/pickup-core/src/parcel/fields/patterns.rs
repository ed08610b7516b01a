//! Built-in pattern library for pickup notifications.
//!
//! Each field has an ordered pattern set; earlier patterns encode more
//! specific message conventions and win over later ones. Word boundaries are
//! spelled as ASCII classes so that CJK text next to a code still counts as a
//! boundary.

use fancy_regex::Regex;
use lazy_static::lazy_static;
use serde::Serialize;
use tracing::warn;

use crate::error::{PickupError, Result};
use crate::models::parcel::ParcelField;

/// Source form of a library pattern.
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub name: &'static str,
    pub source: &'static str,
    /// Capture group holding the candidate; `None` takes the whole match.
    pub capture_group: Option<usize>,
}

const fn spec(
    name: &'static str,
    source: &'static str,
    capture_group: Option<usize>,
) -> PatternSpec {
    PatternSpec {
        name,
        source,
        capture_group,
    }
}

/// Pickup code patterns: labeled markers, then dashed codes, then bare runs.
pub const CODE_PATTERNS: &[PatternSpec] = &[
    spec("pickup_code_label", r"取件码[:：]?\s*([A-Z0-9\-]+)", Some(1)),
    spec("collection_code_label", r"取货码[:：]?\s*([A-Z0-9\-]+)", Some(1)),
    spec("verification_code_label", r"验证码[:：]?\s*([A-Z0-9\-]+)", Some(1)),
    spec("present_code_phrase", r"凭\s*([A-Z0-9\-]+)\s*(?:来|到|取)", Some(1)),
    spec("password_label", r"密码[:：]?\s*([A-Z0-9\-]+)", Some(1)),
    spec("code_label", r"代码[:：]?\s*([A-Z0-9\-]+)", Some(1)),
    spec(
        "dashed_code",
        r"(?<![A-Za-z0-9_])([A-Z0-9]{2,3}-[A-Z0-9]{4,})(?![A-Za-z0-9_])",
        Some(1),
    ),
    spec(
        "bare_code",
        r"(?<![A-Za-z0-9_])([A-Z0-9]{6,12})(?![A-Za-z0-9_])",
        Some(1),
    ),
];

/// Station patterns: bracketed sender tags, known carriers, generic suffixes.
pub const STATION_PATTERNS: &[PatternSpec] = &[
    spec("cjk_bracket_tag", r"【([^】]+)】", Some(1)),
    spec("ascii_bracket_tag", r"\[([^\]]+)\]", Some(1)),
    spec(
        "known_carrier",
        r"(菜鸟驿站|妈妈驿站|快递驿站|代收点|圆通快递|申通快递|极兔速递|兔喜生活|袋鼠智柜|韵达超市|快递超市|菜鸟|顺丰|中通|EMS|京东)",
        Some(1),
    ),
    spec(
        "station_suffix",
        r"(\S+(?:驿站|快递|代收点|服务站|自提点|营业部|超市|门店))",
        Some(1),
    ),
];

/// Address patterns: explicit label, road suffix, bounded generic, fallback.
pub const ADDRESS_PATTERNS: &[PatternSpec] = &[
    spec("address_label", r"(地址|到|位于|位置)[:：]?\s*([^，。\[\]【】]+)", Some(2)),
    spec(
        "road_suffix",
        r"([^，。]+(?:路|街|巷|村|镇|区|市|县|乡|十字|政府|小区|门店|店|部|超市|驿站|塔)[^，。]*)",
        Some(1),
    ),
    spec(
        "bounded_generic",
        r"((?:[^，。]*?(?:镇|街道|路|街|巷|村|区|市|县|乡|十字|政府|小区|门店|店|部|超市|驿站|塔)[^，。]*?)+?)\s*(?=凭|取件码|取货码|,|，|$)",
        Some(1),
    ),
    spec(
        "road_char_fallback",
        r"([^，。]*?[路街巷村镇区市县乡十字政府小区门店店部超市驿站塔][^，。]*)",
        Some(1),
    ),
];

lazy_static! {
    static ref BUILTIN_LIBRARY: PatternLibrary =
        PatternLibrary::new().expect("built-in pickup patterns compile");
}

/// A compiled pattern plus the capture group that holds its candidate.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    regex: Regex,
    capture_group: Option<usize>,
}

/// The trimmed candidate a pattern produced, with its byte span in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Pattern {
    pub fn new(
        name: impl Into<String>,
        source: &str,
        capture_group: Option<usize>,
    ) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(source).map_err(|e| PickupError::Pattern {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name,
            regex,
            capture_group,
        })
    }

    pub fn from_spec(spec: &PatternSpec) -> Result<Self> {
        Self::new(spec.name, spec.source, spec.capture_group)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capture_group(&self) -> Option<usize> {
        self.capture_group
    }

    /// First match in `text`, reduced to the trimmed candidate.
    ///
    /// A runtime matching failure (backtracking limit) counts as no match.
    pub fn find(&self, text: &str) -> Option<PatternMatch> {
        let caps = match self.regex.captures(text) {
            Ok(caps) => caps?,
            Err(e) => {
                warn!(pattern = %self.name, error = %e, "pattern evaluation failed");
                return None;
            }
        };
        let m = caps.get(self.capture_group.unwrap_or(0))?;
        let raw = m.as_str();
        let value = raw.trim();
        let start = m.start() + (raw.len() - raw.trim_start().len());
        Some(PatternMatch {
            value: value.to_string(),
            start,
            end: start + value.len(),
        })
    }
}

/// Ordered, immutable patterns for one field.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self> {
        specs
            .iter()
            .map(Pattern::from_spec)
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Pattern sets for all three fields.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    code: PatternSet,
    station: PatternSet,
    address: PatternSet,
}

impl PatternLibrary {
    /// Compile the built-in patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            code: PatternSet::from_specs(CODE_PATTERNS)?,
            station: PatternSet::from_specs(STATION_PATTERNS)?,
            address: PatternSet::from_specs(ADDRESS_PATTERNS)?,
        })
    }

    /// The built-in library, compiled once per process.
    pub fn builtin() -> &'static PatternLibrary {
        &BUILTIN_LIBRARY
    }

    pub fn from_sets(code: PatternSet, station: PatternSet, address: PatternSet) -> Self {
        Self {
            code,
            station,
            address,
        }
    }

    pub fn set(&self, field: ParcelField) -> &PatternSet {
        match field {
            ParcelField::Code => &self.code,
            ParcelField::Station => &self.station,
            ParcelField::Address => &self.address,
        }
    }
}

/// A pattern that matched while extracting a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternHit {
    pub field: ParcelField,
    pub pattern: String,
    /// Trimmed candidate before validation/cleanup.
    pub candidate: String,
    /// Final value when the candidate was accepted.
    pub accepted: Option<String>,
    /// Byte span of the trimmed candidate in the input.
    pub position: (usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_library_compiles() {
        let library = PatternLibrary::new().unwrap();
        assert_eq!(library.set(ParcelField::Code).len(), CODE_PATTERNS.len());
        assert_eq!(library.set(ParcelField::Station).len(), STATION_PATTERNS.len());
        assert_eq!(library.set(ParcelField::Address).len(), ADDRESS_PATTERNS.len());
    }

    #[test]
    fn test_capture_group_policy() {
        let whole = Pattern::new("whole", r"\d+号", None).unwrap();
        assert_eq!(whole.find("3号柜").unwrap().value, "3号");

        let second = Pattern::new("second", r"(地址)[:：]\s*(\S+)", Some(2)).unwrap();
        let m = second.find("地址： 幸福路8号").unwrap();
        assert_eq!(m.value, "幸福路8号");
        assert_eq!(&"地址： 幸福路8号"[m.start..m.end], "幸福路8号");
    }

    #[test]
    fn test_span_covers_trimmed_value() {
        let padded = Pattern::new("padded", r"码(\s*\S+\s*)取", Some(1)).unwrap();
        let text = "取件码  A12 取件";
        let m = padded.find(text).unwrap();
        assert_eq!(m.value, "A12");
        assert_eq!(&text[m.start..m.end], "A12");
    }

    #[test]
    fn test_ascii_boundaries_accept_cjk_neighbours() {
        let dashed = Pattern::from_spec(&CODE_PATTERNS[6]).unwrap();
        assert_eq!(dashed.find("码为AB-1234，").unwrap().value, "AB-1234");
        assert!(dashed.find("xAB-1234").is_none());
    }

    #[test]
    fn test_invalid_pattern_reports_name() {
        let err = Pattern::new("broken", "(", None).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}

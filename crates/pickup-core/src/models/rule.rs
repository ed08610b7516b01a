//! User-authored extraction rules and their evaluation results.
//!
//! A [`Rule`] is the compiled, validated form. [`RuleRecord`] is the flat
//! record exchanged with the admin tool, and [`RuleBook`] is the exported
//! document holding many records plus user keywords.

use std::borrow::Cow;

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PickupError, Result, RuleError};
use crate::keywords::{KeywordCategory, KeywordScope};

use super::parcel::{ParcelField, ParseResult};

/// Rule-kind discriminator used by rule records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// Prefix/suffix boundaries per field.
    #[default]
    #[serde(rename = "custom", alias = "prefix_suffix", alias = "prefixSuffix")]
    PrefixSuffix,
    /// A regular expression per field.
    #[serde(rename = "regex")]
    Regex,
}

/// Characters that may wrap a stored pattern, as in `/取件码(\d+)/u`.
const PATTERN_DELIMITERS: &[char] = &['/', '#', '~', '%', '@', '!'];

/// Trailing flags understood after a closing delimiter.
const PATTERN_FLAGS: &str = "imsxu";

/// Unwrap a delimited pattern (`/body/flags`) into plain regex syntax.
///
/// Flags `i`, `m`, `s` and `x` become an inline group; `u` is dropped since
/// matching is always Unicode-aware. Anything else is returned unchanged.
fn strip_delimiters(source: &str) -> Cow<'_, str> {
    let Some(open) = source
        .chars()
        .next()
        .filter(|c| PATTERN_DELIMITERS.contains(c))
    else {
        return Cow::Borrowed(source);
    };
    let rest = &source[open.len_utf8()..];
    let Some(close) = rest.rfind(open) else {
        return Cow::Borrowed(source);
    };
    let flags = &rest[close + open.len_utf8()..];
    if !flags.chars().all(|c| PATTERN_FLAGS.contains(c)) {
        return Cow::Borrowed(source);
    }

    let body = if open == '/' {
        rest[..close].replace(r"\/", "/")
    } else {
        rest[..close].to_string()
    };
    let inline: String = flags.chars().filter(|c| *c != 'u').collect();
    if inline.is_empty() {
        Cow::Owned(body)
    } else {
        Cow::Owned(format!("(?{inline}){body}"))
    }
}

/// A user regex, compiled when the rule is built.
///
/// The source is kept as written; delimiters and trailing flags are only
/// unwrapped for compilation.
#[derive(Debug, Clone)]
pub struct RulePattern {
    source: String,
    regex: Regex,
}

impl RulePattern {
    /// Compile a user pattern for `field`.
    pub fn compile(field: ParcelField, source: &str) -> std::result::Result<Self, RuleError> {
        let regex = Regex::new(&strip_delimiters(source)).map_err(|e| RuleError::InvalidPattern {
            field,
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for RulePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RulePattern {}

/// How a rule locates one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Match a regex; the first capture group (or whole match) is the value.
    Regex(RulePattern),
    /// Take the text between the first `prefix` and the following `suffix`.
    /// Both empty matches trivially and yields the whole text.
    PrefixSuffix { prefix: String, suffix: String },
}

impl FieldRule {
    pub fn prefix_suffix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        FieldRule::PrefixSuffix {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn regex(field: ParcelField, pattern: &str) -> std::result::Result<Self, RuleError> {
        RulePattern::compile(field, pattern).map(FieldRule::Regex)
    }

    /// Trivial rule: empty prefix and suffix.
    pub fn trivial() -> Self {
        Self::prefix_suffix("", "")
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            FieldRule::Regex(_) => RuleKind::Regex,
            FieldRule::PrefixSuffix { .. } => RuleKind::PrefixSuffix,
        }
    }

    /// Empty prefix and suffix: matches anything and locates nothing.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self,
            FieldRule::PrefixSuffix { prefix, suffix } if prefix.is_empty() && suffix.is_empty()
        )
    }
}

impl Default for FieldRule {
    fn default() -> Self {
        Self::trivial()
    }
}

/// A validated user rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub enabled: bool,
    pub description: Option<String>,
    pub station: FieldRule,
    pub code: FieldRule,
    pub address: FieldRule,
}

impl Rule {
    /// Create an enabled rule whose fields all match trivially.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            description: None,
            station: FieldRule::trivial(),
            code: FieldRule::trivial(),
            address: FieldRule::trivial(),
        }
    }

    /// Replace the spec for one field.
    pub fn with_field(mut self, field: ParcelField, spec: FieldRule) -> Self {
        match field {
            ParcelField::Code => self.code = spec,
            ParcelField::Station => self.station = spec,
            ParcelField::Address => self.address = spec,
        }
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Spec for one field.
    pub fn field(&self, field: ParcelField) -> &FieldRule {
        match field {
            ParcelField::Code => &self.code,
            ParcelField::Station => &self.station,
            ParcelField::Address => &self.address,
        }
    }

    /// Regex when any field is regex-driven.
    pub fn kind(&self) -> RuleKind {
        if ParcelField::ALL
            .iter()
            .any(|f| self.field(*f).kind() == RuleKind::Regex)
        {
            RuleKind::Regex
        } else {
            RuleKind::PrefixSuffix
        }
    }

    /// Build the exchange record for this rule.
    pub fn to_record(&self) -> RuleRecord {
        let mut record = RuleRecord {
            name: self.name.clone(),
            enabled: self.enabled,
            kind: Some(self.kind()),
            description: self.description.clone(),
            ..RuleRecord::default()
        };
        for field in ParcelField::ALL {
            match self.field(field) {
                FieldRule::Regex(pattern) => {
                    *record.pattern_mut(field) = Some(pattern.as_str().to_string());
                }
                FieldRule::PrefixSuffix { prefix, suffix } => {
                    let (p, s) = record.boundaries_mut(field);
                    *p = prefix.clone();
                    *s = suffix.clone();
                }
            }
        }
        record
    }
}

impl TryFrom<RuleRecord> for Rule {
    type Error = RuleError;

    fn try_from(record: RuleRecord) -> std::result::Result<Self, Self::Error> {
        Rule::try_from(&record)
    }
}

impl TryFrom<&RuleRecord> for Rule {
    type Error = RuleError;

    fn try_from(record: &RuleRecord) -> std::result::Result<Self, Self::Error> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(RuleError::EmptyName);
        }

        let mut rule = Rule::new(name).with_enabled(record.enabled);
        rule.description = record.description.clone();

        let kind = record.kind();
        let mut any_pattern = false;
        for field in ParcelField::ALL {
            let (prefix, suffix) = record.boundaries(field);
            let pattern = match kind {
                RuleKind::Regex => record.pattern(field).filter(|p| !p.is_empty()),
                RuleKind::PrefixSuffix => None,
            };
            let spec = match pattern {
                Some(pattern) => {
                    any_pattern = true;
                    FieldRule::regex(field, pattern)?
                }
                None => FieldRule::prefix_suffix(prefix, suffix),
            };
            rule = rule.with_field(field, spec);
        }

        if kind == RuleKind::Regex && !any_pattern {
            return Err(RuleError::NoPatterns);
        }

        Ok(rule)
    }
}

fn default_enabled() -> bool {
    true
}

/// Flat rule record as exchanged with the admin tool.
///
/// The station field is called "tag" on the wire. Snake-case and
/// `station*` spellings from older exports are accepted, and a bare
/// `pattern` is read as the code pattern. Without an explicit kind, a
/// record carrying any pattern is a regex rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub name: String,

    #[serde(default = "default_enabled", alias = "isActive", alias = "is_active")]
    pub enabled: bool,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "ruleType",
        alias = "rule_type"
    )]
    pub kind: Option<RuleKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, alias = "stationPrefix", alias = "station_prefix", alias = "tag_prefix")]
    pub tag_prefix: String,
    #[serde(default, alias = "stationSuffix", alias = "station_suffix", alias = "tag_suffix")]
    pub tag_suffix: String,
    #[serde(default, alias = "code_prefix")]
    pub code_prefix: String,
    #[serde(default, alias = "code_suffix")]
    pub code_suffix: String,
    #[serde(default, alias = "address_prefix")]
    pub address_prefix: String,
    #[serde(default, alias = "address_suffix")]
    pub address_suffix: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "stationPattern",
        alias = "station_pattern",
        alias = "tag_pattern"
    )]
    pub tag_pattern: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "code_pattern",
        alias = "pattern"
    )]
    pub code_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "address_pattern")]
    pub address_pattern: Option<String>,
}

impl Default for RuleRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            kind: None,
            description: None,
            tag_prefix: String::new(),
            tag_suffix: String::new(),
            code_prefix: String::new(),
            code_suffix: String::new(),
            address_prefix: String::new(),
            address_suffix: String::new(),
            tag_pattern: None,
            code_pattern: None,
            address_pattern: None,
        }
    }
}

impl RuleRecord {
    /// Declared kind, or regex when the record carries a non-empty pattern.
    pub fn kind(&self) -> RuleKind {
        self.kind.unwrap_or_else(|| {
            let has_pattern = ParcelField::ALL
                .iter()
                .any(|f| self.pattern(*f).is_some_and(|p| !p.is_empty()));
            if has_pattern {
                RuleKind::Regex
            } else {
                RuleKind::PrefixSuffix
            }
        })
    }

    fn boundaries(&self, field: ParcelField) -> (&str, &str) {
        match field {
            ParcelField::Code => (&self.code_prefix, &self.code_suffix),
            ParcelField::Station => (&self.tag_prefix, &self.tag_suffix),
            ParcelField::Address => (&self.address_prefix, &self.address_suffix),
        }
    }

    fn boundaries_mut(&mut self, field: ParcelField) -> (&mut String, &mut String) {
        match field {
            ParcelField::Code => (&mut self.code_prefix, &mut self.code_suffix),
            ParcelField::Station => (&mut self.tag_prefix, &mut self.tag_suffix),
            ParcelField::Address => (&mut self.address_prefix, &mut self.address_suffix),
        }
    }

    fn pattern(&self, field: ParcelField) -> Option<&str> {
        match field {
            ParcelField::Code => self.code_pattern.as_deref(),
            ParcelField::Station => self.tag_pattern.as_deref(),
            ParcelField::Address => self.address_pattern.as_deref(),
        }
    }

    fn pattern_mut(&mut self, field: ParcelField) -> &mut Option<String> {
        match field {
            ParcelField::Code => &mut self.code_pattern,
            ParcelField::Station => &mut self.tag_pattern,
            ParcelField::Address => &mut self.address_pattern,
        }
    }
}

/// Outcome of evaluating one field of a rule.
///
/// `extracted` is present exactly when the field matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    matched: bool,
    extracted: Option<String>,
}

impl FieldMatch {
    pub fn hit(extracted: impl Into<String>) -> Self {
        Self {
            matched: true,
            extracted: Some(extracted.into()),
        }
    }

    pub fn miss() -> Self {
        Self::default()
    }

    pub fn matched(&self) -> bool {
        self.matched
    }

    pub fn extracted(&self) -> Option<&str> {
        self.extracted.as_deref()
    }

    pub fn into_extracted(self) -> Option<String> {
        self.extracted
    }
}

/// Per-field result of evaluating a rule against one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleEvalResult {
    pub code: FieldMatch,
    pub station: FieldMatch,
    pub address: FieldMatch,
}

impl RuleEvalResult {
    pub fn get(&self, field: ParcelField) -> &FieldMatch {
        match field {
            ParcelField::Code => &self.code,
            ParcelField::Station => &self.station,
            ParcelField::Address => &self.address,
        }
    }

    pub(crate) fn set(&mut self, field: ParcelField, value: FieldMatch) {
        match field {
            ParcelField::Code => self.code = value,
            ParcelField::Station => self.station = value,
            ParcelField::Address => self.address = value,
        }
    }

    /// Convert to the shared result shape. Matched-but-blank values are dropped.
    pub fn into_parse_result(self) -> ParseResult {
        let keep = |m: FieldMatch| m.into_extracted().filter(|v| !v.is_empty());
        ParseResult {
            code: keep(self.code),
            station: keep(self.station),
            address: keep(self.address),
        }
    }
}

/// A user keyword as exported by the admin tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,

    #[serde(rename = "type", default)]
    pub scope: KeywordScope,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_enabled", alias = "isActive", alias = "is_active")]
    pub active: bool,
}

/// The rule/keyword document exported by the admin tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub rules: Vec<RuleRecord>,

    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,
}

impl RuleBook {
    /// Parse a rule book from JSON. Rules are not validated yet.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compile every rule, failing on the first malformed one.
    pub fn compile(&self) -> Result<Vec<Rule>> {
        self.rules
            .iter()
            .map(|record| {
                Rule::try_from(record).map_err(|e| {
                    PickupError::Rule(RuleError::InRule {
                        name: record.name.clone(),
                        source: Box::new(e),
                    })
                })
            })
            .collect()
    }

    /// Report every malformed rule, tagged with its name.
    pub fn validate(&self) -> Vec<RuleError> {
        self.rules
            .iter()
            .filter_map(|record| {
                Rule::try_from(record).err().map(|e| RuleError::InRule {
                    name: record.name.clone(),
                    source: Box::new(e),
                })
            })
            .collect()
    }

    /// Active user keywords as lexicon categories, one per scope.
    pub fn keyword_categories(&self) -> Vec<KeywordCategory> {
        [
            (KeywordScope::Content, "custom_content"),
            (KeywordScope::Sender, "custom_sender"),
        ]
        .into_iter()
        .filter_map(|(scope, name)| {
            let keywords: Vec<&str> = self
                .keywords
                .iter()
                .filter(|k| k.active && k.scope == scope && !k.keyword.trim().is_empty())
                .map(|k| k.keyword.trim())
                .collect();
            (!keywords.is_empty()).then(|| KeywordCategory::new(name, scope, keywords))
        })
        .collect()
    }
}

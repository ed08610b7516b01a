//! User-rule extraction strategy.

pub mod evaluator;

pub use evaluator::{evaluate, evaluate_field, match_prefix_suffix, match_regex};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::parcel::{ParcelField, ParseResult};
use crate::models::rule::{FieldMatch, Rule, RuleBook, RuleEvalResult};
use crate::parcel::ParcelExtractor;

/// The rule that produced a result, with its per-field outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub rule: &'a Rule,
    pub result: RuleEvalResult,
}

impl RuleMatch<'_> {
    /// Fields the rule located. Trivial field specs echo the whole message,
    /// so their values are left out.
    pub fn into_parse_result(self) -> ParseResult {
        let mut result = self.result;
        for field in ParcelField::ALL {
            if self.rule.field(field).is_trivial() {
                result.set(field, FieldMatch::miss());
            }
        }
        result.into_parse_result()
    }
}

/// An ordered list of compiled user rules.
///
/// Rules are tried in order; the first one whose code field yields a
/// non-blank value wins. Rules with a trivial code spec never apply.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    include_disabled: bool,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            include_disabled: false,
        }
    }

    /// Compile every rule in a rule book.
    pub fn from_book(book: &RuleBook) -> Result<Self> {
        let rules = book.compile()?;
        for rule in rules.iter().filter(|r| r.code.is_trivial()) {
            warn!(rule = %rule.name, "rule has no code boundaries and will never apply");
        }
        info!(count = rules.len(), "loaded user rules");
        Ok(Self::new(rules))
    }

    /// Also evaluate rules that are switched off.
    pub fn with_disabled(mut self, include_disabled: bool) -> Self {
        self.include_disabled = include_disabled;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn active(&self) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .filter(move |r| self.include_disabled || r.enabled)
    }

    /// First rule that locates a code in `text`.
    pub fn first_match(&self, text: &str) -> Option<RuleMatch<'_>> {
        self.active()
            .filter(|rule| !rule.code.is_trivial())
            .find_map(|rule| {
                let result = evaluate(rule, text);
                let has_code = result
                    .code
                    .extracted()
                    .is_some_and(|code| !code.trim().is_empty());
                if has_code {
                    debug!(rule = %rule.name, "user rule matched");
                    Some(RuleMatch { rule, result })
                } else {
                    None
                }
            })
    }
}

impl ParcelExtractor for RuleSet {
    fn extract(&self, text: &str) -> ParseResult {
        self.first_match(text)
            .map(RuleMatch::into_parse_result)
            .unwrap_or_default()
    }
}

//! Evaluation of user rules against a message.
//!
//! Evaluation never fails: a boundary that cannot be located, a regex that
//! does not match, and a regex that errors at runtime all produce a miss.

use tracing::{trace, warn};

use crate::models::parcel::ParcelField;
use crate::models::rule::{FieldMatch, FieldRule, Rule, RuleEvalResult, RulePattern};

/// Evaluate every field of `rule` against `text`.
pub fn evaluate(rule: &Rule, text: &str) -> RuleEvalResult {
    let mut result = RuleEvalResult::default();
    for field in ParcelField::ALL {
        let outcome = evaluate_field(rule.field(field), text);
        trace!(rule = %rule.name, %field, matched = outcome.matched(), "rule field evaluated");
        result.set(field, outcome);
    }
    result
}

/// Evaluate a single field spec against `text`.
pub fn evaluate_field(spec: &FieldRule, text: &str) -> FieldMatch {
    match spec {
        FieldRule::Regex(pattern) => match_regex(pattern, text),
        FieldRule::PrefixSuffix { prefix, suffix } => match_prefix_suffix(prefix, suffix, text),
    }
}

/// First capture group when it took part in the match, otherwise the whole
/// match. The value is returned untrimmed.
pub fn match_regex(pattern: &RulePattern, text: &str) -> FieldMatch {
    let caps = match pattern.regex().captures(text) {
        Ok(Some(caps)) => caps,
        Ok(None) => return FieldMatch::miss(),
        Err(e) => {
            warn!(pattern = pattern.as_str(), error = %e, "rule pattern evaluation failed");
            return FieldMatch::miss();
        }
    };

    match caps.get(1).or_else(|| caps.get(0)) {
        Some(m) => FieldMatch::hit(m.as_str()),
        None => FieldMatch::miss(),
    }
}

/// Text between the first `prefix` and the first `suffix` after it, trimmed.
///
/// Both boundaries empty matches trivially and returns `text` unchanged.
pub fn match_prefix_suffix(prefix: &str, suffix: &str, text: &str) -> FieldMatch {
    if prefix.is_empty() && suffix.is_empty() {
        return FieldMatch::hit(text);
    }

    let mut working = text;

    if !prefix.is_empty() {
        match working.split_once(prefix) {
            Some((_, after)) => working = after,
            None => return FieldMatch::miss(),
        }
    }

    if !suffix.is_empty() {
        match working.split_once(suffix) {
            Some((before, _)) => working = before,
            None => return FieldMatch::miss(),
        }
    }

    FieldMatch::hit(working.trim())
}

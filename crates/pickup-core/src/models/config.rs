//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PickupError, Result};

use super::parcel::UNKNOWN_ADDRESS;

/// Main configuration for pickup extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// Built-in extractor configuration.
    pub extraction: ExtractionConfig,

    /// User rule configuration.
    pub rules: RulesConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Built-in pattern extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Value stored when an address cleans down to nothing.
    pub unknown_address: String,

    /// Minimum address candidate length, in characters.
    pub min_address_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            unknown_address: UNKNOWN_ADDRESS.to_string(),
            min_address_chars: 2,
        }
    }
}

/// User rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule book exported by the admin tool (`rules_data.json`).
    pub rules_file: Option<PathBuf>,

    /// Evaluate disabled rules as well.
    pub include_disabled: bool,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty_json: true }
    }
}

impl PickupConfig {
    /// Parse configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.unknown_address.trim().is_empty() {
            return Err(PickupError::Config(
                "extraction.unknown_address must not be blank".to_string(),
            ));
        }
        if self.extraction.min_address_chars < 2 {
            return Err(PickupError::Config(
                "extraction.min_address_chars must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PickupConfig::from_json(r#"{"rules": {"include_disabled": true}}"#).unwrap();
        assert!(config.rules.include_disabled);
        assert_eq!(config.extraction.unknown_address, UNKNOWN_ADDRESS);
        assert_eq!(config.extraction.min_address_chars, 2);
        assert!(config.output.pretty_json);
    }

    #[test]
    fn test_blank_sentinel_rejected() {
        let err = PickupConfig::from_json(r#"{"extraction": {"unknown_address": "  "}}"#);
        assert!(matches!(err, Err(PickupError::Config(_))));
    }

    #[test]
    fn test_single_char_address_threshold_rejected() {
        for value in [0, 1] {
            let json = format!(r#"{{"extraction": {{"min_address_chars": {value}}}}}"#);
            assert!(matches!(
                PickupConfig::from_json(&json),
                Err(PickupError::Config(_))
            ));
        }
        assert!(PickupConfig::from_json(r#"{"extraction": {"min_address_chars": 2}}"#).is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = PickupConfig::default();
        let json = config.to_json_pretty().unwrap();
        let back = PickupConfig::from_json(&json).unwrap();
        assert_eq!(back.extraction.min_address_chars, config.extraction.min_address_chars);
    }
}

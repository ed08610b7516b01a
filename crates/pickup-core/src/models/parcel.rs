//! Parcel notification data model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel stored when an address candidate cleans down to nothing.
pub const UNKNOWN_ADDRESS: &str = "地址未知";

/// The three fields extracted from a pickup notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParcelField {
    /// Pickup code.
    Code,
    /// Collection station name. Called "tag" in rule records.
    Station,
    /// Delivery address.
    Address,
}

impl ParcelField {
    /// All fields, in extraction order.
    pub const ALL: [ParcelField; 3] = [
        ParcelField::Code,
        ParcelField::Station,
        ParcelField::Address,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParcelField::Code => "code",
            ParcelField::Station => "station",
            ParcelField::Address => "address",
        }
    }
}

impl fmt::Display for ParcelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields extracted from one message.
///
/// A field is either an accepted extraction or absent; it is never an empty
/// or unvalidated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ParseResult {
    /// Value of a single field.
    pub fn get(&self, field: ParcelField) -> Option<&str> {
        match field {
            ParcelField::Code => self.code.as_deref(),
            ParcelField::Station => self.station.as_deref(),
            ParcelField::Address => self.address.as_deref(),
        }
    }

    pub(crate) fn set(&mut self, field: ParcelField, value: Option<String>) {
        match field {
            ParcelField::Code => self.code = value,
            ParcelField::Station => self.station = value,
            ParcelField::Address => self.address = value,
        }
    }

    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.station.is_none() && self.address.is_none()
    }

    /// True when the address is the "address unknown" sentinel.
    pub fn has_unknown_address(&self) -> bool {
        self.address.as_deref() == Some(UNKNOWN_ADDRESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let result = ParseResult {
            code: Some("A1".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"code":"A1"}"#);
    }

    #[test]
    fn test_get_and_set() {
        let mut result = ParseResult::default();
        assert!(result.is_empty());

        result.set(ParcelField::Station, Some("菜鸟驿站".to_string()));
        assert_eq!(result.get(ParcelField::Station), Some("菜鸟驿站"));
        assert_eq!(result.get(ParcelField::Code), None);
        assert!(!result.is_empty());
    }
}

//! Built-in pattern extraction for pickup notifications.

pub mod fields;
mod parser;

pub use parser::{Explanation, PatternParser};

use crate::models::parcel::ParseResult;

/// Trait for whole-message extraction strategies.
///
/// Implemented by the built-in [`PatternParser`] and by user rule sets, so
/// callers can swap one for the other.
pub trait ParcelExtractor {
    /// Extract code, station and address from a message. Never fails; a
    /// field without an accepted candidate is absent.
    fn extract(&self, text: &str) -> ParseResult;
}

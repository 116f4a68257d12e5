//! Opaque product identifiers.
//!
//! Catalog rows identify products by whatever the spreadsheet or feed holds:
//! numeric post ids, SKUs, slugs. Older stored carts even kept them as JSON
//! numbers. [`ProductId`] normalizes all of these to a trimmed, non-empty string.

use core::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scalar::scalar_to_string;

/// A stable, opaque product identifier.
///
/// ## Examples
///
/// ```
/// use fusion_core::ProductId;
///
/// assert_eq!(ProductId::parse(" p1 ").unwrap().as_str(), "p1");
/// assert!(ProductId::parse("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Parse a product id, returning `None` for blank input.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Build an id from a JSON string or number.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        scalar_to_string(value).and_then(|s| Self::parse(&s))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| de::Error::custom("product id must be a non-empty string or number"))
    }
}

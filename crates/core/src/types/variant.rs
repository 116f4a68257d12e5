//! Variant selections and the identity keys derived from them.
//!
//! A product offered in several colors and sizes becomes a distinct line item
//! for every combination the shopper picks. The combination is canonicalized
//! into a [`VariantSignature`] so that `{size: M, color: red}` and
//! `{color: red, size: M}` land on the same line.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::ProductId;
use super::scalar::scalar_to_string;

/// Signature used for a product bought without any variant selection.
pub const DEFAULT_SIGNATURE: &str = "default";

/// Separator between the product id and signature in an [`ItemKey`].
const KEY_SEPARATOR: &str = "::";

// =============================================================================
// VariantSelection
// =============================================================================

/// The value chosen for each variant dimension (e.g. `color` → `red`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VariantSelection(BTreeMap<String, String>);

impl VariantSelection {
    /// An empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace the value for a dimension.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set the value for a dimension. Blank names are ignored.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let name = name.trim();
        if !name.is_empty() {
            self.0.insert(name.to_string(), value.into());
        }
    }

    /// The selected value for a dimension.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether no dimension is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical signature of this selection.
    #[must_use]
    pub fn signature(&self) -> VariantSignature {
        VariantSignature::from_selection(self)
    }

    /// Human-readable label, e.g. `color: red, size: M`.
    #[must_use]
    pub fn label(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariantSelection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut selection = Self::new();
        for (k, v) in iter {
            selection.insert(k, v);
        }
        selection
    }
}

impl<'de> Deserialize<'de> for VariantSelection {
    /// Accepts `null`, an object of scalars, or anything else (treated as empty).
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let Value::Object(map) = value else {
            return Ok(Self::new());
        };

        Ok(map
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k.clone(), v)))
            .collect())
    }
}

// =============================================================================
// VariantOptions
// =============================================================================

/// The values a product offers for each variant dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariantOptions(BTreeMap<String, Vec<String>>);

impl VariantOptions {
    /// No options.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Append an option value for a dimension, skipping duplicates.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let values = self.0.entry(name.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Offered values for a dimension.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.0.get(name).map_or(&[][..], Vec::as_slice)
    }

    /// Whether the product has no variant dimensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over dimensions and their offered values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// A selection using the first offered value of every dimension.
    #[must_use]
    pub fn first_choices(&self) -> VariantSelection {
        self.0
            .iter()
            .filter_map(|(k, v)| v.first().map(|first| (k.clone(), first.clone())))
            .collect()
    }

    /// Whether `selection` only picks offered values of known dimensions.
    #[must_use]
    pub fn allows(&self, selection: &VariantSelection) -> bool {
        selection
            .iter()
            .all(|(name, value)| self.values(name).iter().any(|v| v == value))
    }
}

impl<'de> Deserialize<'de> for VariantOptions {
    /// Accepts an object whose values are arrays of scalars or single scalars.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let mut options = Self::new();
        let Value::Object(map) = value else {
            return Ok(options);
        };

        for (name, values) in &map {
            match values {
                Value::Array(items) => {
                    for item in items.iter().filter_map(scalar_to_string) {
                        options.push(name.clone(), item);
                    }
                }
                other => {
                    if let Some(item) = scalar_to_string(other) {
                        options.push(name.clone(), item);
                    }
                }
            }
        }
        Ok(options)
    }
}

// =============================================================================
// VariantSignature
// =============================================================================

/// Canonical string form of a [`VariantSelection`].
///
/// Dimension names are sorted and rendered as `name:value` pairs joined by
/// `|`. Backslashes, `|` and `:` inside names, and backslashes and `|` inside
/// values, are escaped with a backslash so distinct selections never collide.
/// The empty selection is `default`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantSignature(String);

impl VariantSignature {
    /// Signature for a selection.
    #[must_use]
    pub fn from_selection(selection: &VariantSelection) -> Self {
        if selection.is_empty() {
            return Self::default();
        }

        let signature = selection
            .iter()
            .map(|(k, v)| format!("{}:{}", escape(k, true), escape(v, false)))
            .collect::<Vec<_>>()
            .join("|");
        Self(signature)
    }

    /// Whether this is the signature of an empty selection.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_SIGNATURE
    }

    /// Returns the signature as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VariantSignature {
    fn default() -> Self {
        Self(DEFAULT_SIGNATURE.to_string())
    }
}

impl fmt::Display for VariantSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape(s: &str, is_name: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '|' || (is_name && c == ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// ItemKey
// =============================================================================

/// Identity of a line item: product id plus variant signature.
///
/// Rendered as `<id>::<signature>` so it can travel through markup attributes
/// and command-line arguments. `:` and `\\` inside the id are escaped with a
/// backslash, so ids such as `sku::1` survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    /// Product identifier.
    pub id: ProductId,
    /// Canonical variant signature.
    pub signature: VariantSignature,
}

impl ItemKey {
    /// Key for a product and selection.
    #[must_use]
    pub fn new(id: ProductId, selection: &VariantSelection) -> Self {
        Self {
            id,
            signature: selection.signature(),
        }
    }

    /// Key for a product bought without variants.
    #[must_use]
    pub fn plain(id: ProductId) -> Self {
        Self {
            id,
            signature: VariantSignature::default(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", escape_id(self.id.as_str()), self.signature)
    }
}

fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if c == '\\' || c == ':' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split at the first unescaped `::`, unescaping the id part.
fn split_key(s: &str) -> (String, Option<&str>) {
    let mut id = String::with_capacity(s.len());
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    id.push(escaped);
                }
            }
            ':' if s.get(i + 1..).is_some_and(|rest| rest.starts_with(':')) => {
                return (id, s.get(i + KEY_SEPARATOR.len()..));
            }
            _ => id.push(c),
        }
    }
    (id, None)
}

/// Errors parsing an [`ItemKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemKeyError {
    /// The product id part is blank.
    #[error("item key has no product id")]
    MissingId,
}

impl FromStr for ItemKey {
    type Err = ItemKeyError;

    /// Splits on the first unescaped `::`; a bare id means the default signature.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, signature) = split_key(s);
        let signature = signature.unwrap_or(DEFAULT_SIGNATURE);
        let id = ProductId::parse(&id).ok_or(ItemKeyError::MissingId)?;
        let signature = if signature.is_empty() {
            VariantSignature::default()
        } else {
            VariantSignature(signature.to_string())
        };
        Ok(Self { id, signature })
    }
}

//! Site settings fetched from the settings sheet at boot.
//!
//! Settings are a flat string map. They are read once per session and never
//! mutated afterwards, so the type exposes accessors but no setters.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::currency::{CurrencyFormat, DEFAULT_CURRENCY_SYMBOL, TextDirection};
use super::scalar::scalar_to_string;

/// Title used when the sheet leaves `site_title` blank.
pub const DEFAULT_SITE_TITLE: &str = "My Website";

/// Language used when the sheet leaves `language` blank.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Well-known setting keys.
pub mod keys {
    pub const CURRENCY_SYMBOL: &str = "currency_symbol";
    pub const SITE_TITLE: &str = "site_title";
    pub const LANGUAGE: &str = "language";
    pub const CONTACT_PHONE: &str = "contact_phone";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const CONTACT_WHATSAPP: &str = "contact_whatsapp";
    pub const ANALYTICS_INCLUDED: &str = "analytics_included";
}

/// Read-only site configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    /// Build settings from key/value pairs.
    #[must_use]
    pub const fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    /// Build settings from a JSON object; non-scalar values are skipped.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        Self(
            map.iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k.clone(), v)))
                .collect(),
        )
    }

    /// Raw value for a key; blank values count as missing.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Currency symbol, `$` by default.
    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        self.get_or(keys::CURRENCY_SYMBOL, DEFAULT_CURRENCY_SYMBOL)
    }

    /// Site title, `My Website` by default.
    #[must_use]
    pub fn site_title(&self) -> &str {
        self.get_or(keys::SITE_TITLE, DEFAULT_SITE_TITLE)
    }

    /// Interface language code, `en` by default.
    #[must_use]
    pub fn language(&self) -> &str {
        self.get_or(keys::LANGUAGE, DEFAULT_LANGUAGE)
    }

    /// Contact phone number.
    #[must_use]
    pub fn contact_phone(&self) -> &str {
        self.get_or(keys::CONTACT_PHONE, "")
    }

    /// Contact email address.
    #[must_use]
    pub fn contact_email(&self) -> &str {
        self.get_or(keys::CONTACT_EMAIL, "")
    }

    /// Contact `WhatsApp` number.
    #[must_use]
    pub fn contact_whatsapp(&self) -> &str {
        self.get_or(keys::CONTACT_WHATSAPP, "")
    }

    /// Whether search analytics should be logged to the backend.
    #[must_use]
    pub fn analytics_enabled(&self) -> bool {
        self.get(keys::ANALYTICS_INCLUDED)
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"))
    }

    /// Text direction derived from the language.
    #[must_use]
    pub fn direction(&self) -> TextDirection {
        TextDirection::for_language(self.language())
    }

    /// The shared currency format for every price on the page.
    #[must_use]
    pub fn currency_format(&self) -> CurrencyFormat {
        CurrencyFormat::new(self.currency_symbol(), self.direction())
    }

    /// A copy with the language replaced.
    #[must_use]
    pub fn with_language(&self, language: &str) -> Self {
        let mut map = self.0.clone();
        map.insert(keys::LANGUAGE.to_string(), language.to_string());
        Self(map)
    }

    /// Iterate over all settings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no settings were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_empty() {
        let settings = Settings::default();
        assert_eq!(settings.currency_symbol(), "$");
        assert_eq!(settings.site_title(), "My Website");
        assert_eq!(settings.language(), "en");
        assert_eq!(settings.contact_phone(), "");
        assert!(!settings.analytics_enabled());
    }

    #[test]
    fn test_blank_values_fall_back() {
        let settings = Settings::from_json(&json!({"currency_symbol": "  ", "site_title": ""}));
        assert_eq!(settings.currency_symbol(), "$");
        assert_eq!(settings.site_title(), "My Website");
    }

    #[test]
    fn test_from_json_stringifies_scalars() {
        let settings = Settings::from_json(&json!({
            "contact_phone": 5551234,
            "analytics_included": "YES",
            "nested": {"x": 1}
        }));
        assert_eq!(settings.contact_phone(), "5551234");
        assert!(settings.analytics_enabled());
        assert_eq!(settings.get("nested"), None);
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn test_currency_format_follows_language() {
        let settings = Settings::from_json(&json!({"currency_symbol": "ر.س", "language": "ar"}));
        assert_eq!(settings.direction(), TextDirection::Rtl);
        assert_eq!(settings.currency_format().direction(), TextDirection::Rtl);

        let overridden = settings.with_language("en");
        assert_eq!(overridden.direction(), TextDirection::Ltr);
        assert_eq!(settings.language(), "ar");
    }
}

//! Text map translation.
//!
//! The text map sheet maps UI keys to per-language strings:
//! `{"CART_EMPTY": {"en": "Your cart is empty", "fr": "Votre panier est vide"}}`.

use std::collections::BTreeMap;

use serde_json::Value;

use fusion_core::TextDirection;

/// Keys looked up by the renderer and search.
pub mod keys {
    pub const CART_EMPTY: &str = "CART_EMPTY";
    pub const CART_TOTAL: &str = "CART_TOTAL";
    pub const CHECKOUT: &str = "CHECKOUT";
    pub const SUBMIT_ORDER: &str = "SUBMIT_ORDER";
    pub const REMOVE: &str = "REMOVE";
    pub const DISMISS: &str = "DISMISS";
    pub const WISHLIST_EMPTY: &str = "WISHLIST_EMPTY";
    pub const MOVE_TO_CART: &str = "MOVE_TO_CART";
    pub const ADD_TO_CART: &str = "ADD_TO_CART";
    pub const SEARCH_RESULTS_FOR: &str = "SEARCH_RESULTS_FOR";
}

/// Key → language → text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMap(BTreeMap<String, BTreeMap<String, String>>);

impl TextMap {
    /// Build from the `map` payload. Non-object entries and non-string texts are skipped.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(entries) = value else {
            return Self::default();
        };

        let map = entries
            .iter()
            .filter_map(|(key, langs)| {
                let Value::Object(langs) = langs else {
                    return None;
                };
                let texts: BTreeMap<String, String> = langs
                    .iter()
                    .filter_map(|(lang, text)| text.as_str().map(|t| (lang.clone(), t.to_string())))
                    .collect();
                Some((key.clone(), texts))
            })
            .collect();
        Self(map)
    }

    /// Add one translation.
    pub fn insert(&mut self, key: &str, language: &str, text: &str) {
        self.0
            .entry(key.to_string())
            .or_default()
            .insert(language.to_string(), text.to_string());
    }

    /// The non-empty translation of `key` in `language`.
    #[must_use]
    pub fn lookup(&self, key: &str, language: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|langs| langs.get(language))
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A text map bound to the active language.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    map: TextMap,
    language: String,
}

impl Translator {
    #[must_use]
    pub fn new(map: TextMap, language: impl Into<String>) -> Self {
        Self {
            map,
            language: language.into(),
        }
    }

    /// Translation of `key`, or the key itself when untranslated.
    #[must_use]
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.map.lookup(key, &self.language).unwrap_or(key)
    }

    /// Translation of `key`, or `fallback` when untranslated.
    #[must_use]
    pub fn text<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.map.lookup(key, &self.language).unwrap_or(fallback)
    }

    /// Active language code.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Layout direction of the active language.
    #[must_use]
    pub fn direction(&self) -> TextDirection {
        TextDirection::for_language(&self.language)
    }
}

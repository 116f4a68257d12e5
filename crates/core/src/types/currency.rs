//! Currency display formatting.
//!
//! Every price shown to a shopper goes through [`CurrencyFormat::format`] so
//! badges, tables and product cards agree on symbol placement and precision.

use serde::{Deserialize, Serialize};

use super::price::Price;

/// Symbol used when the settings sheet leaves `currency_symbol` blank.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Languages written right-to-left.
const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur"];

/// Document text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Direction for a language code such as `en`, `ar` or `fr-CA`.
    #[must_use]
    pub fn for_language(language: &str) -> Self {
        let primary = language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if RTL_LANGUAGES.contains(&primary.as_str()) {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    /// The HTML `dir` attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// How to render a [`Price`] for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyFormat {
    symbol: String,
    direction: TextDirection,
}

impl CurrencyFormat {
    /// Create a format; a blank symbol falls back to `$`.
    #[must_use]
    pub fn new(symbol: &str, direction: TextDirection) -> Self {
        let symbol = symbol.trim();
        Self {
            symbol: if symbol.is_empty() {
                DEFAULT_CURRENCY_SYMBOL.to_string()
            } else {
                symbol.to_string()
            },
            direction,
        }
    }

    /// The currency symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Text direction used for symbol placement.
    #[must_use]
    pub const fn direction(&self) -> TextDirection {
        self.direction
    }

    /// Format a price with two decimal places.
    ///
    /// The symbol is a prefix for left-to-right languages (`$12.50`) and a
    /// space-separated suffix for right-to-left ones (`12.50 د.إ`).
    #[must_use]
    pub fn format(&self, price: Price) -> String {
        match self.direction {
            TextDirection::Ltr => format!("{}{price}", self.symbol),
            TextDirection::Rtl => format!("{price} {}", self.symbol),
        }
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_SYMBOL, TextDirection::Ltr)
    }
}

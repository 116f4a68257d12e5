//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from three places: the catalog API, spreadsheet-backed
//! settings, and line items persisted by older page versions. Any of them may
//! carry a number, a numeric string, or garbage. [`Price::coerce`] is the single
//! lenient entry point; it never fails and never yields a non-finite value.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Errors that can occur when parsing a [`Price`] strictly.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative amount in the store's single implicit currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Parse a price from a string such as `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, or negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount =
            Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(trimmed.to_string()))?;
        Self::new(amount)
    }

    /// Coerce an arbitrary JSON value into a price.
    ///
    /// Numbers and numeric strings are accepted. A string with trailing junk
    /// (`"12.5 USD"`) keeps its leading number. Everything else, including
    /// negative amounts, becomes [`Price::ZERO`].
    #[must_use]
    pub fn coerce(value: &Value) -> Self {
        let amount = match value {
            Value::Number(n) => Decimal::from_str(&n.to_string())
                .ok()
                .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain)),
            Value::String(s) => leading_number(s).and_then(|n| Decimal::from_str(n).ok()),
            _ => None,
        };

        amount
            .and_then(|a| Self::new(a).ok())
            .unwrap_or(Self::ZERO)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn line_total(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// The amount rounded to two decimal places (midpoint away from zero).
    #[must_use]
    pub fn rounded(self) -> Decimal {
        self.0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

/// Serde helper for fields that must accept any JSON value as a price.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Price, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Price::coerce(&value))
}

/// Serde helper for optional prices; `null`, missing and unparsable values
/// become `None`.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce a JSON value.
pub fn deserialize_lenient_opt<'de, D>(deserializer: D) -> Result<Option<Price>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(_) => Some(Price::coerce(&value)),
        Value::String(s) if leading_number(s).is_some() => Some(Price::coerce(&value)),
        _ => None,
    };
    Ok(parsed)
}

/// The numeric prefix of `s`, mirroring how browsers read `"12.5kg"` as 12.5.
fn leading_number(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in s.char_indices() {
        match c {
            '-' | '+' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    let candidate = s.get(..end)?.trim_end_matches('.');
    seen_digit.then_some(candidate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Price::parse("19.99").unwrap(), Price::from_cents(1999));
        assert_eq!(Price::parse("  10 ").unwrap().to_string(), "10.00");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(Price::coerce(&json!(10)), Price::parse("10").unwrap());
        assert_eq!(Price::coerce(&json!(12.5)), Price::parse("12.5").unwrap());
        assert_eq!(Price::coerce(&json!("7.25")), Price::parse("7.25").unwrap());
        assert_eq!(Price::coerce(&json!("12.5 USD")), Price::parse("12.5").unwrap());
    }

    #[test]
    fn test_coerce_garbage_is_zero() {
        assert_eq!(Price::coerce(&json!("free")), Price::ZERO);
        assert_eq!(Price::coerce(&json!(null)), Price::ZERO);
        assert_eq!(Price::coerce(&json!({"amount": 3})), Price::ZERO);
        assert_eq!(Price::coerce(&json!(-4)), Price::ZERO);
        assert_eq!(Price::coerce(&json!("")), Price::ZERO);
        assert_eq!(Price::coerce(&json!(".")), Price::ZERO);
    }

    #[test]
    fn test_line_total_and_sum() {
        let price = Price::parse("2.50").unwrap();
        assert_eq!(price.line_total(3), Price::parse("7.5").unwrap());

        let total: Price = [Price::from_cents(100), Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(350));

        let empty: Price = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_display_rounds_midpoint_away_from_zero() {
        assert_eq!(Price::parse("1.005").unwrap().to_string(), "1.01");
        assert_eq!(Price::parse("1.004").unwrap().to_string(), "1.00");
    }

    #[test]
    fn test_lenient_opt() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "deserialize_lenient_opt")]
            discount: Option<Price>,
        }

        let row: Row = serde_json::from_value(json!({"discount": "15"})).unwrap();
        assert_eq!(row.discount, Some(Price::parse("15").unwrap()));

        let row: Row = serde_json::from_value(json!({"discount": null})).unwrap();
        assert_eq!(row.discount, None);

        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert_eq!(row.discount, None);
    }
}

//! Line items held in a cart or wishlist.

use core::num::NonZeroU32;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::ProductId;
use super::price::Price;
use super::scalar::scalar_to_string;
use super::variant::{ItemKey, VariantSelection, VariantSignature};

/// One product + variant selection with a quantity.
///
/// Serialized with the storage layout used by existing pages:
/// `{"id","title","price","qty","image","variants"}`.
///
/// `unit_price` is the price seen when the item was first added; later catalog
/// changes are not applied to items already held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Unit price locked at first add.
    #[serde(rename = "price")]
    pub unit_price: Price,
    #[serde(rename = "qty")]
    quantity: NonZeroU32,
    /// Display image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Selected variant values.
    pub variants: VariantSelection,
}

impl LineItem {
    /// Create a line item.
    #[must_use]
    pub const fn new(
        id: ProductId,
        title: String,
        unit_price: Price,
        quantity: NonZeroU32,
        image: Option<String>,
        variants: VariantSelection,
    ) -> Self {
        Self {
            id,
            title,
            unit_price,
            quantity,
            image,
            variants,
        }
    }

    /// Quantity held; always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Replace the quantity.
    pub fn set_quantity(&mut self, quantity: NonZeroU32) {
        self.quantity = quantity;
    }

    /// Increase the quantity, saturating at `u32::MAX`.
    pub fn add_quantity(&mut self, amount: u32) {
        self.quantity = self.quantity.saturating_add(amount);
    }

    /// Canonical signature of the selected variants.
    #[must_use]
    pub fn signature(&self) -> VariantSignature {
        self.variants.signature()
    }

    /// Identity key of this item.
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.id.clone(), &self.variants)
    }

    /// Whether this item has the given identity.
    #[must_use]
    pub fn matches(&self, key: &ItemKey) -> bool {
        self.id == key.id && self.signature() == key.signature
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.line_total(self.quantity())
    }
}

/// Wire form accepted from storage before normalization.
#[derive(Deserialize)]
struct RawLineItem {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Value,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    qty: Value,
    #[serde(default)]
    image: Value,
    #[serde(default)]
    variants: VariantSelection,
}

impl<'de> Deserialize<'de> for LineItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawLineItem::deserialize(deserializer)?;
        let id = ProductId::from_json(&raw.id)
            .ok_or_else(|| de::Error::custom("line item has no product id"))?;

        Ok(Self {
            id,
            title: scalar_to_string(&raw.title).unwrap_or_default(),
            unit_price: Price::coerce(&raw.price),
            quantity: coerce_quantity(&raw.qty),
            image: scalar_to_string(&raw.image).filter(|s| !s.trim().is_empty()),
            variants: raw.variants,
        })
    }
}

/// Read a stored quantity; zero, negative or unparsable values become 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn coerce_quantity(value: &Value) -> NonZeroU32 {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f.trunc() as u64)),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        }
        _ => None,
    };

    parsed
        .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
        .and_then(NonZeroU32::new)
        .unwrap_or(NonZeroU32::MIN)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(qty: u32) -> LineItem {
        LineItem::new(
            ProductId::parse("p1").unwrap(),
            "Mug".to_string(),
            Price::parse("10").unwrap(),
            NonZeroU32::new(qty).unwrap(),
            None,
            VariantSelection::new(),
        )
    }

    #[test]
    fn test_line_total() {
        assert_eq!(item(3).line_total(), Price::parse("30").unwrap());
    }

    #[test]
    fn test_add_quantity_saturates() {
        let mut it = item(u32::MAX - 1);
        it.add_quantity(5);
        assert_eq!(it.quantity(), u32::MAX);
    }

    #[test]
    fn test_serialized_layout() {
        let json = serde_json::to_string(&item(2)).unwrap();
        assert_eq!(
            json,
            r#"{"id":"p1","title":"Mug","price":"10","qty":2,"variants":{}}"#
        );
    }

    #[test]
    fn test_deserialize_legacy_shapes() {
        let it: LineItem = serde_json::from_value(json!({
            "id": 17,
            "title": "Tee",
            "price": "12.5",
            "qty": "3",
            "variants": null
        }))
        .unwrap();
        assert_eq!(it.id.as_str(), "17");
        assert_eq!(it.quantity(), 3);
        assert_eq!(it.unit_price, Price::parse("12.5").unwrap());
        assert!(it.variants.is_empty());
        assert_eq!(it.key().to_string(), "17::default");
    }

    #[test]
    fn test_deserialize_coerces_bad_quantity_and_price() {
        let it: LineItem =
            serde_json::from_value(json!({"id": "p", "price": "n/a", "qty": 0})).unwrap();
        assert_eq!(it.quantity(), 1);
        assert_eq!(it.unit_price, Price::ZERO);

        let it: LineItem = serde_json::from_value(json!({"id": "p", "qty": -2})).unwrap();
        assert_eq!(it.quantity(), 1);
    }

    #[test]
    fn test_deserialize_requires_id() {
        assert!(serde_json::from_value::<LineItem>(json!({"title": "x"})).is_err());
    }

    #[test]
    fn test_matches_key() {
        let mut it = item(1);
        it.variants = VariantSelection::new().with("color", "red");
        assert!(it.matches(&"p1::color:red".parse().unwrap()));
        assert!(!it.matches(&"p1".parse().unwrap()));
    }
}

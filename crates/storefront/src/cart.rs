//! Cart state container.
//!
//! The cart is the single source of truth for what the shopper intends to
//! buy. Every mutation writes through to storage; a failed write is logged and
//! the in-memory state stays authoritative until the next successful write.

use core::num::NonZeroU32;

use tracing::{debug, error};

use fusion_core::{ItemKey, LineItem, Price, Product, VariantSelection};

use crate::persistence::Persistence;
use crate::storage::KeyValueStore;

/// Storage key shared with existing pages.
pub const CART_STORAGE_KEY: &str = "mpwb_cart";

/// Result of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now holds this quantity.
    Updated(u32),
    /// The line dropped to zero and was removed.
    Removed,
    /// No line has that key.
    Missing,
}

/// Ordered list of line items, unique by [`ItemKey`].
#[derive(Debug)]
pub struct Cart<S> {
    items: Vec<LineItem>,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> Cart<S> {
    /// Rehydrate the cart from storage.
    pub fn open(store: S) -> Self {
        let persistence = Persistence::new(store, CART_STORAGE_KEY);
        let items = persistence.load();
        debug!(lines = items.len(), "Cart rehydrated");
        Self { items, persistence }
    }

    /// Add `quantity` of a product with the given selection.
    ///
    /// A quantity of 0 counts as 1. If the line already exists its quantity
    /// grows and its stored unit price is kept.
    pub fn add(&mut self, product: &Product, quantity: u32, selection: VariantSelection) -> ItemKey {
        let quantity = NonZeroU32::new(quantity).unwrap_or(NonZeroU32::MIN);
        let item = LineItem::new(
            product.id.clone(),
            product.title.clone(),
            product.price,
            quantity,
            product.image.clone(),
            selection,
        );
        self.add_item(item)
    }

    /// Add a prepared line item, merging with an existing line of the same key.
    pub fn add_item(&mut self, item: LineItem) -> ItemKey {
        let key = item.key();
        if let Some(existing) = self.find_mut(&key) {
            existing.add_quantity(item.quantity());
        } else {
            self.items.push(item);
        }
        self.persist();
        key
    }

    /// Apply a signed delta to a line's quantity. Lines reaching zero are removed.
    pub fn change_quantity(&mut self, key: &ItemKey, delta: i64) -> QuantityChange {
        let Some(index) = self.position(key) else {
            return QuantityChange::Missing;
        };
        let Some(item) = self.items.get_mut(index) else {
            return QuantityChange::Missing;
        };

        let next = i64::from(item.quantity()).saturating_add(delta);
        let change = match u32::try_from(next).ok().and_then(NonZeroU32::new) {
            Some(quantity) => {
                item.set_quantity(quantity);
                QuantityChange::Updated(quantity.get())
            }
            None if next > 0 => {
                item.set_quantity(NonZeroU32::MAX);
                QuantityChange::Updated(u32::MAX)
            }
            None => {
                self.items.remove(index);
                QuantityChange::Removed
            }
        };

        self.persist();
        change
    }

    /// Add one to a line.
    pub fn increment(&mut self, key: &ItemKey) -> QuantityChange {
        self.change_quantity(key, 1)
    }

    /// Take one from a line, removing it at zero.
    pub fn decrement(&mut self, key: &ItemKey) -> QuantityChange {
        self.change_quantity(key, -1)
    }

    /// Remove a line. Returns `false` if it was not present.
    pub fn remove(&mut self, key: &ItemKey) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        self.items.remove(index);
        self.persist();
        true
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Sum of all quantities, as shown on the badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|it| u64::from(it.quantity())).sum()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line with the given key.
    #[must_use]
    pub fn get(&self, key: &ItemKey) -> Option<&LineItem> {
        self.items.iter().find(|it| it.matches(key))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, key: &ItemKey) -> Option<usize> {
        self.items.iter().position(|it| it.matches(key))
    }

    fn find_mut(&mut self, key: &ItemKey) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|it| it.matches(key))
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.store(&self.items) {
            error!(error = %e, key = self.persistence.key(), "Failed to persist cart");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use fusion_core::ProductId;
    use std::sync::Arc;

    fn product(id: &str, price: &str) -> Product {
        Product::new(ProductId::parse(id).unwrap(), format!("Product {id}"), Price::parse(price).unwrap())
    }

    fn red() -> VariantSelection {
        VariantSelection::new().with("color", "red")
    }

    #[test]
    fn test_add_merges_same_key() {
        let mut cart = Cart::open(MemoryStore::new());
        let p = product("p1", "10");
        let k1 = cart.add(&p, 1, red());
        let k2 = cart.add(&p, 2, red());
        assert_eq!(k1, k2);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(&k1).unwrap().quantity(), 3);
    }

    #[test]
    fn test_distinct_variants_are_distinct_lines() {
        let mut cart = Cart::open(MemoryStore::new());
        let p = product("p1", "10");
        cart.add(&p, 1, red());
        cart.add(&p, 1, VariantSelection::new().with("color", "blue"));
        cart.add(&p, 1, VariantSelection::new());
        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_variant_lines_and_totals() {
        let mut cart = Cart::open(MemoryStore::new());
        let p1 = product("p1", "10");

        let plain = cart.add(&p1, 1, VariantSelection::new());
        cart.add(&p1, 1, VariantSelection::new());
        assert_eq!(cart.get(&plain).unwrap().quantity(), 2);
        assert_eq!(cart.total(), Price::parse("20").unwrap());

        cart.add(&p1, 1, red());
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total(), Price::parse("30").unwrap());

        assert!(cart.remove(&plain));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Price::parse("10").unwrap());
    }

    #[test]
    fn test_printed_key_addresses_line() {
        let mut cart = Cart::open(MemoryStore::new());
        let key = cart.add(&product("sku::1", "5"), 2, VariantSelection::new());

        let reparsed: ItemKey = key.to_string().parse().unwrap();
        assert_eq!(cart.decrement(&reparsed), QuantityChange::Updated(1));
        assert!(cart.remove(&reparsed));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_counts_as_one() {
        let mut cart = Cart::open(MemoryStore::new());
        let key = cart.add(&product("p1", "4"), 0, VariantSelection::new());
        assert_eq!(cart.get(&key).unwrap().quantity(), 1);
    }

    #[test]
    fn test_price_locked_at_first_add() {
        let mut cart = Cart::open(MemoryStore::new());
        let key = cart.add(&product("p1", "10"), 1, VariantSelection::new());
        cart.add(&product("p1", "12"), 1, VariantSelection::new());
        let line = cart.get(&key).unwrap();
        assert_eq!(line.unit_price, Price::parse("10").unwrap());
        assert_eq!(cart.total(), Price::parse("20").unwrap());
    }

    #[test]
    fn test_change_quantity_to_zero_removes() {
        let mut cart = Cart::open(MemoryStore::new());
        let key = cart.add(&product("p1", "10"), 2, VariantSelection::new());
        assert_eq!(cart.decrement(&key), QuantityChange::Updated(1));
        assert_eq!(cart.decrement(&key), QuantityChange::Removed);
        assert!(cart.is_empty());
        assert_eq!(cart.decrement(&key), QuantityChange::Missing);
    }

    #[test]
    fn test_large_negative_delta_removes() {
        let mut cart = Cart::open(MemoryStore::new());
        let key = cart.add(&product("p1", "10"), 3, VariantSelection::new());
        assert_eq!(cart.change_quantity(&key, -50), QuantityChange::Removed);
    }

    #[test]
    fn test_total_and_count() {
        let mut cart = Cart::open(MemoryStore::new());
        cart.add(&product("a", "10.25"), 2, VariantSelection::new());
        cart.add(&product("b", "0.5"), 3, red());
        assert_eq!(cart.total(), Price::parse("22").unwrap());
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_persists_and_rehydrates() {
        let store = Arc::new(MemoryStore::new());
        let key = {
            let mut cart = Cart::open(Arc::clone(&store));
            let key = cart.add(&product("p1", "10"), 2, red());
            cart.add(&product("p2", "1"), 1, VariantSelection::new());
            key
        };

        let cart = Cart::open(Arc::clone(&store));
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.get(&key).unwrap().quantity(), 2);
        assert_eq!(cart.items()[0].id.as_str(), "p1");
    }

    #[test]
    fn test_clear_and_remove_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = Cart::open(Arc::clone(&store));
        let key = cart.add(&product("p1", "10"), 1, VariantSelection::new());
        assert!(cart.remove(&key));
        assert!(!cart.remove(&key));
        cart.add(&product("p2", "10"), 1, VariantSelection::new());
        cart.clear();
        assert!(Cart::open(Arc::clone(&store)).is_empty());
    }

    #[derive(Debug)]
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut cart = Cart::open(ReadOnlyStore);
        cart.add(&product("p1", "3"), 2, VariantSelection::new());
        assert_eq!(cart.item_count(), 2);
    }
}

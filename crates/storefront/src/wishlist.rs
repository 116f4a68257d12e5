//! Wishlist: a saved-for-later list with unit quantities.

use core::num::NonZeroU32;

use tracing::{debug, error};

use fusion_core::{ItemKey, LineItem, Product, VariantSelection};

use crate::cart::Cart;
use crate::persistence::Persistence;
use crate::storage::KeyValueStore;

/// Storage key for the wishlist.
pub const WISHLIST_STORAGE_KEY: &str = "fusion_wishlist_v1";

/// Saved items, unique by [`ItemKey`], each held once.
#[derive(Debug)]
pub struct Wishlist<S> {
    items: Vec<LineItem>,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> Wishlist<S> {
    /// Rehydrate the wishlist from storage.
    pub fn open(store: S) -> Self {
        let persistence = Persistence::new(store, WISHLIST_STORAGE_KEY);
        let mut items = persistence.load();
        for item in &mut items {
            item.set_quantity(NonZeroU32::MIN);
        }
        debug!(entries = items.len(), "Wishlist rehydrated");
        Self { items, persistence }
    }

    /// Save a product. Returns `false` if that key is already saved.
    pub fn add(&mut self, product: &Product, selection: VariantSelection) -> bool {
        let item = LineItem::new(
            product.id.clone(),
            product.title.clone(),
            product.price,
            NonZeroU32::MIN,
            product.image.clone(),
            selection,
        );
        if self.contains(&item.key()) {
            return false;
        }
        self.items.push(item);
        self.persist();
        true
    }

    /// Remove a saved item. Returns `false` if it was not saved.
    pub fn remove(&mut self, key: &ItemKey) -> bool {
        let Some(index) = self.items.iter().position(|it| it.matches(key)) else {
            return false;
        };
        self.items.remove(index);
        self.persist();
        true
    }

    /// Save the item if absent, otherwise remove it. Returns whether it is now saved.
    pub fn toggle(&mut self, product: &Product, selection: VariantSelection) -> bool {
        let key = ItemKey::new(product.id.clone(), &selection);
        if self.contains(&key) {
            self.remove(&key);
            false
        } else {
            self.add(product, selection)
        }
    }

    /// Whether the key is saved.
    #[must_use]
    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.iter().any(|it| it.matches(key))
    }

    /// Number of saved items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Saved items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Remove every saved item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Move a saved item into the cart with quantity 1.
    ///
    /// The cart keeps its own unit price if it already holds that line.
    pub fn move_to_cart<C: KeyValueStore>(&mut self, key: &ItemKey, cart: &mut Cart<C>) -> bool {
        let Some(index) = self.items.iter().position(|it| it.matches(key)) else {
            return false;
        };
        let item = self.items.remove(index);
        cart.add_item(item);
        self.persist();
        true
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.store(&self.items) {
            error!(error = %e, key = self.persistence.key(), "Failed to persist wishlist");
        }
    }
}

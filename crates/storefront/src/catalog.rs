//! In-memory product catalog.

use std::collections::HashMap;

use tracing::warn;

use fusion_core::{ItemKey, Product, ProductId, VariantSelection};

use crate::cart::Cart;
use crate::storage::KeyValueStore;
use crate::wishlist::Wishlist;

/// Products loaded at boot, in backend order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog. Later duplicates of an id are dropped.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut kept = Vec::with_capacity(products.len());
        let mut index = HashMap::with_capacity(products.len());
        for product in products {
            if index.contains_key(&product.id) {
                warn!(product_id = %product.id, "Duplicate product id in catalog");
                continue;
            }
            index.insert(product.id.clone(), kept.len());
            kept.push(product);
        }
        Self {
            products: kept,
            index,
        }
    }

    /// Look up a product, logging a miss.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        let product = self.index.get(id).and_then(|&i| self.products.get(i));
        if product.is_none() {
            warn!(product_id = %id, "Product not found in catalog");
        }
        product
    }

    /// All products in backend order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Add a catalog product to the cart.
    ///
    /// Without a selection, or with one the product does not offer, the
    /// product's default selection is used. Returns `None` on a catalog miss.
    pub fn add_to_cart<S: KeyValueStore>(
        &self,
        cart: &mut Cart<S>,
        id: &ProductId,
        quantity: u32,
        selection: Option<VariantSelection>,
    ) -> Option<ItemKey> {
        let product = self.get(id)?;
        let selection = resolve_selection(product, selection);
        Some(cart.add(product, quantity, selection))
    }

    /// Save a catalog product to the wishlist.
    ///
    /// Returns `None` on a catalog miss, otherwise whether it was newly saved.
    pub fn add_to_wishlist<S: KeyValueStore>(
        &self,
        wishlist: &mut Wishlist<S>,
        id: &ProductId,
        selection: Option<VariantSelection>,
    ) -> Option<bool> {
        let product = self.get(id)?;
        let selection = resolve_selection(product, selection);
        Some(wishlist.add(product, selection))
    }
}

fn resolve_selection(product: &Product, selection: Option<VariantSelection>) -> VariantSelection {
    match selection.filter(|s| !s.is_empty()) {
        Some(selection) if product.variants.allows(&selection) => selection,
        Some(selection) => {
            warn!(
                product_id = %product.id,
                selection = %selection.label(),
                "Selection not offered, using defaults"
            );
            product.default_selection()
        }
        None => product.default_selection(),
    }
}

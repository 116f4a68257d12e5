//! Storefront state: the composition root for one shopper session.
//!
//! Owns every component and hands out references; nothing here is global.

use tracing::{info, instrument, warn};
use url::Url;

use fusion_core::{ItemKey, Product, ProductId, Settings, VariantSelection};

use crate::api::{ApiClient, ApiError, ApiOptions, FeedClient, Transport};
use crate::cart::{Cart, QuantityChange};
use crate::catalog::Catalog;
use crate::checkout::{CheckoutFlow, CheckoutReceipt, ContactDetails, SubmitError};
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::i18n::{TextMap, Translator};
use crate::render::{RenderError, Region, Renderer};
use crate::search::{self, SearchLogger, SearchStatus};
use crate::storage::KeyValueStore;
use crate::wishlist::Wishlist;

/// Options applied at boot.
#[derive(Debug, Clone, Default)]
pub struct BootOptions {
    /// Overrides the `language` setting.
    pub language: Option<String>,
    /// Load products from this feed instead of `getProducts`.
    pub feed_url: Option<Url>,
    pub api: ApiOptions,
}

impl From<&StorefrontConfig> for BootOptions {
    fn from(config: &StorefrontConfig) -> Self {
        Self {
            language: config.language.clone(),
            feed_url: config.feed_url.clone(),
            api: config.api_options(),
        }
    }
}

/// Search results with their status line.
#[derive(Debug)]
pub struct SearchOutcome<'a> {
    pub products: Vec<&'a Product>,
    pub status: SearchStatus,
}

/// Everything a page needs, wired together.
#[derive(Debug)]
pub struct Storefront<S, T> {
    settings: Settings,
    renderer: Renderer,
    catalog: Catalog,
    cart: Cart<S>,
    wishlist: Wishlist<S>,
    api: ApiClient<T>,
    checkout: CheckoutFlow,
    search_logger: SearchLogger,
}

impl<S, T> Storefront<S, T>
where
    S: KeyValueStore + Clone,
    T: Transport,
{
    /// Fetch settings, translations and products, then rehydrate the containers.
    ///
    /// Products come from the feed when one is configured, otherwise from the
    /// backend. Each fetch that fails is logged and replaced by an empty value
    /// so the page still works offline.
    #[instrument(skip_all)]
    pub async fn boot(options: BootOptions, store: S, transport: T) -> Self {
        let api = ApiClient::new(transport, options.api);
        let products = async {
            match &options.feed_url {
                Some(url) => feed_products(url, options.api.timeout).await,
                None => api.products().await,
            }
        };
        let (settings, text_map, products) = tokio::join!(api.settings(), api.text_map(), products);

        let settings = settings.unwrap_or_else(|e| {
            warn!(error = %e, "Settings unavailable, using defaults");
            Settings::default()
        });
        let text_map = text_map.unwrap_or_else(|e| {
            warn!(error = %e, "Text map unavailable, using keys");
            TextMap::default()
        });
        let products = products.unwrap_or_else(|e| {
            warn!(error = %e, "Products unavailable, catalog is empty");
            Vec::new()
        });

        let settings = match options.language.as_deref() {
            Some(language) => settings.with_language(language),
            None => settings,
        };
        let translator = Translator::new(text_map, settings.language());
        let renderer = Renderer::new(&settings, translator);
        let search_logger = SearchLogger::new(&settings);
        let catalog = Catalog::new(products);
        let cart = Cart::open(store.clone());
        let wishlist = Wishlist::open(store);

        info!(
            site = settings.site_title(),
            language = settings.language(),
            products = catalog.len(),
            cart_lines = cart.items().len(),
            "Storefront ready"
        );

        Self {
            settings,
            renderer,
            catalog,
            cart,
            wishlist,
            api,
            checkout: CheckoutFlow::new(),
            search_logger,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart<S> {
        &self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist<S> {
        &self.wishlist
    }

    #[must_use]
    pub const fn checkout(&self) -> &CheckoutFlow {
        &self.checkout
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a catalog product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the catalog.
    pub fn add_to_cart(
        &mut self,
        id: &ProductId,
        quantity: u32,
        selection: Option<VariantSelection>,
    ) -> Result<ItemKey> {
        let key = self
            .catalog
            .add_to_cart(&mut self.cart, id, quantity, selection)
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
        add_breadcrumb("cart", &format!("Added {key}"), sentry::Level::Info);
        Ok(key)
    }

    /// Change a cart line by `delta`; hides checkout once the cart is empty.
    pub fn change_quantity(&mut self, key: &ItemKey, delta: i64) -> QuantityChange {
        let change = self.cart.change_quantity(key, delta);
        self.close_checkout_if_empty();
        change
    }

    /// Remove a cart line.
    pub fn remove_from_cart(&mut self, key: &ItemKey) -> bool {
        let removed = self.cart.remove(key);
        self.close_checkout_if_empty();
        removed
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.close_checkout_if_empty();
    }

    fn close_checkout_if_empty(&mut self) {
        if self.cart.is_empty() {
            self.checkout.close();
        }
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Save a catalog product. Returns whether it was newly saved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the catalog.
    pub fn add_to_wishlist(
        &mut self,
        id: &ProductId,
        selection: Option<VariantSelection>,
    ) -> Result<bool> {
        self.catalog
            .add_to_wishlist(&mut self.wishlist, id, selection)
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    /// Remove a saved item.
    pub fn remove_from_wishlist(&mut self, key: &ItemKey) -> bool {
        self.wishlist.remove(key)
    }

    /// Move a saved item into the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is not saved.
    pub fn move_to_cart(&mut self, key: &ItemKey) -> Result<()> {
        if self.wishlist.move_to_cart(key, &mut self.cart) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("wishlist item {key}")))
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Filter the catalog and log the term when analytics is enabled.
    pub async fn search(&self, term: &str) -> SearchOutcome<'_> {
        let products = search::search(self.catalog.products(), term);
        let status = SearchStatus::new(term, products.len(), self.renderer.translator());
        self.search_logger.log(&self.api, term).await;
        SearchOutcome { products, status }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Show the checkout fields. Returns `false` for an empty cart.
    pub fn open_checkout(&mut self) -> bool {
        self.checkout.open(&self.cart)
    }

    /// Hide the checkout fields.
    pub fn close_checkout(&mut self) {
        self.checkout.close();
    }

    /// Hide the outcome message of the last submission.
    pub fn dismiss_notice(&mut self) {
        self.checkout.dismiss_notice();
    }

    /// Submit the cart.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::submit`].
    pub async fn submit_checkout(
        &mut self,
        details: &ContactDetails,
    ) -> std::result::Result<CheckoutReceipt, SubmitError> {
        let result = self.checkout.submit(&self.api, &mut self.cart, details).await;
        match &result {
            Ok(receipt) => add_breadcrumb(
                "checkout",
                &format!("Order {} submitted", receipt.order_ref),
                sentry::Level::Info,
            ),
            Err(e) => add_breadcrumb("checkout", &e.to_string(), sentry::Level::Warning),
        }
        result
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Cart region markup for the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_cart(&self) -> std::result::Result<String, RenderError> {
        self.renderer
            .render_cart(self.cart.items(), self.checkout.state(), self.checkout.notice())
    }

    /// Wishlist region markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_wishlist(&self) -> std::result::Result<String, RenderError> {
        self.renderer.render_wishlist(self.wishlist.items())
    }

    /// Cart badge markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_badge(&self) -> std::result::Result<String, RenderError> {
        self.renderer.render_badge(self.cart.item_count())
    }

    /// Product grid markup for `products`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_products(&self, products: &[Product]) -> std::result::Result<String, RenderError> {
        self.renderer.render_product_grid(products)
    }

    /// Replace the cart region with current markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn refresh_cart<R: Region>(&self, region: &mut R) -> std::result::Result<(), RenderError> {
        self.renderer
            .refresh_cart(region, self.cart.items(), self.checkout.state(), self.checkout.notice())
    }
}

async fn feed_products(url: &Url, timeout: std::time::Duration) -> std::result::Result<Vec<Product>, ApiError> {
    FeedClient::new(url.clone(), timeout)?.products().await
}

//! Renderer: container state to region markup.
//!
//! Rendering is a pure function of the containers, settings and checkout
//! state. A region is always replaced whole, never patched, so rendering the
//! same state twice yields identical markup.

mod views;

use askama::Template;
use thiserror::Error;

use fusion_core::{CurrencyFormat, LineItem, Product, Settings};

use crate::checkout::{CheckoutState, Notice};
use crate::i18n::Translator;

pub use views::{
    BadgeView, CartLabels, CartLineView, CartView, CheckoutControls, NoticeView,
    ProductCardView, ProductGridView, WishlistEntryView, WishlistView,
};

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template evaluation failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A page region whose markup is replaced wholesale.
pub trait Region {
    /// Replace the region content.
    fn replace(&mut self, html: String);
}

/// A region backed by a string, for tests and terminal output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferRegion {
    html: String,
    replacements: usize,
}

impl BufferRegion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current markup.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// How many times the region was replaced.
    #[must_use]
    pub const fn replacements(&self) -> usize {
        self.replacements
    }
}

impl Region for BufferRegion {
    fn replace(&mut self, html: String) {
        self.html = html;
        self.replacements += 1;
    }
}

/// Shared formatting context for every region on the page.
#[derive(Debug, Clone)]
pub struct Renderer {
    format: CurrencyFormat,
    translator: Translator,
}

impl Renderer {
    /// Bind the renderer to the session's settings and translations.
    ///
    /// The currency symbol comes from settings; direction follows the
    /// translator's language.
    #[must_use]
    pub fn new(settings: &Settings, translator: Translator) -> Self {
        let format = CurrencyFormat::new(settings.currency_symbol(), translator.direction());
        Self { format, translator }
    }

    /// The currency format used for every price.
    #[must_use]
    pub const fn format(&self) -> &CurrencyFormat {
        &self.format
    }

    #[must_use]
    pub const fn translator(&self) -> &Translator {
        &self.translator
    }

    #[must_use]
    pub fn cart_view(&self, items: &[LineItem], state: CheckoutState, notice: Option<&Notice>) -> CartView {
        CartView::build(items, state, notice, &self.format, &self.translator)
    }

    /// Cart region markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_cart(
        &self,
        items: &[LineItem],
        state: CheckoutState,
        notice: Option<&Notice>,
    ) -> Result<String, RenderError> {
        Ok(self.cart_view(items, state, notice).render()?)
    }

    /// Wishlist region markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_wishlist(&self, items: &[LineItem]) -> Result<String, RenderError> {
        Ok(WishlistView::build(items, &self.format, &self.translator).render()?)
    }

    /// Badge markup for an item count.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_badge(&self, count: u64) -> Result<String, RenderError> {
        Ok(BadgeView { count }.render()?)
    }

    /// Product grid markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_product_grid(&self, products: &[Product]) -> Result<String, RenderError> {
        Ok(ProductGridView::build(products, &self.format, &self.translator).render()?)
    }

    /// Re-render the cart into a region.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render; the region is left untouched.
    pub fn refresh_cart<R: Region>(
        &self,
        region: &mut R,
        items: &[LineItem],
        state: CheckoutState,
        notice: Option<&Notice>,
    ) -> Result<(), RenderError> {
        region.replace(self.render_cart(items, state, notice)?);
        Ok(())
    }

    /// Re-render the wishlist into a region.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render; the region is left untouched.
    pub fn refresh_wishlist<R: Region>(
        &self,
        region: &mut R,
        items: &[LineItem],
    ) -> Result<(), RenderError> {
        region.replace(self.render_wishlist(items)?);
        Ok(())
    }
}

//! View models handed to the templates.
//!
//! Every price is formatted here so templates only print strings.

use askama::Template;

use fusion_core::{CurrencyFormat, LineItem, Product};

use crate::checkout::{CheckoutState, Notice};
use crate::i18n::{Translator, keys};

// =============================================================================
// Cart
// =============================================================================

/// One cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    /// Item key carried on the controls.
    pub key: String,
    pub title: String,
    /// Variant label, empty without variants.
    pub variant_label: String,
    pub image: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl CartLineView {
    fn new(item: &LineItem, format: &CurrencyFormat) -> Self {
        Self {
            key: item.key().to_string(),
            title: item.title.clone(),
            variant_label: item.variants.label(),
            image: item.image.clone().unwrap_or_default(),
            unit_price: format.format(item.unit_price),
            quantity: item.quantity(),
            line_total: format.format(item.line_total()),
        }
    }
}

/// Checkout controls below the cart table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutControls {
    /// Contact fields are shown.
    pub visible: bool,
    /// The submit control accepts clicks.
    pub submit_enabled: bool,
    pub submit_label: String,
}

/// Translated cart labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLabels {
    pub empty: String,
    pub total: String,
    pub remove: String,
    pub checkout: String,
    pub dismiss: String,
}

/// Outcome message above the cart table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    /// `success` or `error`.
    pub kind: &'static str,
    pub text: String,
}

/// The whole cart region.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/cart.html")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u64,
    pub checkout: CheckoutControls,
    pub notice: Option<NoticeView>,
    pub labels: CartLabels,
    pub dir: &'static str,
}

impl CartView {
    /// Build the cart region from its lines, the checkout state and the
    /// outcome of the last submission.
    ///
    /// Checkout controls are hidden for an empty cart whatever the state.
    #[must_use]
    pub fn build(
        items: &[LineItem],
        state: CheckoutState,
        notice: Option<&Notice>,
        format: &CurrencyFormat,
        translator: &Translator,
    ) -> Self {
        let lines: Vec<CartLineView> = items.iter().map(|it| CartLineView::new(it, format)).collect();
        let total = items.iter().map(LineItem::line_total).sum();
        let item_count = items.iter().map(|it| u64::from(it.quantity())).sum();
        let visible = !lines.is_empty() && state != CheckoutState::Idle;

        Self {
            lines,
            total: format.format(total),
            item_count,
            checkout: CheckoutControls {
                visible,
                submit_enabled: visible && state == CheckoutState::FieldsVisible,
                submit_label: translator.text(keys::SUBMIT_ORDER, "Submit order").to_string(),
            },
            notice: notice.map(|n| NoticeView {
                kind: n.kind.as_str(),
                text: n.text.clone(),
            }),
            labels: CartLabels {
                empty: translator.text(keys::CART_EMPTY, "Your cart is empty").to_string(),
                total: translator.text(keys::CART_TOTAL, "Total").to_string(),
                remove: translator.text(keys::REMOVE, "Remove").to_string(),
                checkout: translator.text(keys::CHECKOUT, "Checkout").to_string(),
                dismiss: translator.text(keys::DISMISS, "Dismiss").to_string(),
            },
            dir: format.direction().as_str(),
        }
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// One wishlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistEntryView {
    pub key: String,
    pub title: String,
    pub variant_label: String,
    pub image: String,
    pub price: String,
}

/// The wishlist region.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/wishlist.html")]
pub struct WishlistView {
    pub entries: Vec<WishlistEntryView>,
    pub empty_label: String,
    pub move_label: String,
    pub remove_label: String,
    pub dir: &'static str,
}

impl WishlistView {
    #[must_use]
    pub fn build(items: &[LineItem], format: &CurrencyFormat, translator: &Translator) -> Self {
        Self {
            entries: items
                .iter()
                .map(|it| WishlistEntryView {
                    key: it.key().to_string(),
                    title: it.title.clone(),
                    variant_label: it.variants.label(),
                    image: it.image.clone().unwrap_or_default(),
                    price: format.format(it.unit_price),
                })
                .collect(),
            empty_label: translator
                .text(keys::WISHLIST_EMPTY, "Your wishlist is empty")
                .to_string(),
            move_label: translator.text(keys::MOVE_TO_CART, "Move to cart").to_string(),
            remove_label: translator.text(keys::REMOVE, "Remove").to_string(),
            dir: format.direction().as_str(),
        }
    }
}

// =============================================================================
// Badge
// =============================================================================

/// Item-count badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Template)]
#[template(path = "partials/badge.html")]
pub struct BadgeView {
    pub count: u64,
}

// =============================================================================
// Product grid
// =============================================================================

/// One product card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: String,
    pub title: String,
    pub image: String,
    pub price: String,
    /// Formatted discount, empty without one.
    pub discount: String,
    pub url: String,
}

impl ProductCardView {
    fn new(product: &Product, format: &CurrencyFormat) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            image: product.image.clone().unwrap_or_default(),
            price: format.format(product.price),
            discount: product.discount.map(|d| format.format(d)).unwrap_or_default(),
            url: product.url.clone().unwrap_or_default(),
        }
    }
}

/// The product grid region.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridView {
    pub cards: Vec<ProductCardView>,
    pub add_label: String,
    pub dir: &'static str,
}

impl ProductGridView {
    #[must_use]
    pub fn build(products: &[Product], format: &CurrencyFormat, translator: &Translator) -> Self {
        Self {
            cards: products.iter().map(|p| ProductCardView::new(p, format)).collect(),
            add_label: translator.text(keys::ADD_TO_CART, "Add to cart").to_string(),
            dir: format.direction().as_str(),
        }
    }
}

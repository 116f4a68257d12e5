//! Core types for the Fusion storefront.
//!
//! This module provides type-safe wrappers for prices, product identity and
//! the line items held by carts and wishlists.

pub mod currency;
pub mod id;
pub mod line_item;
pub mod price;
pub mod product;
mod scalar;
pub mod settings;
pub mod variant;

pub use currency::{CurrencyFormat, TextDirection};
pub use id::ProductId;
pub use line_item::LineItem;
pub use price::{Price, PriceError};
pub use product::{FeedPost, Product};
pub use settings::Settings;
pub use variant::{ItemKey, ItemKeyError, VariantOptions, VariantSelection, VariantSignature};

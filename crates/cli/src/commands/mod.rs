//! Subcommand implementations.
//!
//! Each command prints its result on stdout; diagnostics go through `tracing`.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;

use std::sync::Arc;

use clap::Subcommand;

use fusion_core::{ItemKey, VariantSelection};
use fusion_storefront::api::HttpTransport;
use fusion_storefront::error::AppError;
use fusion_storefront::state::Storefront;
use fusion_storefront::storage::FileStore;

/// The storefront as wired by the CLI.
pub type Shop = Storefront<Arc<FileStore>, HttpTransport>;

#[derive(Subcommand)]
pub enum CartAction {
    /// List cart lines and the total
    Show,
    /// Add a product
    Add {
        /// Product id
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        qty: u32,

        /// Variant choice as `name=value`; repeatable
        #[arg(short, long = "variant", value_parser = parse_variant)]
        variants: Vec<(String, String)>,
    },
    /// Add one unit to a line
    Inc {
        /// Line key as printed by `cart show`
        key: String,
    },
    /// Take one unit off a line
    Dec {
        /// Line key as printed by `cart show`
        key: String,
    },
    /// Remove a line
    Remove {
        /// Line key as printed by `cart show`
        key: String,
    },
    /// Empty the cart
    Clear,
    /// Print the cart region markup
    Html,
}

#[derive(Subcommand)]
pub enum WishlistAction {
    /// List saved items
    Show,
    /// Save a product
    Add {
        /// Product id
        id: String,

        /// Variant choice as `name=value`; repeatable
        #[arg(short, long = "variant", value_parser = parse_variant)]
        variants: Vec<(String, String)>,
    },
    /// Remove a saved item
    Remove {
        /// Item key as printed by `wishlist show`
        key: String,
    },
    /// Move a saved item into the cart
    Move {
        /// Item key as printed by `wishlist show`
        key: String,
    },
}

fn parse_variant(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return Err(format!("expected name=value, got '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// `None` when no variant flags were given, so the product default applies.
fn selection(variants: Vec<(String, String)>) -> Option<VariantSelection> {
    (!variants.is_empty()).then(|| variants.into_iter().collect())
}

fn parse_key(raw: &str) -> Result<ItemKey, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("{raw}: {e}")))
}

fn parse_id(raw: &str) -> Result<fusion_core::ProductId, AppError> {
    fusion_core::ProductId::parse(raw)
        .ok_or_else(|| AppError::BadRequest("product id is blank".to_string()))
}

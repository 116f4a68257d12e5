//! Fusion Core - Shared domain types.
//!
//! This crate provides the types shared by every Fusion component:
//! - `storefront` - Cart, wishlist, catalog and checkout logic
//! - `cli` - Command-line front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, including from browser-side builds.
//!
//! # Modules
//!
//! - [`types`] - Prices, currency formatting, product ids, variant signatures,
//!   line items, settings and catalog products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

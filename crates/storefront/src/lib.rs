//! Fusion Storefront library.
//!
//! Cart, wishlist, catalog, search and checkout logic for a storefront whose
//! data lives behind a spreadsheet-backed web app. Binaries drive it through
//! [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod i18n;
pub mod persistence;
pub mod render;
pub mod search;
pub mod state;
pub mod storage;
pub mod wishlist;

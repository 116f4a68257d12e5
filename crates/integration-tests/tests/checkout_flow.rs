//! Boot, shop and check out against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use fusion_core::{ItemKey, ProductId, VariantSelection};
use fusion_integration_tests::{FakeBackend, Fixture};
use fusion_storefront::api::HttpTransport;
use fusion_storefront::checkout::{CheckoutState, ContactDetails, SubmitError};
use fusion_storefront::error::AppError;
use fusion_storefront::state::{BootOptions, Storefront};
use fusion_storefront::storage::MemoryStore;
use serde_json::json;

type Shop = Storefront<Arc<MemoryStore>, HttpTransport>;

async fn boot(backend: &FakeBackend) -> Shop {
    let transport = HttpTransport::new(backend.url(), Duration::from_secs(5)).unwrap();
    Storefront::boot(BootOptions::default(), Arc::new(MemoryStore::new()), transport).await
}

fn pid(id: &str) -> ProductId {
    ProductId::parse(id).unwrap()
}

fn contact() -> ContactDetails {
    ContactDetails {
        name: " Lin ".to_string(),
        phone: "0700 000 000".to_string(),
        email: "lin@example.com".to_string(),
        message: "Leave at the door".to_string(),
    }
}

#[tokio::test]
async fn test_order_rows_share_one_reference() {
    let backend = FakeBackend::start(Fixture::default()).await;
    let mut shop = boot(&backend).await;

    shop.add_to_cart(&pid("mug"), 2, None).unwrap();
    shop.add_to_cart(&pid("tee"), 1, Some(VariantSelection::new().with("size", "M")))
        .unwrap();
    assert!(shop.render_cart().unwrap().contains("$45.00"));

    assert!(shop.open_checkout());
    let receipt = shop.submit_checkout(&contact()).await.unwrap();
    assert_eq!(receipt.rows, 2);
    assert!(shop.cart().is_empty());
    assert_eq!(shop.checkout().state(), CheckoutState::Idle);
    assert!(shop.render_cart().unwrap().contains("fusion-notice-success"));

    let entries = backend.entries();
    assert_eq!(entries.len(), 2);
    let order_ref = receipt.order_ref.to_string();
    for entry in &entries {
        assert_eq!(entry["type"], "order");
        assert_eq!(entry["order_ref"], order_ref.as_str());
        assert_eq!(entry["name"], "Lin");
    }
    assert_eq!(entries[0]["product_id"], "mug");
    assert_eq!(entries[0]["qty"], 2);
    assert_eq!(entries[0]["total"], json!(25.0));
    assert_eq!(entries[1]["variants"], r#"{"size":"M"}"#);
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let backend = FakeBackend::start(Fixture {
        save_reply: json!({"status": "error", "message": "Out of stock"}),
        ..Fixture::default()
    })
    .await;
    let mut shop = boot(&backend).await;
    shop.add_to_cart(&pid("cap"), 1, None).unwrap();
    shop.open_checkout();

    let err = shop.submit_checkout(&contact()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Rejected { ref message } if message == "Out of stock"));
    assert_eq!(shop.cart().item_count(), 1);
    assert_eq!(shop.checkout().state(), CheckoutState::FieldsVisible);
    let pending = shop.checkout().order_ref();
    assert!(pending.is_some());

    let html = shop.render_cart().unwrap();
    assert!(html.contains("fusion-notice-error"));
    assert!(html.contains("(Out of stock)"));
    shop.dismiss_notice();
    assert!(!shop.render_cart().unwrap().contains("fusion-notice"));

    // Retrying reuses the pending reference
    let _ = shop.submit_checkout(&contact()).await;
    let entries = backend.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["order_ref"], entries[1]["order_ref"]);
}

#[tokio::test]
async fn test_incomplete_contact_sends_nothing() {
    let backend = FakeBackend::start(Fixture::default()).await;
    let mut shop = boot(&backend).await;
    shop.add_to_cart(&pid("mug"), 1, None).unwrap();
    shop.open_checkout();

    let details = ContactDetails {
        phone: "  ".to_string(),
        ..contact()
    };
    let err = shop.submit_checkout(&details).await.unwrap_err();
    assert!(matches!(err, SubmitError::Validation(_)));
    assert_eq!(backend.hits("saveEntry"), 0);
}

#[tokio::test]
async fn test_backend_outage_still_boots() {
    let backend = FakeBackend::start(Fixture {
        fail_with: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..Fixture::default()
    })
    .await;
    let mut shop = boot(&backend).await;

    assert_eq!(shop.settings().site_title(), "My Website");
    assert!(shop.catalog().is_empty());
    assert!(matches!(
        shop.add_to_cart(&pid("mug"), 1, None),
        Err(AppError::NotFound(_))
    ));
    assert!(shop.render_cart().unwrap().contains("Your cart is empty"));
}

#[tokio::test]
async fn test_search_is_logged() {
    let backend = FakeBackend::start(Fixture::default()).await;
    let shop = boot(&backend).await;

    let outcome = shop.search("  CANVAS ").await;
    assert_eq!(outcome.products.len(), 1);
    assert_eq!(outcome.status.text(), Some("1 results for \"canvas\""));

    let entries = backend.entries();
    assert_eq!(entries[0]["type"], "search_query");
    assert_eq!(entries[0]["term"], "canvas");

    shop.search("c").await;
    assert_eq!(backend.entries().len(), 1);
}

#[tokio::test]
async fn test_wishlist_move_to_cart() {
    let backend = FakeBackend::start(Fixture::default()).await;
    let mut shop = boot(&backend).await;

    assert!(shop.add_to_wishlist(&pid("tee"), None).unwrap());
    let key: ItemKey = "tee::size:S".parse().unwrap();
    assert!(shop.wishlist().contains(&key));

    shop.move_to_cart(&key).unwrap();
    assert!(shop.wishlist().is_empty());
    assert_eq!(shop.cart().get(&key).map(fusion_core::LineItem::quantity), Some(1));
}

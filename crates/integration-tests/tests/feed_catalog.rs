//! Products loaded from a Blogger feed instead of `getProducts`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use fusion_core::{Price, ProductId};
use fusion_integration_tests::{FakeBackend, Fixture};
use fusion_storefront::api::HttpTransport;
use fusion_storefront::state::{BootOptions, Storefront};
use fusion_storefront::storage::MemoryStore;
use serde_json::json;

type Shop = Storefront<Arc<MemoryStore>, HttpTransport>;

async fn boot_from_feed(backend: &FakeBackend) -> Shop {
    let transport = HttpTransport::new(backend.url(), Duration::from_secs(5)).unwrap();
    let options = BootOptions {
        feed_url: Some(backend.feed_url()),
        ..BootOptions::default()
    };
    Storefront::boot(options, Arc::new(MemoryStore::new()), transport).await
}

fn pid(id: &str) -> ProductId {
    ProductId::parse(id).unwrap()
}

#[tokio::test]
async fn test_feed_replaces_backend_products() {
    let backend = FakeBackend::start(Fixture::default()).await;
    let mut shop = boot_from_feed(&backend).await;

    assert_eq!(backend.hits("feed"), 1);
    assert_eq!(backend.hits("getProducts"), 0);
    assert_eq!(backend.hits("getSettings"), 1);
    assert_eq!(shop.catalog().len(), 2);
    assert!(shop.catalog().get(&pid("mug")).is_none());

    let bowl = shop.catalog().get(&pid("101")).unwrap();
    assert_eq!(bowl.title, "Clay Bowl");
    assert_eq!(bowl.price, Price::parse("18").unwrap());
    assert_eq!(bowl.url.as_deref(), Some("https://shop.test/clay-bowl.html"));
    assert!(bowl.image.as_deref().is_some_and(|img| !img.contains("s72-c")));

    let towel = shop.catalog().get(&pid("102")).unwrap();
    assert_eq!(towel.description, "Linen");
    assert_eq!(towel.discount, Some(Price::parse("2").unwrap()));

    let key = shop.add_to_cart(&pid("101"), 1, None).unwrap();
    assert_eq!(key.to_string(), "101::color:sand");
    assert!(shop.render_cart().unwrap().contains("$18.00"));
}

#[tokio::test]
async fn test_feed_outage_leaves_catalog_empty() {
    let backend = FakeBackend::start(Fixture {
        fail_with: Some(StatusCode::SERVICE_UNAVAILABLE),
        ..Fixture::default()
    })
    .await;
    let shop = boot_from_feed(&backend).await;

    assert_eq!(backend.hits("feed"), 1);
    assert!(shop.catalog().is_empty());
    assert_eq!(shop.settings().site_title(), "My Website");
}

#[tokio::test]
async fn test_feed_without_entries() {
    let backend = FakeBackend::start(Fixture {
        feed: json!({"feed": {"title": {"$t": "Empty shop"}}}),
        ..Fixture::default()
    })
    .await;
    let shop = boot_from_feed(&backend).await;

    assert!(shop.catalog().is_empty());
    assert_eq!(backend.hits("getProducts"), 0);
}

//! Integration test support for the Fusion storefront.
//!
//! [`FakeBackend`] serves the spreadsheet web-app protocol on a loopback port
//! so the real [`HttpTransport`](fusion_storefront::api::HttpTransport) can be
//! exercised end to end:
//!
//! ```text
//! GET /exec?action=getSettings            -> {"settings": {...}}
//! GET /exec?action=getProducts            -> {"items": [...]}
//! GET /exec?action=getTextMap             -> {"map": {...}}
//! GET /exec?action=saveEntry&entry=<json> -> {"status": "ok"}
//! ```
//!
//! A `callback` parameter wraps the reply as JSONP. `GET /feed` serves a
//! Blogger JSON feed for the feed product source.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fusion-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// What the fake backend serves.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub settings: Value,
    pub products: Value,
    pub text_map: Value,
    /// Blogger feed document served at `/feed`.
    pub feed: Value,
    /// Reply to every `saveEntry`.
    pub save_reply: Value,
    /// When set, every request fails with this status.
    pub fail_with: Option<StatusCode>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            settings: json!({
                "currency_symbol": "$",
                "site_title": "Corner Shop",
                "language": "en",
                "analytics_included": "yes"
            }),
            products: json!([
                {"id": "mug", "title": "Enamel Mug", "price": "12.5", "image": "https://cdn.test/mug.jpg"},
                {"id": "tee", "title": "Cotton Tee", "price": 20, "variants": {"size": ["S", "M", "L"]}},
                {"id": "cap", "title": "Canvas Cap", "price": "15", "discount": "3"}
            ]),
            text_map: json!({
                "CART_TOTAL": {"en": "Total", "fr": "Total"},
                "CHECKOUT": {"en": "Checkout", "fr": "Commander"},
                "SEARCH_RESULTS_FOR": {"en": "results for", "fr": "résultats pour"}
            }),
            feed: json!({"feed": {"entry": [
                {
                    "id": {"$t": "tag:blogger.com,1999:blog-7.post-101"},
                    "title": {"$t": "Clay Bowl"},
                    "content": {"$t": "<p>Hand thrown</p>"},
                    "category": [
                        {"term": "price:18"},
                        {"term": "variant:Color:sand"},
                        {"term": "variant:Color:slate"}
                    ],
                    "media$thumbnail": {"url": "https://img.test/s72-c/bowl.jpg"},
                    "link": [{"rel": "alternate", "href": "https://shop.test/clay-bowl.html"}]
                },
                {
                    "id": {"$t": "tag:blogger.com,1999:blog-7.post-102"},
                    "title": {"$t": "Tea Towel"},
                    "summary": {"$t": "Linen"},
                    "category": [{"term": "price-9"}, {"term": "discount:2"}]
                }
            ]}}),
            save_reply: json!({"status": "ok"}),
            fail_with: None,
        }
    }
}

#[derive(Debug)]
struct Shared {
    fixture: Fixture,
    entries: Mutex<Vec<Value>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// A running fake backend. Stops when dropped.
#[derive(Debug)]
pub struct FakeBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start serving `fixture` on an ephemeral loopback port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(fixture: Fixture) -> Self {
        let shared = Arc::new(Shared {
            fixture,
            entries: Mutex::new(Vec::new()),
            hits: Mutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route("/exec", get(exec))
            .route("/feed", get(feed))
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read local address");

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        Self {
            addr,
            shared,
            server,
        }
    }

    /// Endpoint to configure the storefront with.
    ///
    /// # Panics
    ///
    /// Panics if the address does not form a URL, which cannot happen for a
    /// bound socket.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/exec", self.addr)).expect("Loopback URL is valid")
    }

    /// Feed URL to configure the storefront with.
    ///
    /// # Panics
    ///
    /// Panics if the address does not form a URL, which cannot happen for a
    /// bound socket.
    #[must_use]
    pub fn feed_url(&self) -> Url {
        Url::parse(&format!("http://{}/feed", self.addr)).expect("Loopback URL is valid")
    }

    /// Entries received by `saveEntry`, decoded.
    #[must_use]
    pub fn entries(&self) -> Vec<Value> {
        self.shared
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests seen for `action`.
    #[must_use]
    pub fn hits(&self, action: &str) -> usize {
        self.shared
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(action)
            .copied()
            .unwrap_or(0)
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn feed(
    State(shared): State<Arc<Shared>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    *shared
        .hits
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry("feed".to_string())
        .or_default() += 1;

    if let Some(status) = shared.fixture.fail_with {
        return (status, "feed unavailable").into_response();
    }
    if params.get("alt").map(String::as_str) != Some("json") || !params.contains_key("cb") {
        return (StatusCode::BAD_REQUEST, "expected alt=json and cb").into_response();
    }
    axum::Json(shared.fixture.feed.clone()).into_response()
}

async fn exec(
    State(shared): State<Arc<Shared>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let action = params.get("action").cloned().unwrap_or_default();
    *shared
        .hits
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(action.clone())
        .or_default() += 1;

    if let Some(status) = shared.fixture.fail_with {
        return (status, "backend unavailable").into_response();
    }

    let fixture = &shared.fixture;
    let body = match action.as_str() {
        "getSettings" => json!({"settings": fixture.settings}),
        "getProducts" => json!({"items": fixture.products}),
        "getTextMap" => json!({"map": fixture.text_map}),
        "saveEntry" => match params.get("entry").map(|raw| serde_json::from_str::<Value>(raw)) {
            Some(Ok(entry)) => {
                shared
                    .entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(entry);
                fixture.save_reply.clone()
            }
            Some(Err(_)) => json!({"status": "error", "message": "entry is not JSON"}),
            None => json!({"status": "error", "message": "missing entry"}),
        },
        other => json!({"status": "error", "message": format!("unknown action {other}")}),
    };

    match params.get("callback") {
        Some(callback) => (
            [(header::CONTENT_TYPE, "application/javascript")],
            format!("{callback}({body});"),
        )
            .into_response(),
        None => axum::Json(body).into_response(),
    }
}

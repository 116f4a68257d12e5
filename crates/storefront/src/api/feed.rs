//! Blogger JSON feed as an alternative product source.
//!
//! Each feed entry is a post; labels carry the price, discount and variants
//! (see [`Product::from_feed_post`]).

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use fusion_core::{FeedPost, Product};

use super::ApiError;
use super::http::decode_body;

const ERROR_BODY_LIMIT: usize = 500;

/// Reads products from a Blogger feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: Url,
}

impl FeedClient {
    /// Create a client for the feed at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fusion-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url })
    }

    /// Request URL with a cache-busting stamp.
    ///
    /// A bare feed URL also gets `alt=json`; a URL that already has a query
    /// keeps it as is.
    #[must_use]
    pub fn request_url(&self, stamp_ms: i64) -> Url {
        let mut url = self.url.clone();
        let bare = url.query().is_none_or(str::is_empty);
        {
            let mut query = url.query_pairs_mut();
            if bare {
                query.append_pair("alt", "json");
            }
            query.append_pair("cb", &stamp_ms.to_string());
        }
        url
    }

    /// Fetch and decode every post.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success or
    /// the body is not a feed document.
    #[instrument(skip(self), fields(feed = %self.url))]
    pub async fn posts(&self) -> Result<Vec<FeedPost>, ApiError> {
        let url = self.request_url(chrono::Utc::now().timestamp_millis());
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            error!(status = %status, body = %snippet, "Feed returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let value = decode_body(&body)?;
        let posts = parse_feed(&value)?;
        debug!(entries = posts.len(), "Feed decoded");
        Ok(posts)
    }

    /// Fetch the feed as products. Entries without an id are skipped.
    ///
    /// # Errors
    ///
    /// See [`FeedClient::posts`].
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let posts = self.posts().await?;
        let products: Vec<Product> = posts.iter().filter_map(Product::from_feed_post).collect();
        info!(posts = posts.len(), products = products.len(), "Feed products loaded");
        Ok(products)
    }
}

// =============================================================================
// Feed document
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    feed: FeedBody,
}

#[derive(Debug, Default, Deserialize)]
struct FeedBody {
    #[serde(default)]
    entry: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    id: TextNode,
    #[serde(default)]
    title: TextNode,
    content: Option<TextNode>,
    summary: Option<TextNode>,
    #[serde(default)]
    category: Vec<Category>,
    #[serde(rename = "media$thumbnail")]
    thumbnail: Option<Thumbnail>,
    #[serde(default)]
    link: Vec<Link>,
}

/// Blogger wraps scalar values as `{"$t": "..."}`.
#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$t", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    term: String,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(default)]
    rel: String,
    #[serde(default)]
    href: String,
}

impl From<FeedEntry> for FeedPost {
    fn from(entry: FeedEntry) -> Self {
        let content = entry.content.or(entry.summary).map(|node| node.text).unwrap_or_default();
        Self {
            id: entry.id.text,
            title: entry.title.text,
            content,
            labels: entry
                .category
                .into_iter()
                .map(|c| c.term)
                .filter(|t| !t.is_empty())
                .collect(),
            image: entry.thumbnail.map(|t| t.url).filter(|u| !u.is_empty()),
            url: entry
                .link
                .into_iter()
                .find(|l| l.rel == "alternate")
                .map(|l| l.href),
        }
    }
}

/// Decode the posts of a feed document. A document without entries has no posts.
pub(crate) fn parse_feed(value: &Value) -> Result<Vec<FeedPost>, serde_json::Error> {
    let document = FeedDocument::deserialize(value)?;
    Ok(document.feed.entry.into_iter().map(FeedPost::from).collect())
}

//! Catalog products and Blogger feed normalization.
//!
//! Products come either from the `getProducts` action (already normalized
//! rows) or from a Blogger post feed, where price, discount and variants are
//! encoded as post labels such as `price:99` or `variant:Color:Red`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{self, Price};
use super::variant::{VariantOptions, VariantSelection};

/// Matches `variant:<Type>:<Value>` labels (separators `:`, `-` or space).
static VARIANT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^variant[:\- ]\s*([^:]+)\s*[:\- ]\s*(.+)$").expect("valid variant regex")
});

/// Matches Blogger thumbnail size segments such as `/s72-c/`.
static THUMBNAIL_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/s\d+(-c)?/").expect("valid thumbnail regex"));

/// Size segment substituted for thumbnails.
const FULL_SIZE_SEGMENT: &str = "/s1600/";

/// A sellable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    #[serde(default)]
    pub title: String,
    /// Long description (may contain HTML from the feed).
    #[serde(default)]
    pub description: String,
    /// Primary image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Current unit price.
    #[serde(default, deserialize_with = "price::deserialize_lenient")]
    pub price: Price,
    /// Discount amount, when the post carries one.
    #[serde(default, deserialize_with = "price::deserialize_lenient_opt")]
    pub discount: Option<Price>,
    /// Offered variant values per dimension.
    #[serde(default)]
    pub variants: VariantOptions,
    /// Canonical product page.
    #[serde(default)]
    pub url: Option<String>,
    /// Raw labels.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Product {
    /// Create a product with just the fields required to sell it.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            image: None,
            price,
            discount: None,
            variants: VariantOptions::new(),
            url: None,
            labels: Vec::new(),
        }
    }

    /// The first offered value of every variant dimension.
    #[must_use]
    pub fn default_selection(&self) -> VariantSelection {
        self.variants.first_choices()
    }

    /// Normalize a Blogger post into a product.
    ///
    /// Returns `None` when the post id is blank.
    #[must_use]
    pub fn from_feed_post(post: &FeedPost) -> Option<Self> {
        let raw_id = post
            .id
            .split_once("post-")
            .map_or(post.id.as_str(), |(_, rest)| rest);
        let id = ProductId::parse(raw_id)?;

        Some(Self {
            id,
            title: post.title.clone(),
            description: post.content.clone(),
            image: post
                .image
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(upscale_image),
            price: extract_attribute(&post.labels, "price").unwrap_or(Price::ZERO),
            discount: extract_attribute(&post.labels, "discount"),
            variants: extract_variants(&post.labels),
            url: post.url.clone(),
            labels: post.labels.clone(),
        })
    }
}

/// The subset of a Blogger feed entry used to build a [`Product`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    /// Entry id, e.g. `tag:blogger.com,1999:blog-1.post-42`.
    pub id: String,
    /// Post title.
    pub title: String,
    /// Post body or summary.
    pub content: String,
    /// Post labels (categories).
    pub labels: Vec<String>,
    /// Thumbnail URL.
    pub image: Option<String>,
    /// Alternate link to the post.
    pub url: Option<String>,
}

/// Find a numeric attribute encoded in a label: `price:99`, `Price: 99`,
/// `price-99`.
#[must_use]
pub fn extract_attribute(labels: &[String], key: &str) -> Option<Price> {
    let pattern = format!(r"(?i){}[:\- ]\s*(\d+(?:\.\d+)?)", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;

    labels.iter().find_map(|label| {
        re.captures(label)
            .and_then(|caps| caps.get(1))
            .and_then(|m| Price::parse(m.as_str()).ok())
    })
}

/// Collect `variant:<Type>:<Value>` labels into variant options.
///
/// Types are lowercased; values keep their case and first-seen order.
#[must_use]
pub fn extract_variants(labels: &[String]) -> VariantOptions {
    let mut options = VariantOptions::new();
    for label in labels {
        let Some(caps) = VARIANT_LABEL.captures(label) else {
            continue;
        };
        let (Some(kind), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let kind = kind.as_str().trim().to_lowercase();
        let value = value.as_str().trim();
        if !kind.is_empty() && !value.is_empty() {
            options.push(kind, value);
        }
    }
    options
}

/// Rewrite a Blogger thumbnail URL to its full-size rendition.
#[must_use]
pub fn upscale_image(url: &str) -> String {
    THUMBNAIL_SIZE.replace(url, FULL_SIZE_SEGMENT).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_extract_attribute_variants() {
        let l = labels(&["Shoes", "Price: 99.5"]);
        assert_eq!(extract_attribute(&l, "price"), Price::parse("99.5").ok());

        let l = labels(&["price-12"]);
        assert_eq!(extract_attribute(&l, "price"), Price::parse("12").ok());

        assert_eq!(extract_attribute(&labels(&["sale"]), "discount"), None);
    }

    #[test]
    fn test_extract_variants() {
        let l = labels(&[
            "variant:Color:Red",
            "Variant-Color-Blue",
            "variant:color:Red",
            "variant size XL",
            "unrelated",
        ]);
        let options = extract_variants(&l);
        assert_eq!(options.values("color"), ["Red", "Blue"]);
        assert_eq!(options.values("size"), ["XL"]);
    }

    #[test]
    fn test_upscale_image() {
        assert_eq!(
            upscale_image("https://bp.blogspot.com/a/s72-c/pic.jpg"),
            "https://bp.blogspot.com/a/s1600/pic.jpg"
        );
        assert_eq!(upscale_image("https://cdn/x.jpg"), "https://cdn/x.jpg");
    }

    #[test]
    fn test_from_feed_post() {
        let post = FeedPost {
            id: "tag:blogger.com,1999:blog-1.post-4242".to_string(),
            title: "Linen Shirt".to_string(),
            content: "<p>Soft</p>".to_string(),
            labels: labels(&["price:45", "discount:5", "variant:Size:M"]),
            image: Some("https://bp/s72-c/shirt.jpg".to_string()),
            url: Some("https://shop/linen".to_string()),
        };
        let product = Product::from_feed_post(&post).unwrap();
        assert_eq!(product.id.as_str(), "4242");
        assert_eq!(product.price, Price::parse("45").unwrap());
        assert_eq!(product.discount, Price::parse("5").ok());
        assert_eq!(product.image.as_deref(), Some("https://bp/s1600/shirt.jpg"));
        assert_eq!(product.default_selection().get("size"), Some("M"));
    }

    #[test]
    fn test_deserialize_api_row() {
        let product: Product = serde_json::from_value(json!({
            "id": 7,
            "title": "Candle",
            "price": "8.50",
            "variants": {"scent": ["Cedar", "Fig"]}
        }))
        .unwrap();
        assert_eq!(product.id.as_str(), "7");
        assert_eq!(product.price, Price::parse("8.5").unwrap());
        assert_eq!(product.default_selection().get("scent"), Some("Cedar"));
        assert_eq!(product.discount, None);
    }
}

//! Typed client over a [`Transport`].

use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use fusion_core::{Product, Settings};

use super::{Action, ApiError, SaveAck, Transport};
use crate::i18n::TextMap;

/// Maximum number of cached read responses.
const CACHE_CAPACITY: u64 = 16;

/// Client tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiOptions {
    /// Lifetime of cached read responses.
    pub cache_ttl: Duration,
    /// Deadline applied to every call.
    pub timeout: Duration,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Typed access to the backend actions.
///
/// Read actions are cached; `saveEntry` always goes to the wire. Every call
/// is bounded by [`ApiOptions::timeout`].
pub struct ApiClient<T> {
    transport: T,
    cache: Option<Cache<Action, Value>>,
    timeout: Duration,
}

impl<T: Transport> ApiClient<T> {
    /// Create a client. A zero `cache_ttl` disables caching.
    #[must_use]
    pub fn new(transport: T, options: ApiOptions) -> Self {
        let cache = (!options.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(options.cache_ttl)
                .build()
        });

        Self {
            transport,
            cache,
            timeout: options.timeout,
        }
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform an action under the configured deadline.
    async fn call(&self, action: Action, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        tokio::time::timeout(self.timeout, self.transport.fetch_json(action, params))
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))?
    }

    async fn read(&self, action: Action) -> Result<Value, ApiError> {
        let Some(cache) = &self.cache else {
            return self.call(action, &[]).await;
        };
        if let Some(value) = cache.get(&action).await {
            debug!(%action, "Cache hit");
            return Ok(value);
        }

        let value = self.call(action, &[]).await?;
        cache.insert(action, value.clone()).await;
        Ok(value)
    }

    /// Fetch site settings. A response without `settings` yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn settings(&self) -> Result<Settings, ApiError> {
        let response = self.read(Action::GetSettings).await?;
        Ok(response
            .get("settings")
            .map(Settings::from_json)
            .unwrap_or_default())
    }

    /// Fetch the product catalog. Rows that cannot be decoded are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let response = self.read(Action::GetProducts).await?;
        let Some(Value::Array(rows)) = response.get("items") else {
            return Ok(Vec::new());
        };

        let products: Vec<Product> = rows
            .iter()
            .filter_map(|row| match Product::deserialize(row) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed product row");
                    None
                }
            })
            .collect();

        debug!(count = products.len(), "Products loaded");
        Ok(products)
    }

    /// Fetch the translation table. A response without `map` yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn text_map(&self) -> Result<TextMap, ApiError> {
        let response = self.read(Action::GetTextMap).await?;
        Ok(response
            .get("map")
            .map(TextMap::from_json)
            .unwrap_or_default())
    }

    /// Append one entry to the backend's entries sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded or the request fails.
    /// A delivered but refused entry is an `Ok` with a non-ok [`SaveAck`].
    #[instrument(skip(self, entry))]
    pub async fn save_entry<E: Serialize + Sync>(&self, entry: &E) -> Result<SaveAck, ApiError> {
        let json = serde_json::to_string(entry).map_err(ApiError::Encode)?;
        let response = self.call(Action::SaveEntry, &[("entry", json.as_str())]).await?;
        Ok(SaveAck::from_json(&response))
    }

    /// Drop all cached read responses.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}

impl<T> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("timeout", &self.timeout)
            .field("cached", &self.cache.as_ref().map(Cache::entry_count))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::testing::{Reply, ScriptedTransport};
    use serde_json::json;

    fn client(transport: ScriptedTransport) -> ApiClient<ScriptedTransport> {
        ApiClient::new(transport, ApiOptions::default())
    }

    #[tokio::test]
    async fn test_settings_are_cached() {
        let transport = ScriptedTransport::new()
            .with_default(Action::GetSettings, Reply::Json(json!({"settings": {"site_title": "Shop"}})));
        let api = client(transport);

        assert_eq!(api.settings().await.unwrap().site_title(), "Shop");
        assert_eq!(api.settings().await.unwrap().site_title(), "Shop");
        assert_eq!(api.transport().call_count(Action::GetSettings), 1);

        api.invalidate();
        api.settings().await.unwrap();
        assert_eq!(api.transport().call_count(Action::GetSettings), 2);
    }

    #[tokio::test]
    async fn test_missing_payload_fields_degrade_to_empty() {
        let transport = ScriptedTransport::new()
            .with_default(Action::GetSettings, Reply::Json(json!({})))
            .with_default(Action::GetProducts, Reply::Json(json!({"items": null})))
            .with_default(Action::GetTextMap, Reply::Json(json!(null)));
        let api = client(transport);

        assert!(api.settings().await.unwrap().is_empty());
        assert!(api.products().await.unwrap().is_empty());
        assert!(api.text_map().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_products_skip_bad_rows() {
        let transport = ScriptedTransport::new().with_default(
            Action::GetProducts,
            Reply::Json(json!({"items": [
                {"id": "p1", "title": "Cup", "price": "4.5"},
                {"title": "no id"},
                {"id": 2, "title": "Plate", "price": 9}
            ]})),
        );
        let products = client(transport).products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].id.as_str(), "2");
    }

    #[tokio::test]
    async fn test_save_entry_is_never_cached() {
        let transport = ScriptedTransport::new()
            .with_default(Action::SaveEntry, Reply::Json(json!({"status": "ok"})));
        let api = client(transport);

        assert!(api.save_entry(&json!({"type": "order"})).await.unwrap().is_ok());
        assert!(api.save_entry(&json!({"type": "order"})).await.unwrap().is_ok());
        assert_eq!(api.transport().call_count(Action::SaveEntry), 2);

        let calls = api.transport().calls();
        assert_eq!(calls[0].param("entry"), Some(r#"{"type":"order"}"#));
    }

    #[tokio::test]
    async fn test_failures_propagate_and_are_not_cached() {
        let transport = ScriptedTransport::new()
            .with_reply(Action::GetSettings, Reply::Fail("offline".into()))
            .with_default(Action::GetSettings, Reply::Json(json!({"settings": {"language": "fr"}})));
        let api = client(transport);

        assert!(matches!(api.settings().await, Err(ApiError::Unavailable(_))));
        assert_eq!(api.settings().await.unwrap().language(), "fr");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_transport_times_out() {
        let transport = ScriptedTransport::new().with_default(Action::SaveEntry, Reply::Hang);
        let api = ApiClient::new(
            transport,
            ApiOptions {
                timeout: Duration::from_secs(2),
                ..ApiOptions::default()
            },
        );
        let result = api.save_entry(&json!({})).await;
        assert!(matches!(result, Err(ApiError::Timeout(d)) if d == Duration::from_secs(2)));
    }
}

//! `reqwest` transport.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, instrument};
use url::Url;

use super::{Action, ApiError, Transport};

/// Characters of an error body kept in logs and errors.
const ERROR_BODY_LIMIT: usize = 500;

/// HTTP transport to the deployed web app.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    callback: Option<String>,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a client-level timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fusion-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            callback: None,
        })
    }

    /// Ask the backend for JSONP wrapped in `name(...)`.
    #[must_use]
    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into());
        self
    }

    /// The configured endpoint.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full request URL for an action.
    #[must_use]
    pub fn request_url(&self, action: Action, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", action.as_str());
            for (name, value) in params {
                query.append_pair(name, value);
            }
            if let Some(callback) = &self.callback {
                query.append_pair("callback", callback);
            }
        }
        url
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, params), fields(action = %action))]
    async fn fetch_json(&self, action: Action, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.request_url(action, params);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        // Text first so failures can be logged with the body
        let body = response.text().await?;

        if !status.is_success() {
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            error!(status = %status, body = %snippet, "Backend returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        match decode_body(&body) {
            Ok(value) => {
                debug!(bytes = body.len(), "Response decoded");
                Ok(value)
            }
            Err(e) => {
                error!(
                    error = %e,
                    body = %body.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }
}

/// Decode a JSON or JSONP body.
///
/// JSONP is recognized as `<callback>(<json>)` with an optional trailing `;`,
/// where the callback is a dotted identifier.
pub(crate) fn decode_body(body: &str) -> Result<Value, serde_json::Error> {
    let trimmed = body.trim();
    let payload = strip_jsonp(trimmed).unwrap_or(trimmed);
    serde_json::from_str(payload)
}

fn strip_jsonp(body: &str) -> Option<&str> {
    let (callback, rest) = body.split_once('(')?;
    let callback = callback.trim();
    let is_identifier = !callback.is_empty()
        && callback
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
    if !is_identifier {
        return None;
    }

    let rest = rest.trim_end();
    let rest = rest.strip_suffix(';').unwrap_or(rest).trim_end();
    rest.strip_suffix(')')
}

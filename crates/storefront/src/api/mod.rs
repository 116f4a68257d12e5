//! Remote API transport for the spreadsheet-backed web app.
//!
//! # Architecture
//!
//! - Every call is `GET {base}?action=<name>&<params>`; the backend answers
//!   with JSON, or JSONP when a `callback` parameter is present
//! - [`Transport`] is the seam between the typed [`ApiClient`] and the wire
//! - [`HttpTransport`] is the `reqwest` implementation
//! - Read actions are cached by the client via `moka`; writes never are
//! - [`FeedClient`] reads products from a Blogger JSON feed instead of `getProducts`
//!
//! # Payloads
//!
//! | Action | Response shape |
//! |--------|----------------|
//! | `getSettings` | `{"settings": {key: value}}` |
//! | `getProducts` | `{"items": [product, ...]}` |
//! | `getTextMap` | `{"map": {key: {lang: text}}}` |
//! | `saveEntry` | `{"status": "ok" \| "error", "message": ...}` |

mod client;
mod feed;
mod http;
#[cfg(test)]
pub mod testing;

use core::fmt;
use core::future::Future;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub use client::{ApiClient, ApiOptions};
pub use feed::FeedClient;
pub use http::HttpTransport;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// No response within the deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request payload could not be encoded.
    #[error("Failed to encode request: {0}")]
    Encode(serde_json::Error),

    /// The transport could not deliver the request.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Backend actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetSettings,
    GetProducts,
    GetTextMap,
    SaveEntry,
}

impl Action {
    /// Wire name sent as the `action` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetSettings => "getSettings",
            Self::GetProducts => "getProducts",
            Self::GetTextMap => "getTextMap",
            Self::SaveEntry => "saveEntry",
        }
    }

    /// Whether responses may be served from cache.
    #[must_use]
    pub const fn is_read(self) -> bool {
        !matches!(self, Self::SaveEntry)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivers one action to the backend and returns the decoded JSON body.
pub trait Transport: Send + Sync {
    /// Perform `action` with extra query parameters.
    fn fetch_json(
        &self,
        action: Action,
        params: &[(&str, &str)],
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// Outcome reported by `saveEntry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Ok,
    Error,
    /// Missing or unrecognized status.
    Unknown,
}

/// Decoded `saveEntry` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAck {
    pub status: AckStatus,
    pub message: Option<String>,
}

impl SaveAck {
    /// Read an acknowledgement from a response body.
    ///
    /// The message comes from `message`, falling back to `error`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let status = match value.get("status").and_then(Value::as_str) {
            Some(s) if s.eq_ignore_ascii_case("ok") => AckStatus::Ok,
            Some(s) if s.eq_ignore_ascii_case("error") => AckStatus::Error,
            _ => AckStatus::Unknown,
        };
        let message = ["message", "error"]
            .iter()
            .find_map(|field| value.get(*field).and_then(Value::as_str))
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ToString::to_string);

        Self { status, message }
    }

    /// Whether the backend accepted the entry.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == AckStatus::Ok
    }
}

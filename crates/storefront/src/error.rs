//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for the operations exposed to binaries.
//! [`AppError::capture`] reports server-side failures to Sentry before the
//! caller surfaces them.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::SubmitError;
use crate::config::ConfigError;
use crate::render::RenderError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout did not complete.
    #[error("Checkout error: {0}")]
    Checkout(#[from] SubmitError),

    /// Rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the failure is ours rather than the user's.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Api(_) | Self::Render(_) | Self::Config(_))
    }

    /// Report internal failures to Sentry and log them.
    pub fn capture(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::warn!(error = %self, "Storefront request failed");
        }
    }

    /// Text suitable for the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Checkout(e) => e.user_message(),
            Self::Storage(_) | Self::Api(_) | Self::Render(_) => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for debugging context.
pub fn add_breadcrumb(category: &str, message: &str, level: sentry::Level) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level,
        ..Default::default()
    });
}

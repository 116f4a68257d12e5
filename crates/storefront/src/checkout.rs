//! Checkout: sends the cart to the backend as one entry row per line item.
//!
//! # States
//!
//! ```text
//! Idle ──open──▶ FieldsVisible ──submit──▶ Submitting ──ok──▶ Idle (cart cleared)
//!                      ▲                        │
//!                      └────────── error ───────┘
//! ```
//!
//! Validation happens before any network call. Rows share one timestamp and
//! one order reference; a retry after a partial failure reuses the reference
//! so the backend sheet can be deduplicated.

use core::fmt;

use chrono::{SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use fusion_core::LineItem;

use crate::api::{AckStatus, ApiClient, ApiError, Transport};
use crate::cart::Cart;
use crate::storage::KeyValueStore;

/// Shown after every row was accepted.
pub const ORDER_SUCCESS_MESSAGE: &str = "Order submitted successfully! We will contact you soon.";

/// Shown when any row failed.
pub const ORDER_FAILURE_MESSAGE: &str = "Could not submit order. Please try again.";

/// Shown when required contact fields are blank.
pub const VALIDATION_MESSAGE: &str = "Please fill in your name and phone number.";

/// Entry type of order rows.
const ORDER_ENTRY_TYPE: &str = "order";

// =============================================================================
// Contact details
// =============================================================================

/// Required contact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Phone,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Phone => "phone",
        })
    }
}

/// What the shopper typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
}

impl ContactDetails {
    /// A copy with every field trimmed.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    /// Required fields that are blank after trimming.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ContactField> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push(ContactField::Name);
        }
        if self.phone.trim().is_empty() {
            missing.push(ContactField::Phone);
        }
        missing
    }

    /// The trimmed details, or the blank required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Validation`] if name or phone is blank.
    pub fn validate(&self) -> Result<Self, SubmitError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(self.trimmed())
        } else {
            Err(SubmitError::Validation(missing))
        }
    }
}

// =============================================================================
// Order rows
// =============================================================================

/// One `saveEntry` row for one line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderEntry {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub order_ref: String,
    pub product_id: String,
    pub title: String,
    /// Variant selection as a JSON string, empty without variants.
    pub variants: String,
    pub qty: u32,
    pub price: f64,
    /// Line total rounded to 2 decimal places.
    pub total: f64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl OrderEntry {
    /// Build the row for a line item.
    #[must_use]
    pub fn new(item: &LineItem, contact: &ContactDetails, timestamp: &str, order_ref: Uuid) -> Self {
        let variants = if item.variants.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&item.variants).unwrap_or_default()
        };

        Self {
            timestamp: timestamp.to_string(),
            kind: ORDER_ENTRY_TYPE,
            order_ref: order_ref.to_string(),
            product_id: item.id.to_string(),
            title: item.title.clone(),
            variants,
            qty: item.quantity(),
            price: item.unit_price.amount().to_f64().unwrap_or_default(),
            total: item.line_total().rounded().to_f64().unwrap_or_default(),
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            message: contact.message.clone(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Why a submission did not complete.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Required fields are blank; nothing was sent.
    #[error("Missing required fields: {}", join_fields(.0))]
    Validation(Vec<ContactField>),

    /// There is nothing to submit.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout fields are not open.
    #[error("Checkout is not open")]
    NotReady,

    /// A row could not be delivered.
    #[error("Network error: {0}")]
    Network(#[from] ApiError),

    /// The backend refused a row.
    #[error("Order rejected: {message}")]
    Rejected { message: String },
}

impl SubmitError {
    /// Text shown to the shopper. A backend refusal carries its own reason.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => VALIDATION_MESSAGE.to_string(),
            Self::Rejected { message } => format!("{ORDER_FAILURE_MESSAGE} ({message})"),
            _ => ORDER_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Whether submitting again may succeed without changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Rejected { .. })
    }
}

fn join_fields(fields: &[ContactField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Flow
// =============================================================================

/// Checkout UI state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutState {
    /// Fields hidden.
    #[default]
    Idle,
    /// Contact fields shown, submit enabled.
    FieldsVisible,
    /// Rows in flight, submit disabled.
    Submitting,
}

/// Result of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub order_ref: Uuid,
    pub rows: usize,
}

impl CheckoutReceipt {
    /// Text shown to the shopper.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        ORDER_SUCCESS_MESSAGE
    }
}

/// Tone of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Dismissible outcome message of the last submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Checkout state machine.
#[derive(Debug, Default)]
pub struct CheckoutFlow {
    state: CheckoutState,
    order_ref: Option<Uuid>,
    notice: Option<Notice>,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// Whether the submit control should accept clicks.
    #[must_use]
    pub fn submit_enabled(&self) -> bool {
        self.state == CheckoutState::FieldsVisible
    }

    /// Reference of the pending order, kept across failed attempts.
    #[must_use]
    pub const fn order_ref(&self) -> Option<Uuid> {
        self.order_ref
    }

    /// Outcome of the last submission, until dismissed.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Hide the outcome message.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Show the contact fields. Does nothing for an empty cart.
    pub fn open<S: KeyValueStore>(&mut self, cart: &Cart<S>) -> bool {
        if cart.is_empty() {
            return false;
        }
        self.notice = None;
        if self.state == CheckoutState::Idle {
            self.state = CheckoutState::FieldsVisible;
        }
        true
    }

    /// Hide the contact fields and forget the pending order.
    pub fn close(&mut self) {
        self.state = CheckoutState::Idle;
        self.order_ref = None;
    }

    /// Submit the cart.
    ///
    /// Rows are sent one at a time, stopping at the first failure. On success
    /// the cart is cleared and the flow returns to `Idle`; on any failure the
    /// cart is kept and the flow returns to `FieldsVisible`. Dropping the
    /// future mid-submission also returns to `FieldsVisible`. The outcome is
    /// kept as a [`Notice`] for the cart region.
    ///
    /// # Errors
    ///
    /// Returns an error if the flow is not open, the cart is empty, contact
    /// details are incomplete, or a row is not accepted.
    pub async fn submit<S: KeyValueStore, T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        cart: &mut Cart<S>,
        details: &ContactDetails,
    ) -> Result<CheckoutReceipt, SubmitError> {
        let result = self.send(api, cart, details).await;
        self.notice = Some(match &result {
            Ok(receipt) => Notice {
                kind: NoticeKind::Success,
                text: receipt.user_message().to_string(),
            },
            Err(e) => Notice {
                kind: NoticeKind::Error,
                text: e.user_message(),
            },
        });
        result
    }

    #[instrument(skip_all, fields(lines = cart.items().len()))]
    async fn send<S: KeyValueStore, T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        cart: &mut Cart<S>,
        details: &ContactDetails,
    ) -> Result<CheckoutReceipt, SubmitError> {
        if self.state != CheckoutState::FieldsVisible {
            return Err(SubmitError::NotReady);
        }
        if cart.is_empty() {
            self.close();
            return Err(SubmitError::EmptyCart);
        }
        let contact = details.validate()?;

        let order_ref = *self.order_ref.get_or_insert_with(Uuid::new_v4);
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let entries: Vec<OrderEntry> = cart
            .items()
            .iter()
            .map(|item| OrderEntry::new(item, &contact, &timestamp, order_ref))
            .collect();

        let guard = SubmissionGuard::begin(&mut self.state);
        for (row, entry) in entries.iter().enumerate() {
            let ack = match api.save_entry(entry).await {
                Ok(ack) => ack,
                Err(e) => {
                    warn!(%order_ref, row, error = %e, "Order row not delivered");
                    return Err(SubmitError::Network(e));
                }
            };
            if ack.status != AckStatus::Ok {
                let message = ack
                    .message
                    .unwrap_or_else(|| format!("unexpected status {:?}", ack.status));
                warn!(%order_ref, row, %message, "Order row rejected");
                return Err(SubmitError::Rejected { message });
            }
        }
        guard.finish();

        self.order_ref = None;
        cart.clear();
        info!(%order_ref, rows = entries.len(), "Order submitted");

        Ok(CheckoutReceipt {
            order_ref,
            rows: entries.len(),
        })
    }
}

/// Holds the flow in `Submitting`; falls back to `FieldsVisible` unless finished.
struct SubmissionGuard<'a> {
    state: &'a mut CheckoutState,
    finished: bool,
}

impl<'a> SubmissionGuard<'a> {
    fn begin(state: &'a mut CheckoutState) -> Self {
        *state = CheckoutState::Submitting;
        Self {
            state,
            finished: false,
        }
    }

    fn finish(mut self) {
        *self.state = CheckoutState::Idle;
        self.finished = true;
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.state = CheckoutState::FieldsVisible;
        }
    }
}

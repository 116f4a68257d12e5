//! Product search and search analytics.
//!
//! Search is a case-insensitive substring match on product titles. When the
//! site opts into analytics, each query of at least [`MIN_LOGGED_CHARS`]
//! characters is appended to the backend entries sheet.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use fusion_core::{Product, Settings};

use crate::api::{ApiClient, Transport};
use crate::i18n::{Translator, keys};

/// Shortest term that is logged.
pub const MIN_LOGGED_CHARS: usize = 2;

/// Entry type of search rows.
const SEARCH_ENTRY_TYPE: &str = "search_query";

/// Normalize a raw search input: trimmed, lowercased.
#[must_use]
pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Products whose title contains `term`, ignoring case. An empty term matches all.
#[must_use]
pub fn search<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let term = normalize_term(term);
    products
        .iter()
        .filter(|p| term.is_empty() || p.title.to_lowercase().contains(&term))
        .collect()
}

/// Status line shown above the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    /// No term: the line is hidden.
    Hidden,
    /// `"<count> <results for> \"<term>\""`.
    Results(String),
}

impl SearchStatus {
    /// Status for a term and its result count.
    #[must_use]
    pub fn new(term: &str, count: usize, translator: &Translator) -> Self {
        let term = normalize_term(term);
        if term.is_empty() {
            return Self::Hidden;
        }
        let label = translator.get(keys::SEARCH_RESULTS_FOR);
        Self::Results(format!("{count} {label} \"{term}\""))
    }

    /// Visible text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Hidden => None,
            Self::Results(text) => Some(text.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchEntry<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    term: &'a str,
    timestamp: String,
}

/// Logs search terms when analytics is enabled.
#[derive(Debug, Clone, Copy)]
pub struct SearchLogger {
    enabled: bool,
}

impl SearchLogger {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            enabled: settings.analytics_enabled(),
        }
    }

    /// Whether a term would be logged.
    #[must_use]
    pub fn should_log(&self, term: &str) -> bool {
        self.enabled && normalize_term(term).chars().count() >= MIN_LOGGED_CHARS
    }

    /// Send a term to the backend. Failures are logged and swallowed.
    ///
    /// Returns whether an entry was accepted.
    #[instrument(skip(self, api))]
    pub async fn log<T: Transport>(&self, api: &ApiClient<T>, term: &str) -> bool {
        if !self.should_log(term) {
            return false;
        }
        let term = normalize_term(term);
        let entry = SearchEntry {
            kind: SEARCH_ENTRY_TYPE,
            term: &term,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        match api.save_entry(&entry).await {
            Ok(ack) if ack.is_ok() => {
                debug!("Search query logged");
                true
            }
            Ok(ack) => {
                warn!(status = ?ack.status, message = ?ack.message, "Search query not logged");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to log search query");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::testing::{Reply, ScriptedTransport};
    use crate::api::{Action, ApiOptions};
    use crate::i18n::TextMap;
    use fusion_core::{Price, ProductId};
    use serde_json::{Value, json};

    fn products() -> Vec<Product> {
        ["Linen Shirt", "Silk SHIRT", "Mug"]
            .iter()
            .enumerate()
            .map(|(i, title)| {
                Product::new(ProductId::parse(&i.to_string()).unwrap(), *title, Price::ZERO)
            })
            .collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let all = products();
        let hits = search(&all, "  shirt ");
        assert_eq!(hits.len(), 2);
        assert_eq!(search(&all, "").len(), 3);
        assert!(search(&all, "vase").is_empty());
    }

    #[test]
    fn test_status_line() {
        let mut map = TextMap::default();
        map.insert("SEARCH_RESULTS_FOR", "fr", "résultats pour");
        let t = Translator::new(map, "fr");
        assert_eq!(SearchStatus::new("  ", 3, &t), SearchStatus::Hidden);
        assert_eq!(
            SearchStatus::new("Shirt", 2, &t).text(),
            Some("2 résultats pour \"shirt\"")
        );
    }

    #[test]
    fn test_should_log() {
        let on = SearchLogger::new(&Settings::from_json(&json!({"analytics_included": "yes"})));
        let off = SearchLogger::new(&Settings::default());
        assert!(on.should_log("ab"));
        assert!(!on.should_log(" a "));
        assert!(!off.should_log("shirt"));
    }

    #[tokio::test]
    async fn test_log_sends_entry() {
        let api = ApiClient::new(
            ScriptedTransport::new().with_default(Action::SaveEntry, Reply::Json(json!({"status": "ok"}))),
            ApiOptions::default(),
        );
        let logger = SearchLogger::new(&Settings::from_json(&json!({"analytics_included": "yes"})));
        assert!(logger.log(&api, "Shirt").await);

        let calls = api.transport().calls();
        let entry: Value = serde_json::from_str(calls[0].param("entry").unwrap()).unwrap();
        assert_eq!(entry["type"], "search_query");
        assert_eq!(entry["term"], "shirt");
    }

    #[tokio::test]
    async fn test_log_failure_is_swallowed() {
        let api = ApiClient::new(
            ScriptedTransport::new().with_default(Action::SaveEntry, Reply::Fail("down".into())),
            ApiOptions::default(),
        );
        let logger = SearchLogger::new(&Settings::from_json(&json!({"analytics_included": "yes"})));
        assert!(!logger.log(&api, "shirt").await);
    }

    #[tokio::test]
    async fn test_disabled_logger_sends_nothing() {
        let api = ApiClient::new(ScriptedTransport::new(), ApiOptions::default());
        assert!(!SearchLogger::new(&Settings::default()).log(&api, "shirt").await);
        assert_eq!(api.transport().call_count(Action::SaveEntry), 0);
    }
}

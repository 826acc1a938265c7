//! Find-help search snapshot persistence and the back-to-search link.
//!
//! One snapshot slot exists per session; the last write wins. Without a
//! storage backend (server-side rendering, CLI one-shots) every operation is
//! a no-op that reports "nothing stored".

use std::sync::Arc;

use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::model::{FindHelpSearchState, DEFAULT_RADIUS_KM};
use crate::storage::SessionStorage;

/// Storage key of the single snapshot slot.
pub const SEARCH_STATE_KEY: &str = "ssn-find-help-search-state";

/// Snapshots this old or older are never restored.
pub const STALE_AFTER_MS: i64 = 10 * 60 * 1000;

const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone, Default)]
pub struct SearchStatePersistence {
    storage: Option<Arc<dyn SessionStorage>>,
}

impl std::fmt::Debug for SearchStatePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchStatePersistence")
            .field("storage", &self.storage.as_ref().map(|_| "[session]"))
            .finish()
    }
}

impl SearchStatePersistence {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Persistence with no backing storage.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    /// Stamps `state` with the current time and writes it to the slot.
    pub fn save(&self, state: &FindHelpSearchState) {
        self.save_at(state, Utc::now().timestamp_millis());
    }

    pub fn save_at(&self, state: &FindHelpSearchState, now_ms: i64) {
        let Some(storage) = &self.storage else {
            return;
        };
        let mut stamped = state.clone();
        stamped.timestamp = now_ms;
        match serde_json::to_string(&stamped) {
            Ok(json) => {
                storage.set_item(SEARCH_STATE_KEY, json);
                tracing::debug!(
                    services = stamped.services.len(),
                    "saved find-help search snapshot"
                );
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize search snapshot"),
        }
    }

    /// Returns the stored snapshot unless it is stale or unreadable.
    ///
    /// Does not remove the snapshot; callers decide when to [`clear`](Self::clear).
    #[must_use]
    pub fn load(&self) -> Option<FindHelpSearchState> {
        self.load_at(Utc::now().timestamp_millis())
    }

    #[must_use]
    pub fn load_at(&self, now_ms: i64) -> Option<FindHelpSearchState> {
        let raw = self.storage.as_ref()?.get_item(SEARCH_STATE_KEY)?;
        let state: FindHelpSearchState = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable search snapshot");
                return None;
            }
        };
        let age_ms = now_ms - state.timestamp;
        if age_ms >= STALE_AFTER_MS {
            tracing::debug!(age_ms, "search snapshot is stale");
            return None;
        }
        Some(state)
    }

    pub fn clear(&self) {
        if let Some(storage) = &self.storage {
            storage.remove_item(SEARCH_STATE_KEY);
        }
    }

    /// Clears the slot only while it still holds the snapshot stamped
    /// `timestamp`. Returns whether anything was removed.
    pub fn clear_if_saved_at(&self, timestamp: i64) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        let stored_at = storage
            .get_item(SEARCH_STATE_KEY)
            .and_then(|raw| serde_json::from_str::<FindHelpSearchState>(&raw).ok())
            .map(|state| state.timestamp);
        if stored_at == Some(timestamp) {
            storage.remove_item(SEARCH_STATE_KEY);
            true
        } else {
            tracing::debug!(
                restored_at = timestamp,
                ?stored_at,
                "snapshot replaced since restore, keeping it"
            );
            false
        }
    }

    /// `true` when a fresh snapshot written by the results page exists, i.e.
    /// the visitor reached the current page from a search.
    #[must_use]
    pub fn is_from_organisation_page(&self) -> bool {
        self.is_from_organisation_page_at(Utc::now().timestamp_millis())
    }

    #[must_use]
    pub fn is_from_organisation_page_at(&self, now_ms: i64) -> bool {
        self.load_at(now_ms).is_some_and(|s| s.from_results_page)
    }

    /// Back-to-search link for an organisation page, when one applies.
    #[must_use]
    pub fn back_link_at(&self, now_ms: i64) -> Option<String> {
        self.load_at(now_ms)
            .filter(|s| s.from_results_page)
            .map(|s| back_to_search_url(&s))
    }
}

/// Rebuilds the results-page URL from a snapshot.
///
/// `lat`/`lng` are written as plain decimal literals; `radius` is omitted
/// when it equals the default.
#[must_use]
pub fn back_to_search_url(state: &FindHelpSearchState) -> String {
    let mut url = format!("/find-help?lat={}&lng={}", state.lat, state.lng);
    let mut push = |key: &str, value: &str| {
        url.push('&');
        url.push_str(key);
        url.push('=');
        url.extend(utf8_percent_encode(value, QUERY_VALUE));
    };
    if !state.selected_category.is_empty() {
        push("category", &state.selected_category);
    }
    if !state.selected_sub_category.is_empty() {
        push("subCategory", &state.selected_sub_category);
    }
    if (state.radius - DEFAULT_RADIUS_KM).abs() >= f64::EPSILON {
        push("radius", &state.radius.to_string());
    }
    if let Some(slug) = state.location_slug.as_deref().filter(|s| !s.is_empty()) {
        push("location", slug);
    }
    url
}

#[cfg(test)]
#[path = "search_state_test.rs"]
mod tests;

//! Application-scoped state of the find-help results page.
//!
//! [`FindHelpSession`] owns the selected location, filters and fetched
//! services, runs searches through [`ServiceQueryClient`] and turns every
//! failure into a [`SearchStatus`] with at least one way forward. Each
//! search holds a [`GenerationToken`]; results whose token went stale are
//! dropped instead of overwriting newer state.

use std::time::Duration;

use ssn_core::{
    filter, markers, CategoryTaxonomy, FindHelpSearchState, Location, Marker,
    SearchStatePersistence, ServiceFilters, ServiceWithDistance, SortOrder,
};

use crate::client::{FetchOutcome, ServiceQueryClient, DEFAULT_LIMIT};
use crate::debounce::FilterDebouncer;
use crate::error::QueryError;
use crate::generation::{GenerationToken, RequestGeneration};
use crate::retry::{RetryBudget, RETRY_EXHAUSTED_MESSAGE};

/// How long a restored snapshot stays in storage before it is cleared.
pub const RESTORE_CLEAR_DELAY: Duration = Duration::from_secs(1);

/// Forward paths offered alongside a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Retry,
    ChangeLocation,
    BrowseAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The unfiltered fallback answered; results are shown with `notice`.
    Fallback { notice: String },
    Failed {
        error: QueryError,
        message: String,
        actions: Vec<RecoveryAction>,
    },
}

/// Which query the last search ran; [`FindHelpSession::retry`] repeats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Services around the current location.
    Nearby,
    /// Every service, without the location filter.
    Listing,
}

/// Category and subcategory picked together in the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    pub category: String,
    pub sub_category: String,
}

/// A search that has been started but not yet applied.
#[derive(Debug, Clone)]
pub struct PendingSearch {
    token: GenerationToken,
    /// `None` for an unfiltered listing.
    pub location: Option<Location>,
    pub category: String,
}

impl PendingSearch {
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.token.is_current()
    }

    /// Runs the query this search describes.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`QueryError`].
    pub async fn run(&self, client: &ServiceQueryClient) -> Result<FetchOutcome, QueryError> {
        let category = Some(self.category.as_str());
        match &self.location {
            Some(location) => client.fetch_services(location, category).await,
            None => client
                .fetch_all(category, DEFAULT_LIMIT)
                .await
                .map(|services| FetchOutcome {
                    services,
                    notice: None,
                    used_fallback: false,
                }),
        }
    }
}

#[derive(Debug)]
pub struct FindHelpSession {
    client: ServiceQueryClient,
    taxonomy: CategoryTaxonomy,
    persistence: SearchStatePersistence,
    generation: RequestGeneration,
    retry_budget: RetryBudget,
    debouncer: FilterDebouncer,
    last_search: Option<SearchKind>,
    location: Option<Location>,
    location_slug: Option<String>,
    filters: ServiceFilters,
    sort_order: SortOrder,
    show_map: bool,
    current_page: u32,
    services: Vec<ServiceWithDistance>,
    /// Category sent with the query that produced `services`.
    fetched_category: Option<String>,
    status: SearchStatus,
}

impl FindHelpSession {
    #[must_use]
    pub fn new(
        client: ServiceQueryClient,
        taxonomy: CategoryTaxonomy,
        persistence: SearchStatePersistence,
    ) -> Self {
        Self {
            client,
            taxonomy,
            persistence,
            generation: RequestGeneration::new(),
            retry_budget: RetryBudget::default(),
            debouncer: FilterDebouncer::default(),
            last_search: None,
            location: None,
            location_slug: None,
            filters: ServiceFilters::default(),
            sort_order: SortOrder::default_for(None),
            show_map: false,
            current_page: 0,
            services: Vec::new(),
            fetched_category: None,
            status: SearchStatus::Idle,
        }
    }

    #[must_use]
    pub fn with_retry_budget(mut self, budget: RetryBudget) -> Self {
        self.retry_budget = budget;
        self
    }

    #[must_use]
    pub fn with_filter_debouncer(mut self, debouncer: FilterDebouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    #[must_use]
    pub fn client(&self) -> &ServiceQueryClient {
        &self.client
    }

    #[must_use]
    pub fn taxonomy(&self) -> &CategoryTaxonomy {
        &self.taxonomy
    }

    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    #[must_use]
    pub fn filters(&self) -> &ServiceFilters {
        &self.filters
    }

    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    #[must_use]
    pub fn show_map(&self) -> bool {
        self.show_map
    }

    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Services as fetched, before filtering.
    #[must_use]
    pub fn services(&self) -> &[ServiceWithDistance] {
        &self.services
    }

    #[must_use]
    pub fn last_search(&self) -> Option<SearchKind> {
        self.last_search
    }

    #[must_use]
    pub fn retry_budget(&self) -> &RetryBudget {
        &self.retry_budget
    }

    /// Switches location. In-flight searches for the old location go stale.
    pub fn set_location(&mut self, location: Location, slug: Option<String>) {
        self.generation.invalidate();
        self.location = Some(location);
        self.location_slug = slug;
        self.sort_order = SortOrder::Distance;
        self.current_page = 0;
    }

    /// Selects a category and reports whether the fetched services must be
    /// refreshed. Services fetched for all categories can be filtered
    /// locally; services fetched for another category cannot.
    pub fn set_category(&mut self, category: &str) -> bool {
        self.filters.select_category(category, &self.taxonomy);
        self.current_page = 0;
        if self.location.is_none() {
            return false;
        }
        match &self.fetched_category {
            None => true,
            Some(fetched) => !fetched.is_empty() && fetched != category,
        }
    }

    /// Selects a subcategory; one that does not belong to the selected
    /// category resets to "all".
    pub fn set_sub_category(&mut self, sub_category: &str) {
        let valid = sub_category.is_empty()
            || self.filters.category.is_empty()
            || self
                .taxonomy
                .has_sub_category(&self.filters.category, sub_category);
        if valid {
            sub_category.clone_into(&mut self.filters.sub_category);
        } else {
            tracing::debug!(
                category = %self.filters.category,
                sub_category,
                "subcategory not under selected category, resetting"
            );
            self.filters.sub_category.clear();
        }
        self.current_page = 0;
    }

    /// Waits out the filter debounce for `selection`. Resolves to `None` when
    /// a later selection arrived in the meantime.
    pub async fn settle_selection(&self, selection: CategorySelection) -> Option<CategorySelection> {
        self.debouncer.settle(selection).await
    }

    /// Applies a settled selection and reports whether the fetched services
    /// must be refreshed.
    pub fn apply_selection(&mut self, selection: &CategorySelection) -> bool {
        let refetch = self.set_category(&selection.category);
        self.set_sub_category(&selection.sub_category);
        refetch
    }

    /// Debounced [`apply_selection`](Self::apply_selection). `None` when the
    /// selection was superseded and nothing changed.
    pub async fn select(&mut self, selection: CategorySelection) -> Option<bool> {
        let settled = self.settle_selection(selection).await?;
        Some(self.apply_selection(&settled))
    }

    pub fn set_client_groups(&mut self, groups: Vec<String>) {
        self.filters.client_groups = groups;
        self.current_page = 0;
    }

    pub fn set_open_now(&mut self, open_now: bool) {
        self.filters.open_now = open_now;
        self.current_page = 0;
    }

    pub fn set_timetable_days(&mut self, days: Vec<u8>) {
        self.filters.timetable_days = days;
        self.current_page = 0;
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
    }

    pub fn set_page(&mut self, page: u32) {
        self.current_page = page;
    }

    /// Returns the new map visibility.
    pub fn toggle_map(&mut self) -> bool {
        self.show_map = !self.show_map;
        self.show_map
    }

    /// Marks a location search as started and returns its handle, or `None`
    /// when no location is set. Any earlier pending search goes stale.
    pub fn begin_search(&mut self) -> Option<PendingSearch> {
        let location = self.location.clone()?;
        self.status = SearchStatus::Loading;
        self.last_search = Some(SearchKind::Nearby);
        Some(PendingSearch {
            token: self.generation.begin(),
            location: Some(location),
            category: self.filters.category.clone(),
        })
    }

    /// Applies a finished search. Returns `false`, leaving state untouched,
    /// when a newer search or location change superseded it.
    pub fn complete_search(
        &mut self,
        pending: &PendingSearch,
        result: Result<FetchOutcome, QueryError>,
    ) -> bool {
        if !pending.is_current() {
            tracing::debug!(
                generation = pending.token.id(),
                "discarding stale search result"
            );
            return false;
        }

        match result {
            Ok(outcome) => {
                tracing::info!(
                    services = outcome.services.len(),
                    fallback = outcome.used_fallback,
                    "search completed"
                );
                self.services = outcome.services;
                self.fetched_category = Some(pending.category.clone());
                self.current_page = 0;
                self.retry_budget.reset();
                self.status = match outcome.notice {
                    Some(notice) => SearchStatus::Fallback { notice },
                    None => SearchStatus::Ready,
                };
            }
            Err(error) => {
                tracing::warn!(error = %error, "search failed");
                self.status = self.failure(error);
            }
        }
        true
    }

    /// Searches around the current location. Returns whether the result was
    /// applied.
    pub async fn search(&mut self) -> bool {
        let Some(pending) = self.begin_search() else {
            tracing::debug!("search requested without a location");
            return false;
        };
        let result = pending.run(&self.client).await;
        self.complete_search(&pending, result)
    }

    /// Caller-initiated retry of the last search, nearby or listing. Waits
    /// out the budget's delay first; once the budget is spent the status
    /// becomes a terminal failure without a retry action.
    pub async fn retry(&mut self) -> bool {
        let Some(delay) = self.retry_budget.next_delay() else {
            if let SearchStatus::Failed { error, .. } = &self.status {
                self.status = self.failure(error.clone());
            }
            return false;
        };
        tracing::info!(
            attempt = self.retry_budget.attempts(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "retrying search"
        );
        tokio::time::sleep(delay).await;
        match self.last_search {
            Some(SearchKind::Listing) => self.browse_all().await,
            Some(SearchKind::Nearby) | None => self.search().await,
        }
    }

    /// Lists services without the location filter.
    pub async fn browse_all(&mut self) -> bool {
        self.status = SearchStatus::Loading;
        self.last_search = Some(SearchKind::Listing);
        let pending = PendingSearch {
            token: self.generation.begin(),
            location: None,
            category: String::new(),
        };
        let result = pending.run(&self.client).await;
        self.complete_search(&pending, result)
    }

    /// Fetched services after filters and sort order.
    #[must_use]
    pub fn visible_services(&self) -> Vec<ServiceWithDistance> {
        filter::apply(
            &self.services,
            &self.filters,
            self.sort_order,
            self.location.as_ref().map(Location::coordinates),
            &self.taxonomy,
        )
    }

    /// Map markers for the visible services plus the user's position.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        markers::project(
            &self.visible_services(),
            self.location.as_ref().map(Location::coordinates),
        )
    }

    /// Snapshot of the current page, or `None` without a location.
    #[must_use]
    pub fn snapshot(&self) -> Option<FindHelpSearchState> {
        let location = self.location.as_ref()?;
        Some(FindHelpSearchState {
            lat: location.lat,
            lng: location.lng,
            location_label: location.postcode.clone(),
            radius: location.radius,
            location_source: location.source,
            location_slug: self.location_slug.clone(),
            selected_category: self.filters.category.clone(),
            selected_sub_category: self.filters.sub_category.clone(),
            selected_client_groups: self.filters.client_groups.clone(),
            open_now: self.filters.open_now,
            timetable_filters: self.filters.timetable_days.clone(),
            sort_order: self.sort_order,
            show_map: self.show_map,
            current_page: self.current_page,
            from_results_page: true,
            timestamp: 0,
            services: self.services.clone(),
        })
    }

    /// Persists the page before navigating to an organisation page.
    pub fn save_for_navigation(&self) {
        if let Some(state) = self.snapshot() {
            self.persistence.save(&state);
        }
    }

    /// Hydrates the session from a fresh snapshot without a network call.
    ///
    /// The snapshot is cleared [`RESTORE_CLEAR_DELAY`] later on a background
    /// task, or immediately outside a Tokio runtime. A snapshot saved again
    /// in the meantime is kept.
    pub fn restore_from_snapshot(&mut self) -> bool {
        let Some(state) = self.persistence.load() else {
            return false;
        };
        let saved_at = state.timestamp;

        self.generation.invalidate();
        self.location = Some(state.location());
        self.location_slug = state.location_slug;
        self.filters = ServiceFilters {
            category: state.selected_category.clone(),
            sub_category: state.selected_sub_category,
            client_groups: state.selected_client_groups,
            open_now: state.open_now,
            timetable_days: state.timetable_filters,
        };
        self.sort_order = state.sort_order;
        self.show_map = state.show_map;
        self.current_page = state.current_page;
        self.services = state.services;
        self.fetched_category = Some(state.selected_category);
        self.status = SearchStatus::Ready;
        tracing::info!(
            services = self.services.len(),
            "restored search from snapshot"
        );

        let persistence = self.persistence.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(RESTORE_CLEAR_DELAY).await;
                    persistence.clear_if_saved_at(saved_at);
                });
            }
            Err(_) => {
                persistence.clear_if_saved_at(saved_at);
            }
        }
        true
    }

    fn failure(&self, error: QueryError) -> SearchStatus {
        let can_retry = error.is_retryable() && self.retry_budget.can_retry();
        let message = if error.is_retryable() && !can_retry {
            RETRY_EXHAUSTED_MESSAGE.to_owned()
        } else {
            error.user_message().to_owned()
        };
        let mut actions = Vec::with_capacity(3);
        if can_retry {
            actions.push(RecoveryAction::Retry);
        }
        actions.push(RecoveryAction::ChangeLocation);
        actions.push(RecoveryAction::BrowseAll);
        SearchStatus::Failed {
            error,
            message,
            actions,
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

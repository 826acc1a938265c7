//! HTTP client for the directory's `GET /api/services` search endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use ssn_core::{dedupe_by_id, Location, ServiceWithDistance};

use crate::cache::QueryCache;
use crate::error::QueryError;
use crate::normalize::normalize;
use crate::types::ServicesResponse;

/// Page size of the primary, location-filtered query.
pub const DEFAULT_LIMIT: u32 = 1000;

/// Page size of the unfiltered fallback query.
pub const FALLBACK_LIMIT: u32 = 100;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Shown instead of an error when the fallback query answered.
pub const FALLBACK_NOTICE: &str =
    "We couldn't search near your location right now, so we're showing all available services.";

/// Result of [`ServiceQueryClient::fetch_services`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub services: Vec<ServiceWithDistance>,
    /// Softened message to display when the fallback answered.
    pub notice: Option<String>,
    pub used_fallback: bool,
}

/// Client for the service search endpoint.
///
/// Maps HTTP statuses to [`QueryError`] variants. A server-side failure of
/// the location-filtered query is answered by exactly one follow-up query
/// without the location filter, issued only after the first one settled.
/// Timeouts and connectivity failures are returned as-is for the caller to
/// retry.
#[derive(Debug, Clone)]
pub struct ServiceQueryClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
    cache: Option<QueryCache>,
}

impl ServiceQueryClient {
    /// Creates a client rooted at `base_url` (with or without a trailing
    /// slash).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute URL, or [`QueryError::Network`] if the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QueryError> {
        let endpoint = services_endpoint(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| QueryError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            timeout,
            cache: None,
        })
    }

    /// Attaches a result cache. Clones of the cache share entries, so the
    /// caller can keep a handle for [`QueryCache::clear`].
    #[must_use]
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the search URL. `location` of `None` drops the geo filter.
    #[must_use]
    pub fn services_url(
        &self,
        location: Option<&Location>,
        category: Option<&str>,
        limit: u32,
    ) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(loc) = location {
                query
                    .append_pair("lat", &loc.lat.to_string())
                    .append_pair("lng", &loc.lng.to_string())
                    .append_pair("radius", &loc.radius.to_string());
            }
            query.append_pair("limit", &limit.to_string());
            if let Some(category) = category.filter(|c| !c.is_empty()) {
                query.append_pair("category", category);
            }
        }
        url
    }

    /// Searches around `location`, falling back to an unfiltered query when
    /// the server fails.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Timeout`] / [`QueryError::Network`]: no fallback attempted.
    /// - [`QueryError::RateLimited`] / [`QueryError::NotFound`]: no fallback attempted.
    /// - [`QueryError::ServerError`], [`QueryError::GenericFailure`],
    ///   [`QueryError::InvalidResponse`]: only when the fallback also failed;
    ///   the primary query's error is returned.
    pub async fn fetch_services(
        &self,
        location: &Location,
        category: Option<&str>,
    ) -> Result<FetchOutcome, QueryError> {
        let primary_url = self.services_url(Some(location), category, DEFAULT_LIMIT);
        match self.get_services(primary_url).await {
            Ok(services) => Ok(FetchOutcome {
                services,
                notice: None,
                used_fallback: false,
            }),
            Err(primary) if primary.triggers_fallback() => {
                tracing::warn!(
                    error = %primary,
                    lat = location.lat,
                    lng = location.lng,
                    "location search failed, retrying without location filter"
                );
                let fallback_url = self.services_url(None, category, FALLBACK_LIMIT);
                match self.get_services(fallback_url).await {
                    Ok(services) => Ok(FetchOutcome {
                        services,
                        notice: Some(FALLBACK_NOTICE.to_owned()),
                        used_fallback: true,
                    }),
                    Err(fallback) => {
                        tracing::warn!(error = %fallback, "fallback search failed");
                        Err(primary)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Unfiltered listing, used by "browse all services".
    ///
    /// # Errors
    ///
    /// Returns any [`QueryError`]; no fallback applies.
    pub async fn fetch_all(
        &self,
        category: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ServiceWithDistance>, QueryError> {
        self.get_services(self.services_url(None, category, limit))
            .await
    }

    async fn get_services(&self, url: Url) -> Result<Vec<ServiceWithDistance>, QueryError> {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(url.as_str())) {
            tracing::debug!(url = %url, "service search served from cache");
            return Ok(cached);
        }

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let status = response.status();

        if status.is_server_error() {
            return Err(QueryError::ServerError {
                status: status.as_u16(),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(QueryError::RateLimited { retry_after_secs });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(QueryError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(QueryError::GenericFailure {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let parsed = serde_json::from_str::<ServicesResponse>(&body).map_err(|e| {
            tracing::warn!(error = %e, url = %url, "malformed service search response");
            QueryError::InvalidResponse(e.to_string())
        })?;

        let normalized: Vec<ServiceWithDistance> = parsed.results.iter().map(normalize).collect();
        let services = dedupe_by_id(&normalized);
        tracing::debug!(
            url = %url,
            received = parsed.results.len(),
            kept = services.len(),
            "service search completed"
        );

        if let Some(cache) = &self.cache {
            cache.insert(url.as_str(), services.clone());
        }
        Ok(services)
    }

    fn transport_error(&self, err: &reqwest::Error) -> QueryError {
        if err.is_timeout() {
            QueryError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            QueryError::Network(err.to_string())
        }
    }
}

fn services_endpoint(base_url: &str) -> Result<Url, QueryError> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_owned()
    } else {
        format!("{base_url}/")
    };
    let invalid = |reason: String| QueryError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason,
    };
    let base = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_owned()));
    }
    base.join("api/services").map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use thiserror::Error;

/// Failures of the service search endpoint.
///
/// Variants carry owned strings so a failure can be stored in session state
/// and shown again after a re-render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// HTTP 5xx.
    #[error("service search unavailable (HTTP {status})")]
    ServerError { status: u16 },

    /// HTTP 429.
    #[error("rate limited by service search (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// HTTP 404.
    #[error("service search endpoint not found: {url}")]
    NotFound { url: String },

    /// Any other non-2xx status.
    #[error("service search failed with HTTP {status}")]
    GenericFailure { status: u16 },

    /// The server answered 2xx but the body was not the expected shape.
    #[error("invalid service search response: {0}")]
    InvalidResponse(String),

    #[error("service search timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection refused, DNS failure, reset mid-body, etc.
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl QueryError {
    /// Timeout and connectivity failures. These never trigger the
    /// unfiltered fallback query.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, QueryError::Timeout { .. } | QueryError::Network(_))
    }

    /// Server-side failures answered by retrying without the location filter.
    #[must_use]
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            QueryError::ServerError { .. }
                | QueryError::GenericFailure { .. }
                | QueryError::InvalidResponse(_)
        )
    }

    /// Worth offering a retry to the user.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueryError::ServerError { .. }
                | QueryError::RateLimited { .. }
                | QueryError::Timeout { .. }
                | QueryError::Network(_)
        )
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            QueryError::ServerError { .. } => {
                "The service directory is temporarily unavailable. Please try again shortly."
            }
            QueryError::RateLimited { .. } => {
                "Too many searches in a short time. Please wait a moment and try again."
            }
            QueryError::NotFound { .. } => "The service search could not be found.",
            QueryError::GenericFailure { .. }
            | QueryError::InvalidResponse(_)
            | QueryError::InvalidBaseUrl { .. } => {
                "Something went wrong while searching for services."
            }
            QueryError::Timeout { .. } => {
                "The search took too long to respond. Check your connection and try again."
            }
            QueryError::Network(_) => {
                "We couldn't connect to the service directory. Check your connection and try again."
            }
        }
    }
}

/// Failures while establishing the user's location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location access was denied. Please enter a postcode instead.")]
    PermissionDenied,

    #[error("Your location is currently unavailable. Please enter a postcode instead.")]
    PositionUnavailable,

    #[error("Finding your location took too long. Please try again or enter a postcode.")]
    Timeout,

    #[error("We couldn't determine your location. Please enter a postcode instead.")]
    NetworkError,

    #[error("'{0}' is not a valid UK postcode.")]
    InvalidPostcode(String),

    #[error("We couldn't find the postcode {0}. Please check it and try again.")]
    PostcodeNotFound(String),
}

impl LocationError {
    /// Stable identifier for the failure class.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "PERMISSION_DENIED",
            LocationError::PositionUnavailable => "POSITION_UNAVAILABLE",
            LocationError::Timeout => "TIMEOUT",
            LocationError::NetworkError => "NETWORK_ERROR",
            LocationError::InvalidPostcode(_) => "INVALID_POSTCODE",
            LocationError::PostcodeNotFound(_) => "POSTCODE_NOT_FOUND",
        }
    }
}

/// Failures of the postcode lookup service.
#[derive(Debug, Error)]
pub enum PostcodeError {
    #[error("invalid postcode: {0}")]
    Invalid(String),

    #[error("postcode not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid postcode lookup URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("unexpected HTTP status {status} from postcode lookup")]
    UnexpectedStatus { status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<PostcodeError> for LocationError {
    fn from(err: PostcodeError) -> Self {
        match err {
            PostcodeError::Invalid(pc) => LocationError::InvalidPostcode(pc),
            PostcodeError::NotFound(pc) => LocationError::PostcodeNotFound(pc),
            PostcodeError::Http(_)
            | PostcodeError::InvalidBaseUrl { .. }
            | PostcodeError::UnexpectedStatus { .. }
            | PostcodeError::Deserialize { .. } => LocationError::NetworkError,
        }
    }
}

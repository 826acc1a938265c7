//! Network-facing half of the find-help pipeline: the service query client,
//! record normalization, location resolution and the session state container.

pub mod cache;
pub mod client;
pub mod debounce;
pub mod error;
pub mod generation;
pub mod geolocation;
pub mod normalize;
pub mod postcode;
pub mod resolver;
pub mod retry;
pub mod session;
pub mod types;

pub use cache::QueryCache;
pub use client::{FetchOutcome, ServiceQueryClient, FALLBACK_NOTICE};
pub use debounce::{FilterDebouncer, FILTER_DEBOUNCE};
pub use error::{LocationError, PostcodeError, QueryError};
pub use generation::{GenerationToken, RequestGeneration};
pub use geolocation::{
    FixedGeolocation, GeolocationProvider, NoGeolocation, PlatformPositionError, Position,
    PositionOptions,
};
pub use normalize::normalize;
pub use postcode::{normalize_postcode, PostcodeLookup};
pub use resolver::{LocationResolver, LocationUpdate};
pub use retry::{RetryBudget, MAX_RETRY_ATTEMPTS, RETRY_EXHAUSTED_MESSAGE};
pub use session::{
    CategorySelection, FindHelpSession, PendingSearch, RecoveryAction, SearchKind, SearchStatus,
};

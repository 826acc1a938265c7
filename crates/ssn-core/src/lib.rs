//! Domain model and pure find-help logic for the Street Support directory.
//!
//! Nothing in this crate performs network I/O. The query client, location
//! resolver and session orchestration live in `ssn-client`.

pub mod app_config;
pub mod config;
pub mod error;
pub mod filter;
pub mod locations;
pub mod markers;
pub mod model;
pub mod search_state;
pub mod storage;
pub mod taxonomy;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use filter::{
    apply, apply_at, dedupe_by_id, same_coordinates, ServiceFilters, SortOrder, COORDINATE_EPSILON,
};
pub use locations::{KnownLocation, LocationRegistry, SwepWindow};
pub use markers::{
    organisation_locations, organisation_markers, project, resolve_marker_click, Marker,
    MarkerKind, MarkerTarget, OrganisationLocation, USER_LOCATION_MARKER_ID,
};
pub use model::{
    Coordinates, FindHelpSearchState, Location, LocationSource, OpenTime, OrganisationRef,
    ServiceAddress, ServiceWithDistance, DEFAULT_RADIUS_KM, DEVICE_RADIUS_KM,
};
pub use search_state::{back_to_search_url, SearchStatePersistence, STALE_AFTER_MS};
pub use storage::{MemorySessionStorage, SessionStorage};
pub use taxonomy::{Category, CategoryTaxonomy, SubCategory};

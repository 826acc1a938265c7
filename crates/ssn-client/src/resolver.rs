//! Location resolution: device position, postcode entry, manual updates and
//! inference from the page path.

use ssn_core::{
    Location, LocationRegistry, LocationSource, DEFAULT_RADIUS_KM, DEVICE_RADIUS_KM,
};

use crate::error::LocationError;
use crate::geolocation::{GeolocationProvider, NoGeolocation, PositionOptions};
use crate::postcode::PostcodeLookup;

/// Partial update merged into the current location by
/// [`LocationResolver::set_location`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationUpdate {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub source: Option<LocationSource>,
    pub postcode: Option<String>,
}

impl From<Location> for LocationUpdate {
    fn from(location: Location) -> Self {
        Self {
            lat: Some(location.lat),
            lng: Some(location.lng),
            radius: Some(location.radius),
            source: Some(location.source),
            postcode: location.postcode,
        }
    }
}

/// Owns the user's current [`Location`] and the last location failure.
///
/// Position requests take `&mut self`, so at most one is in flight per
/// resolver.
#[derive(Debug)]
pub struct LocationResolver<G = NoGeolocation> {
    geolocation: Option<G>,
    postcodes: Option<PostcodeLookup>,
    registry: LocationRegistry,
    location: Option<Location>,
    is_loading: bool,
    error: Option<LocationError>,
}

impl LocationResolver<NoGeolocation> {
    /// A resolver on a platform with no geolocation capability.
    #[must_use]
    pub fn without_geolocation(registry: LocationRegistry) -> Self {
        Self::build(None, registry)
    }
}

impl<G: GeolocationProvider> LocationResolver<G> {
    #[must_use]
    pub fn new(geolocation: G, registry: LocationRegistry) -> Self {
        Self::build(Some(geolocation), registry)
    }

    fn build(geolocation: Option<G>, registry: LocationRegistry) -> Self {
        Self {
            geolocation,
            postcodes: None,
            registry,
            location: None,
            is_loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn with_postcode_lookup(mut self, lookup: PostcodeLookup) -> Self {
        self.postcodes = Some(lookup);
        self
    }

    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&LocationError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Merges `update` into the current location and clears any error.
    ///
    /// Without a current location the update must carry both coordinates;
    /// otherwise it is ignored. A postcode is kept only while the source is
    /// [`LocationSource::Postcode`].
    pub fn set_location(&mut self, update: LocationUpdate) {
        self.error = None;
        let merged = match (&self.location, update.lat, update.lng) {
            (Some(current), lat, lng) => {
                let source = update.source.unwrap_or(current.source);
                let mut next = Location::new(
                    lat.unwrap_or(current.lat),
                    lng.unwrap_or(current.lng),
                    update.radius.unwrap_or(current.radius),
                    source,
                );
                next.postcode = match source {
                    LocationSource::Postcode => update.postcode.or_else(|| current.postcode.clone()),
                    _ => None,
                };
                next
            }
            (None, Some(lat), Some(lng)) => {
                let source = update.source.unwrap_or(LocationSource::Navigation);
                let mut next = Location::new(
                    lat,
                    lng,
                    update.radius.unwrap_or(DEFAULT_RADIUS_KM),
                    source,
                );
                if source == LocationSource::Postcode {
                    next.postcode = update.postcode;
                }
                next
            }
            (None, _, _) => {
                tracing::debug!("ignoring partial location update without coordinates");
                return;
            }
        };
        self.location = Some(merged);
    }

    /// Asks the platform for the device position.
    ///
    /// # Errors
    ///
    /// Returns the [`LocationError`] that is also stored in [`error`](Self::error).
    /// An absent provider fails immediately with
    /// [`LocationError::PositionUnavailable`].
    pub async fn request_location(&mut self) -> Result<Location, LocationError> {
        let Some(provider) = &self.geolocation else {
            return Err(self.fail(LocationError::PositionUnavailable));
        };

        self.is_loading = true;
        self.error = None;
        let outcome = provider.current_position(PositionOptions::default()).await;
        self.is_loading = false;

        match outcome {
            Ok(position) => {
                let location = Location::new(
                    position.latitude,
                    position.longitude,
                    DEVICE_RADIUS_KM,
                    LocationSource::Geolocation,
                );
                tracing::info!(
                    lat = location.lat,
                    lng = location.lng,
                    "device location acquired"
                );
                self.location = Some(location.clone());
                Ok(location)
            }
            Err(platform) => {
                tracing::warn!(code = platform.code, message = %platform.message, "geolocation failed");
                Err(self.fail(platform.into()))
            }
        }
    }

    /// Resolves a typed postcode.
    ///
    /// # Errors
    ///
    /// - [`LocationError::InvalidPostcode`]: no lookup is issued.
    /// - [`LocationError::PostcodeNotFound`]: the lookup service does not know it.
    /// - [`LocationError::NetworkError`]: lookup failed or is not configured.
    pub async fn submit_postcode(&mut self, input: &str) -> Result<Location, LocationError> {
        let Some(lookup) = &self.postcodes else {
            tracing::warn!("postcode submitted but no postcode lookup is configured");
            return Err(self.fail(LocationError::NetworkError));
        };

        self.is_loading = true;
        let outcome = lookup.lookup(input).await;
        self.is_loading = false;

        match outcome {
            Ok((postcode, coordinates)) => {
                let location = Location::new(
                    coordinates.lat,
                    coordinates.lng,
                    DEFAULT_RADIUS_KM,
                    LocationSource::Postcode,
                )
                .with_postcode(postcode);
                self.error = None;
                self.location = Some(location.clone());
                Ok(location)
            }
            Err(e) => {
                tracing::warn!(error = %e, "postcode lookup failed");
                Err(self.fail(e.into()))
            }
        }
    }

    /// Populates the location from a single-segment page path naming a
    /// public known location. Returns whether it applied.
    pub fn init_from_path(&mut self, path: &str) -> bool {
        let Some(known) = self.registry.match_path(path) else {
            return false;
        };
        tracing::debug!(slug = %known.slug, "location inferred from page path");
        self.location = Some(known.as_navigation_location());
        true
    }

    fn fail(&mut self, error: LocationError) -> LocationError {
        self.error = Some(error.clone());
        error
    }
}

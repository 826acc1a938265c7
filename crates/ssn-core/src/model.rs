//! Core data model shared by the query client, filter engine and persistence.

use serde::{Deserialize, Serialize};

use crate::filter::SortOrder;

/// Search radius used for postcode entry and restored searches.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Search radius used when the position comes from the device or the page.
pub const DEVICE_RADIUS_KM: f64 = 10.0;

/// Where the current [`Location`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Geolocation,
    Postcode,
    Navigation,
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationSource::Geolocation => write!(f, "geolocation"),
            LocationSource::Postcode => write!(f, "postcode"),
            LocationSource::Navigation => write!(f, "navigation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// The user's approximate position plus the search radius around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    /// Kilometres, always positive.
    pub radius: f64,
    pub source: LocationSource,
    /// Original user input when `source` is [`LocationSource::Postcode`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl Location {
    /// Builds a location, replacing a non-positive or non-finite radius with
    /// [`DEFAULT_RADIUS_KM`].
    #[must_use]
    pub fn new(lat: f64, lng: f64, radius: f64, source: LocationSource) -> Self {
        Self {
            lat,
            lng,
            radius: sanitize_radius(radius),
            source,
            postcode: None,
        }
    }

    #[must_use]
    pub fn with_postcode(mut self, postcode: impl Into<String>) -> Self {
        self.postcode = Some(postcode.into());
        self
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

pub(crate) fn sanitize_radius(radius: f64) -> f64 {
    if radius.is_finite() && radius > 0.0 {
        radius
    } else {
        DEFAULT_RADIUS_KM
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationRef {
    pub name: String,
    pub slug: String,
    pub is_verified: bool,
}

/// One opening window. `start`/`end` keep the backend's encoding
/// (HHMM, e.g. `930` for 09:30).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTime {
    /// 0 = Sunday through 6 = Saturday.
    pub day: u8,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAddress {
    pub street: String,
    pub city: String,
    pub postcode: String,
}

/// Canonical view of one backend service record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWithDistance {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub sub_category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub organisation: OrganisationRef,
    pub client_groups: Vec<String>,
    pub open_times: Vec<OpenTime>,
    /// Kilometres from the search origin when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default)]
    pub address: ServiceAddress,
}

impl ServiceWithDistance {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

/// Snapshot of the find-help results page, written before navigating to an
/// organisation page and restored on the way back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindHelpSearchState {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub location_label: Option<String>,
    pub radius: f64,
    pub location_source: LocationSource,
    #[serde(default)]
    pub location_slug: Option<String>,
    #[serde(default)]
    pub selected_category: String,
    #[serde(default)]
    pub selected_sub_category: String,
    #[serde(default)]
    pub selected_client_groups: Vec<String>,
    #[serde(default)]
    pub open_now: bool,
    /// Weekdays (0 = Sunday) the user restricted the timetable to.
    #[serde(default)]
    pub timetable_filters: Vec<u8>,
    pub sort_order: SortOrder,
    #[serde(default)]
    pub show_map: bool,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub from_results_page: bool,
    /// Milliseconds since the Unix epoch, stamped at save time.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub services: Vec<ServiceWithDistance>,
}

impl FindHelpSearchState {
    /// Location portion of the snapshot.
    #[must_use]
    pub fn location(&self) -> Location {
        let mut location = Location::new(self.lat, self.lng, self.radius, self.location_source);
        if self.location_source == LocationSource::Postcode {
            location.postcode.clone_from(&self.location_label);
        }
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_new_keeps_positive_radius() {
        let loc = Location::new(53.48, -2.24, 10.0, LocationSource::Geolocation);
        assert!((loc.radius - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn location_new_replaces_invalid_radius() {
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let loc = Location::new(53.48, -2.24, bad, LocationSource::Postcode);
            assert!(
                (loc.radius - DEFAULT_RADIUS_KM).abs() < f64::EPSILON,
                "radius {bad} should fall back to the default"
            );
        }
    }

    #[test]
    fn location_source_serializes_lowercase() {
        let json = serde_json::to_string(&LocationSource::Navigation).unwrap();
        assert_eq!(json, "\"navigation\"");
    }

    #[test]
    fn service_serializes_camel_case() {
        let service = ServiceWithDistance {
            id: "s1".to_string(),
            sub_category: "general".to_string(),
            ..ServiceWithDistance::default()
        };
        let json = serde_json::to_value(&service).unwrap();
        assert_eq!(json["subCategory"], "general");
        assert!(json.get("distance").is_none());
        assert_eq!(json["organisation"]["isVerified"], false);
    }
}

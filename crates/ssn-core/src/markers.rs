//! Map marker view-models for the results map and the organisation page.

use serde::Serialize;

use crate::filter::same_coordinates;
use crate::model::{Coordinates, ServiceAddress, ServiceWithDistance};

pub const USER_LOCATION_MARKER_ID: &str = "user-location";

const ORGANISATION_MARKER_PREFIX: &str = "location-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    Service,
    UserLocation,
    OrganisationLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub kind: MarkerKind,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// One marker per service, then a `user-location` marker when the viewer's
/// position is known.
#[must_use]
pub fn project(services: &[ServiceWithDistance], user_location: Option<Coordinates>) -> Vec<Marker> {
    let mut markers: Vec<Marker> = services
        .iter()
        .map(|s| Marker {
            id: s.id.clone(),
            kind: MarkerKind::Service,
            lat: s.latitude,
            lng: s.longitude,
            title: s.name.clone(),
            organisation_name: Some(s.organisation.name.clone()),
            organisation_slug: Some(s.organisation.slug.clone()),
            distance: s.distance,
        })
        .collect();

    if let Some(origin) = user_location {
        markers.push(Marker {
            id: USER_LOCATION_MARKER_ID.to_string(),
            kind: MarkerKind::UserLocation,
            lat: origin.lat,
            lng: origin.lng,
            title: "Your location".to_string(),
            organisation_name: None,
            organisation_slug: None,
            distance: None,
        });
    }

    markers
}

/// A physical site of an organisation, shared by every service at the same
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationLocation {
    pub coordinates: Coordinates,
    pub address: ServiceAddress,
    /// Services at this site, in input order.
    pub service_ids: Vec<String>,
}

/// Groups an organisation's services by site.
///
/// Sites appear in first-seen order; marker indices and
/// [`resolve_marker_click`] depend on that ordering.
#[must_use]
pub fn organisation_locations(services: &[ServiceWithDistance]) -> Vec<OrganisationLocation> {
    let mut locations: Vec<OrganisationLocation> = Vec::new();
    for service in services {
        let coordinates = service.coordinates();
        match locations
            .iter_mut()
            .find(|l| same_coordinates(l.coordinates, coordinates))
        {
            Some(existing) => existing.service_ids.push(service.id.clone()),
            None => locations.push(OrganisationLocation {
                coordinates,
                address: service.address.clone(),
                service_ids: vec![service.id.clone()],
            }),
        }
    }
    locations
}

#[must_use]
pub fn organisation_markers(services: &[ServiceWithDistance]) -> Vec<Marker> {
    organisation_locations(services)
        .into_iter()
        .enumerate()
        .map(|(index, location)| {
            let title = if location.address.street.is_empty() {
                services
                    .iter()
                    .find(|s| location.service_ids.first() == Some(&s.id))
                    .map(|s| s.organisation.name.clone())
                    .unwrap_or_default()
            } else {
                location.address.street.clone()
            };
            Marker {
                id: format!("{ORGANISATION_MARKER_PREFIX}{index}"),
                kind: MarkerKind::OrganisationLocation,
                lat: location.coordinates.lat,
                lng: location.coordinates.lng,
                title,
                organisation_name: None,
                organisation_slug: None,
                distance: None,
            }
        })
        .collect()
}

/// The accordion section a clicked organisation marker should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerTarget {
    pub location_index: usize,
    pub service_id: String,
}

/// Maps an organisation marker id back to its site and first service.
///
/// Rebuilds the site list from the same `services` slice, so callers must
/// pass services in the order used to build the markers.
#[must_use]
pub fn resolve_marker_click(
    services: &[ServiceWithDistance],
    marker_id: &str,
) -> Option<MarkerTarget> {
    let index: usize = marker_id
        .strip_prefix(ORGANISATION_MARKER_PREFIX)?
        .parse()
        .ok()?;
    let locations = organisation_locations(services);
    let location = locations.get(index)?;
    let service_id = location.service_ids.first()?.clone();
    Some(MarkerTarget {
        location_index: index,
        service_id,
    })
}

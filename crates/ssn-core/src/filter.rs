//! In-memory filtering, sorting and deduplication of normalized services.
//!
//! Every function here returns a new vector; input slices are never mutated.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::model::{Coordinates, ServiceWithDistance};
use crate::taxonomy::CategoryTaxonomy;

/// Two coordinates closer than this in both axes are the same place.
///
/// Absorbs floating-point round-trip noise only; it is not a proximity radius.
pub const COORDINATE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Distance,
    Alpha,
}

impl SortOrder {
    /// Distance when an origin is known, alphabetical otherwise.
    #[must_use]
    pub fn default_for(origin: Option<Coordinates>) -> Self {
        if origin.is_some() {
            SortOrder::Distance
        } else {
            SortOrder::Alpha
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(SortOrder::Distance),
            "alpha" => Ok(SortOrder::Alpha),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Distance => write!(f, "distance"),
            SortOrder::Alpha => write!(f, "alpha"),
        }
    }
}

/// User-selected filters. Empty strings mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilters {
    pub category: String,
    pub sub_category: String,
    /// A service matches when it carries any of these groups.
    pub client_groups: Vec<String>,
    pub open_now: bool,
    /// Weekdays (0 = Sunday) a service must open on, any of.
    pub timetable_days: Vec<u8>,
}

impl ServiceFilters {
    /// Switches category, resetting the subcategory when it does not exist
    /// under the new category.
    pub fn select_category(&mut self, category: &str, taxonomy: &CategoryTaxonomy) {
        category.clone_into(&mut self.category);
        if !self.sub_category.is_empty()
            && !category.is_empty()
            && !taxonomy.has_sub_category(category, &self.sub_category)
        {
            self.sub_category.clear();
        }
    }

    /// The subcategory actually applied: an inconsistent selection counts as "all".
    #[must_use]
    pub fn effective_sub_category<'a>(&'a self, taxonomy: &CategoryTaxonomy) -> &'a str {
        if self.sub_category.is_empty() || self.category.is_empty() {
            return &self.sub_category;
        }
        if taxonomy.has_sub_category(&self.category, &self.sub_category) {
            &self.sub_category
        } else {
            ""
        }
    }
}

/// Great-circle distance in kilometres.
#[must_use]
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.lat,
            longitude: from.lng,
        },
        haversine::Location {
            latitude: to.lat,
            longitude: to.lng,
        },
        haversine::Units::Kilometers,
    )
}

/// Filters and sorts `services` against the local wall clock.
#[must_use]
pub fn apply(
    services: &[ServiceWithDistance],
    filters: &ServiceFilters,
    sort_order: SortOrder,
    origin: Option<Coordinates>,
    taxonomy: &CategoryTaxonomy,
) -> Vec<ServiceWithDistance> {
    apply_at(
        services,
        filters,
        sort_order,
        origin,
        taxonomy,
        chrono::Local::now().naive_local(),
    )
}

/// Same as [`apply`] with an explicit clock for the open-now filter.
#[must_use]
pub fn apply_at(
    services: &[ServiceWithDistance],
    filters: &ServiceFilters,
    sort_order: SortOrder,
    origin: Option<Coordinates>,
    taxonomy: &CategoryTaxonomy,
    now: NaiveDateTime,
) -> Vec<ServiceWithDistance> {
    let sub_category = filters.effective_sub_category(taxonomy);

    let mut result: Vec<ServiceWithDistance> = services
        .iter()
        .filter(|s| filters.category.is_empty() || s.category == filters.category)
        .filter(|s| sub_category.is_empty() || s.sub_category == sub_category)
        .filter(|s| {
            filters.client_groups.is_empty()
                || s.client_groups
                    .iter()
                    .any(|g| filters.client_groups.contains(g))
        })
        .filter(|s| !filters.open_now || is_open_at(s, now))
        .filter(|s| {
            filters.timetable_days.is_empty()
                || s.open_times
                    .iter()
                    .any(|t| filters.timetable_days.contains(&t.day))
        })
        .cloned()
        .map(|mut s| {
            if s.distance.is_none() {
                s.distance = origin.map(|o| distance_km(o, s.coordinates()));
            }
            s
        })
        .collect();

    match sort_order {
        SortOrder::Distance => result.sort_by(|a, b| sort_distance(a).total_cmp(&sort_distance(b))),
        SortOrder::Alpha => result.sort_by(compare_names),
    }

    result
}

fn sort_distance(service: &ServiceWithDistance) -> f64 {
    service.distance.unwrap_or(f64::INFINITY)
}

fn compare_names(a: &ServiceWithDistance, b: &ServiceWithDistance) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// `true` when one of the service's windows covers `now`.
///
/// Weekday numbering starts at Sunday = 0; times compare as HHMM.
#[must_use]
pub fn is_open_at(service: &ServiceWithDistance, now: NaiveDateTime) -> bool {
    #[allow(clippy::cast_possible_truncation)]
    let day = now.weekday().num_days_from_sunday() as u8;
    let clock = now.hour() * 100 + now.minute();
    service
        .open_times
        .iter()
        .any(|t| t.day == day && t.start <= clock && clock < t.end)
}

/// Drops later records whose `id` was already seen.
#[must_use]
pub fn dedupe_by_id(services: &[ServiceWithDistance]) -> Vec<ServiceWithDistance> {
    let mut seen = HashSet::new();
    services
        .iter()
        .filter(|s| seen.insert(s.id.as_str()))
        .cloned()
        .collect()
}

#[must_use]
pub fn same_coordinates(a: Coordinates, b: Coordinates) -> bool {
    (a.lat - b.lat).abs() < COORDINATE_EPSILON && (a.lng - b.lng).abs() < COORDINATE_EPSILON
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;

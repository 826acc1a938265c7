//! Known locations with their own landing page, and their SWEP windows.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Location, LocationSource, DEVICE_RADIUS_KM};
use crate::ConfigError;

const BUNDLED_LOCATIONS: &str = include_str!("../config/locations.yaml");

/// Severe Weather Emergency Protocol window for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwepWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SwepWindow {
    /// Inclusive on both ends.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownLocation {
    pub slug: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swep: Option<SwepWindow>,
}

impl KnownLocation {
    /// The location a visitor is given when landing on this location's page.
    #[must_use]
    pub fn as_navigation_location(&self) -> Location {
        Location::new(
            self.latitude,
            self.longitude,
            DEVICE_RADIUS_KM,
            LocationSource::Navigation,
        )
    }

    #[must_use]
    pub fn swep_active(&self, now: DateTime<Utc>) -> bool {
        self.swep.as_ref().is_some_and(|w| w.is_active(now))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRegistry {
    pub locations: Vec<KnownLocation>,
}

impl LocationRegistry {
    /// # Errors
    ///
    /// Returns `ConfigError` if the bundled YAML is malformed or fails validation.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_yaml(BUNDLED_LOCATIONS)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is malformed or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let registry: LocationRegistry = serde_yaml::from_str(content)?;
        let mut seen = HashSet::new();
        for location in &registry.locations {
            if location.slug.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "location slug must be non-empty".to_string(),
                ));
            }
            if !seen.insert(location.slug.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate location slug: '{}'",
                    location.slug
                )));
            }
            if !(-90.0..=90.0).contains(&location.latitude)
                || !(-180.0..=180.0).contains(&location.longitude)
            {
                return Err(ConfigError::Validation(format!(
                    "location '{}' has out-of-range coordinates",
                    location.slug
                )));
            }
            if let Some(window) = &location.swep {
                if window.end < window.start {
                    return Err(ConfigError::Validation(format!(
                        "location '{}' has a SWEP window ending before it starts",
                        location.slug
                    )));
                }
            }
        }
        Ok(registry)
    }

    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&KnownLocation> {
        self.locations.iter().find(|l| l.slug == slug)
    }

    /// Public location for a page path like `/manchester`.
    ///
    /// Only single-segment absolute paths match, with at most one trailing
    /// slash; `/manchester/advice`, `//manchester` and unknown or private
    /// slugs return `None`.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<&KnownLocation> {
        let rest = path.strip_prefix('/')?;
        let slug = rest.strip_suffix('/').unwrap_or(rest);
        if slug.is_empty() || slug.contains('/') {
            return None;
        }
        self.find(slug).filter(|l| l.is_public)
    }

    pub fn public(&self) -> impl Iterator<Item = &KnownLocation> {
        self.locations.iter().filter(|l| l.is_public)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn bundled_registry_parses() {
        let registry = LocationRegistry::bundled().expect("bundled locations are valid");
        assert!(registry.find("manchester").is_some());
        assert!(registry.public().all(|l| l.is_public));
    }

    #[test]
    fn match_path_single_segment_public_slug() {
        let registry = LocationRegistry::bundled().unwrap();
        let hit = registry.match_path("/manchester").expect("manchester is public");
        let location = hit.as_navigation_location();
        assert_eq!(location.source, LocationSource::Navigation);
        assert!((location.radius - 10.0).abs() < f64::EPSILON);
        assert!((location.lat - 53.4808).abs() < 1e-9);
    }

    #[test]
    fn match_path_ignores_multi_segment_and_unknown() {
        let registry = LocationRegistry::bundled().unwrap();
        assert!(registry.match_path("/manchester/advice").is_none());
        assert!(registry.match_path("/atlantis").is_none());
        assert!(registry.match_path("/").is_none());
    }

    #[test]
    fn match_path_requires_exactly_one_segment() {
        let registry = LocationRegistry::bundled().unwrap();
        assert!(registry.match_path("/manchester/").is_some());
        assert!(registry.match_path("manchester").is_none());
        assert!(registry.match_path("//manchester").is_none());
        assert!(registry.match_path("/manchester//").is_none());
        assert!(registry.match_path("//manchester//").is_none());
    }

    #[test]
    fn match_path_ignores_private_locations() {
        let registry = LocationRegistry::bundled().unwrap();
        assert!(registry.find("reading").is_some());
        assert!(registry.match_path("/reading").is_none());
    }

    #[test]
    fn swep_window_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2026, 1, 10, 18, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 13, 9, 0, 0).unwrap();
        let window = SwepWindow { start, end };
        assert!(window.is_active(start));
        assert!(window.is_active(end));
        assert!(!window.is_active(end + chrono::Duration::seconds(1)));
        assert!(!window.is_active(start - chrono::Duration::seconds(1)));
    }

    #[test]
    fn rejects_inverted_swep_window() {
        let yaml = "locations:\n  - slug: x\n    name: X\n    latitude: 1.0\n    longitude: 1.0\n    swep:\n      start: 2026-01-13T09:00:00Z\n      end: 2026-01-10T09:00:00Z\n";
        let err = LocationRegistry::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("SWEP")));
    }

    #[test]
    fn swep_active_reads_optional_window() {
        let yaml = "locations:\n  - slug: x\n    name: X\n    latitude: 1.0\n    longitude: 1.0\n    isPublic: true\n    swep:\n      start: 2026-01-10T09:00:00Z\n      end: 2026-01-13T09:00:00Z\n";
        let registry = LocationRegistry::from_yaml(yaml).unwrap();
        let loc = registry.find("x").unwrap();
        assert!(loc.swep_active(Utc.with_ymd_and_hms(2026, 1, 11, 0, 0, 0).unwrap()));
        assert!(!loc.swep_active(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()));
    }
}

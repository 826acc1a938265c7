//! Read-only listings of the category taxonomy and known locations.

use std::fmt::Write as _;

use ssn_core::{AppConfig, CategoryTaxonomy, KnownLocation, LocationRegistry};

/// Taxonomy from `SSN_CATEGORIES_PATH`, or the bundled one.
///
/// # Errors
///
/// Returns an error if the override file cannot be read or is invalid.
pub(crate) fn load_taxonomy(config: &AppConfig) -> anyhow::Result<CategoryTaxonomy> {
    let taxonomy = match &config.categories_path {
        Some(path) => CategoryTaxonomy::load(path)?,
        None => CategoryTaxonomy::bundled()?,
    };
    Ok(taxonomy)
}

/// Known locations from `SSN_LOCATIONS_PATH`, or the bundled list.
///
/// # Errors
///
/// Returns an error if the override file cannot be read or is invalid.
pub(crate) fn load_registry(config: &AppConfig) -> anyhow::Result<LocationRegistry> {
    let registry = match &config.locations_path {
        Some(path) => LocationRegistry::load(path)?,
        None => LocationRegistry::bundled()?,
    };
    Ok(registry)
}

pub(crate) fn run_categories(config: &AppConfig) -> anyhow::Result<()> {
    let taxonomy = load_taxonomy(config)?;
    print!("{}", render_categories(&taxonomy));
    Ok(())
}

pub(crate) fn run_locations(config: &AppConfig, include_private: bool) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    print!("{}", render_locations(&registry, include_private));
    Ok(())
}

pub(crate) fn render_categories(taxonomy: &CategoryTaxonomy) -> String {
    let mut out = String::new();
    for category in &taxonomy.categories {
        let _ = writeln!(out, "{:<16}{}", category.key, category.name);
        for sub in &category.sub_categories {
            let _ = writeln!(out, "  {:<14}{}", sub.key, sub.name);
        }
    }
    out
}

pub(crate) fn render_locations(registry: &LocationRegistry, include_private: bool) -> String {
    let now = chrono::Utc::now();
    let mut out = format!("{:<20}{:<24}{:>10}{:>11}  SWEP\n", "SLUG", "NAME", "LAT", "LNG");
    let locations: Box<dyn Iterator<Item = &KnownLocation>> = if include_private {
        Box::new(registry.locations.iter())
    } else {
        Box::new(registry.public())
    };
    for location in locations {
        let swep = if location.swep_active(now) {
            "active"
        } else {
            "\u{2014}"
        };
        let _ = writeln!(
            out,
            "{:<20}{:<24}{:>10.4}{:>11.4}  {swep}",
            location.slug, location.name, location.latitude, location.longitude
        );
    }
    out
}

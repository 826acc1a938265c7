//! `find-help` command: resolves a location, runs a search through a
//! [`FindHelpSession`] and prints the filtered results.

use std::fmt::Write as _;
use std::time::Duration;

use clap::Args;
use serde::Serialize;
use ssn_client::{
    CategorySelection, FindHelpSession, FixedGeolocation, GeolocationProvider, LocationResolver, LocationUpdate,
    PostcodeLookup, QueryCache, RecoveryAction, SearchStatus, ServiceQueryClient,
};
use ssn_core::{
    back_to_search_url, AppConfig, Location, LocationRegistry, Marker, SearchStatePersistence,
    ServiceWithDistance, SortOrder,
};

use crate::reference::{load_registry, load_taxonomy};

#[derive(Debug, Clone, Default, Args)]
pub struct FindHelpArgs {
    /// UK postcode to search around
    #[arg(long, conflicts_with_all = ["lat", "location"])]
    pub postcode: Option<String>,
    /// Latitude of a device position (requires --lng)
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Longitude of a device position (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
    /// Known location slug, e.g. manchester
    #[arg(long, conflicts_with_all = ["postcode", "lat"])]
    pub location: Option<String>,
    /// Search radius in kilometres
    #[arg(long)]
    pub radius: Option<f64>,
    /// Category key
    #[arg(long)]
    pub category: Option<String>,
    /// Subcategory key within --category
    #[arg(long)]
    pub sub_category: Option<String>,
    /// Client group; repeat to match any of several
    #[arg(long = "client-group")]
    pub client_groups: Vec<String>,
    /// Only services open right now
    #[arg(long)]
    pub open_now: bool,
    /// Weekday a service must open on (0 = Sunday); repeatable
    #[arg(long = "day", value_parser = clap::value_parser!(u8).range(0..=6))]
    pub days: Vec<u8>,
    /// Sort order: distance or alpha
    #[arg(long)]
    pub sort: Option<SortOrder>,
    /// Include map markers in the output
    #[arg(long)]
    pub map: bool,
    /// Fail immediately instead of retrying retryable errors
    #[arg(long)]
    pub no_retry: bool,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindHelpOutput<'a> {
    location: Option<&'a Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'a str>,
    services: &'a [ServiceWithDistance],
    #[serde(skip_serializing_if = "Option::is_none")]
    markers: Option<&'a [Marker]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    back_to_search: Option<String>,
}

/// Runs a find-help search end to end.
///
/// With no location argument every service is listed (the browse-all path).
/// Retryable failures are retried while the retry budget allows.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the location cannot be
/// resolved, or the search fails for good.
pub(crate) async fn run_find_help(config: &AppConfig, args: &FindHelpArgs) -> anyhow::Result<()> {
    let taxonomy = load_taxonomy(config)?;
    let registry = load_registry(config)?;
    let timeout = Duration::from_secs(config.query_timeout_secs);

    let client = ServiceQueryClient::new(&config.api_base_url, timeout)
        .map_err(|e| anyhow::anyhow!("failed to build service query client: {e}"))?
        .with_cache(QueryCache::new(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        ));

    let location = resolve_location(config, registry, args, timeout).await?;

    let mut session = FindHelpSession::new(client, taxonomy, SearchStatePersistence::unavailable());
    apply_args(&mut session, args, location).await;

    let applied = if session.location().is_some() {
        session.search().await
    } else {
        session.browse_all().await
    };
    if !applied {
        anyhow::bail!("search did not run");
    }

    if !args.no_retry {
        while offers_retry(session.status()) {
            if !session.retry().await {
                break;
            }
        }
    }

    if let SearchStatus::Failed {
        error,
        message,
        actions,
    } = session.status()
    {
        tracing::error!(error = %error, "find-help search failed");
        eprintln!("{message}");
        eprintln!("{}", recovery_hint(actions));
        anyhow::bail!("search failed: {error}");
    }

    let services = session.visible_services();
    let markers = args.map.then(|| session.markers());
    let notice = match session.status() {
        SearchStatus::Fallback { notice } => Some(notice.as_str()),
        _ => None,
    };
    let back_to_search = session.snapshot().map(|s| back_to_search_url(&s));

    if args.json {
        let output = FindHelpOutput {
            location: session.location(),
            notice,
            services: &services,
            markers: markers.as_deref(),
            back_to_search,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if let Some(notice) = notice {
            println!("{notice}\n");
        }
        print!("{}", render_services(&services));
        if let Some(markers) = &markers {
            print!("\n{}", render_markers(markers));
        }
        if let Some(url) = back_to_search {
            println!("\nback to search: {url}");
        }
    }

    Ok(())
}

/// Resolves the location the arguments describe, with the radius override
/// applied. `None` when no location argument was given.
async fn resolve_location(
    config: &AppConfig,
    registry: LocationRegistry,
    args: &FindHelpArgs,
    timeout: Duration,
) -> anyhow::Result<Option<(Location, Option<String>)>> {
    if let Some(postcode) = &args.postcode {
        let lookup = PostcodeLookup::new(&config.postcode_api_url, timeout)
            .map_err(|e| anyhow::anyhow!("failed to build postcode lookup: {e}"))?;
        let mut resolver = LocationResolver::without_geolocation(registry).with_postcode_lookup(lookup);
        resolver
            .submit_postcode(postcode)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))?;
        return Ok(with_radius(&mut resolver, args.radius).map(|l| (l, None)));
    }

    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        let mut resolver = LocationResolver::new(FixedGeolocation::at(lat, lng), registry);
        resolver
            .request_location()
            .await
            .map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))?;
        return Ok(with_radius(&mut resolver, args.radius).map(|l| (l, None)));
    }

    if let Some(slug) = &args.location {
        let mut resolver = LocationResolver::without_geolocation(registry);
        if !resolver.init_from_path(&format!("/{slug}")) {
            anyhow::bail!("unknown location '{slug}'; run `ssn-cli locations` to list them");
        }
        return Ok(with_radius(&mut resolver, args.radius).map(|l| (l, Some(slug.clone()))));
    }

    Ok(None)
}

fn with_radius<G: GeolocationProvider>(
    resolver: &mut LocationResolver<G>,
    radius: Option<f64>,
) -> Option<Location> {
    if radius.is_some() {
        resolver.set_location(LocationUpdate {
            radius,
            ..LocationUpdate::default()
        });
    }
    resolver.location().cloned()
}

async fn apply_args(
    session: &mut FindHelpSession,
    args: &FindHelpArgs,
    location: Option<(Location, Option<String>)>,
) {
    if let Some((location, slug)) = location {
        session.set_location(location, slug);
    }
    let selection = CategorySelection {
        category: args.category.clone().unwrap_or_default(),
        sub_category: args.sub_category.clone().unwrap_or_default(),
    };
    if selection != CategorySelection::default() {
        session.select(selection).await;
    }
    session.set_client_groups(args.client_groups.clone());
    session.set_open_now(args.open_now);
    session.set_timetable_days(args.days.clone());
    if let Some(sort) = args.sort {
        session.set_sort_order(sort);
    }
    if args.map {
        session.toggle_map();
    }
}

fn offers_retry(status: &SearchStatus) -> bool {
    matches!(status, SearchStatus::Failed { actions, .. } if actions.contains(&RecoveryAction::Retry))
}

pub(crate) fn recovery_hint(actions: &[RecoveryAction]) -> String {
    let hints: Vec<&str> = actions
        .iter()
        .map(|action| match action {
            RecoveryAction::Retry => "run the command again",
            RecoveryAction::ChangeLocation => "try another --postcode or --location",
            RecoveryAction::BrowseAll => "omit the location to browse all services",
        })
        .collect();
    format!("you can: {}", hints.join("; "))
}

pub(crate) fn render_services(services: &[ServiceWithDistance]) -> String {
    if services.is_empty() {
        return "no services match these filters\n".to_owned();
    }
    let mut out = format!(
        "{:<36}{:<28}{:<16}{:>9}\n",
        "SERVICE", "ORGANISATION", "CATEGORY", "DISTANCE"
    );
    for service in services {
        let distance = service
            .distance
            .map_or_else(|| "\u{2014}".to_owned(), |d| format!("{d:.1} km"));
        let _ = writeln!(
            out,
            "{:<36}{:<28}{:<16}{:>9}",
            truncate(&service.name, 35),
            truncate(&service.organisation.name, 27),
            truncate(&service.category, 15),
            distance
        );
    }
    out
}

pub(crate) fn render_markers(markers: &[Marker]) -> String {
    let mut out = format!("{:<28}{:>10}{:>11}  TITLE\n", "MARKER", "LAT", "LNG");
    for marker in markers {
        let _ = writeln!(
            out,
            "{:<28}{:>10.4}{:>11.4}  {}",
            truncate(&marker.id, 27),
            marker.lat,
            marker.lng,
            marker.title
        );
    }
    out
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_owned()
    } else {
        let mut cut: String = value.chars().take(max.saturating_sub(1)).collect();
        cut.push('\u{2026}');
        cut
    }
}

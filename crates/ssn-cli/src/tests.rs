use super::*;

use ssn_client::RecoveryAction;
use ssn_core::{CategoryTaxonomy, LocationRegistry, OrganisationRef, ServiceWithDistance, SortOrder};

use crate::find_help::{recovery_hint, render_services};
use crate::reference::{render_categories, render_locations};

fn find_help(args: &[&str]) -> FindHelpArgs {
    let argv = ["ssn-cli", "find-help"].into_iter().chain(args.iter().copied());
    match Cli::try_parse_from(argv).expect("expected valid cli args").command {
        Some(Commands::FindHelp(args)) => args,
        other => panic!("expected find-help, got {other:?}"),
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["ssn-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_postcode_search_with_filters() {
    let args = find_help(&[
        "--postcode",
        "M1 1AA",
        "--category",
        "medical",
        "--sub-category",
        "gp",
        "--client-group",
        "age-18-25",
        "--client-group",
        "women",
        "--open-now",
    ]);
    assert_eq!(args.postcode.as_deref(), Some("M1 1AA"));
    assert_eq!(args.category.as_deref(), Some("medical"));
    assert_eq!(args.sub_category.as_deref(), Some("gp"));
    assert_eq!(args.client_groups, vec!["age-18-25", "women"]);
    assert!(args.open_now);
    assert!(!args.json);
}

#[test]
fn parses_negative_longitude() {
    let args = find_help(&["--lat", "53.4808", "--lng", "-2.2426", "--radius", "10"]);
    assert_eq!(args.lat, Some(53.4808));
    assert_eq!(args.lng, Some(-2.2426));
    assert_eq!(args.radius, Some(10.0));
}

#[test]
fn lat_requires_lng() {
    assert!(Cli::try_parse_from(["ssn-cli", "find-help", "--lat", "53.48"]).is_err());
}

#[test]
fn postcode_conflicts_with_known_location() {
    let result = Cli::try_parse_from([
        "ssn-cli",
        "find-help",
        "--postcode",
        "M1 1AA",
        "--location",
        "manchester",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_sort_order_and_days() {
    let args = find_help(&["--location", "manchester", "--sort", "alpha", "--day", "0", "--day", "6"]);
    assert_eq!(args.sort, Some(SortOrder::Alpha));
    assert_eq!(args.days, vec![0, 6]);
}

#[test]
fn rejects_unknown_sort_and_out_of_range_day() {
    assert!(Cli::try_parse_from(["ssn-cli", "find-help", "--sort", "rating"]).is_err());
    assert!(Cli::try_parse_from(["ssn-cli", "find-help", "--day", "7"]).is_err());
}

#[test]
fn parses_locations_all_flag() {
    let cli = Cli::try_parse_from(["ssn-cli", "locations", "--all"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Locations { all: true })));
}

#[test]
fn parses_categories_command() {
    let cli = Cli::try_parse_from(["ssn-cli", "categories"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Categories)));
}

#[test]
fn render_services_lists_name_and_distance() {
    let service = ServiceWithDistance {
        id: "svc-1".to_owned(),
        name: "Test Health Service".to_owned(),
        category: "medical".to_owned(),
        organisation: OrganisationRef {
            name: "City Health".to_owned(),
            slug: "city-health".to_owned(),
            ..OrganisationRef::default()
        },
        distance: Some(1.234),
        ..ServiceWithDistance::default()
    };
    let table = render_services(&[service]);
    assert!(table.contains("Test Health Service"));
    assert!(table.contains("City Health"));
    assert!(table.contains("1.2 km"));
}

#[test]
fn render_services_reports_empty_result() {
    assert_eq!(render_services(&[]), "no services match these filters\n");
}

#[test]
fn recovery_hint_names_every_action() {
    let hint = recovery_hint(&[RecoveryAction::ChangeLocation, RecoveryAction::BrowseAll]);
    assert!(hint.contains("--postcode"));
    assert!(hint.contains("browse all"));
    assert!(!hint.contains("again"));
}

#[test]
fn bundled_reference_data_renders() {
    let taxonomy = CategoryTaxonomy::bundled().expect("bundled taxonomy");
    let categories = render_categories(&taxonomy);
    assert!(categories.lines().count() >= taxonomy.categories.len());

    let registry = LocationRegistry::bundled().expect("bundled locations");
    let public = render_locations(&registry, false);
    let all = render_locations(&registry, true);
    assert!(public.starts_with("SLUG"));
    assert!(all.lines().count() >= public.lines().count());
}

#[test]
fn locations_listing_hides_private_without_all() {
    let registry = LocationRegistry::bundled().expect("bundled locations");
    let public = render_locations(&registry, false);
    let all = render_locations(&registry, true);
    assert!(!public.lines().any(|l| l.starts_with("reading ")));
    assert!(all.lines().any(|l| l.starts_with("reading ")));
    assert_eq!(public.lines().count() - 1, registry.public().count());
}

use serde_json::json;

use super::*;

fn camel_record() -> Value {
    json!({
        "id": "svc-123",
        "name": "Test Health Service",
        "description": "Walk-in GP clinic",
        "category": "medical",
        "subCategory": "gp",
        "organisation": {
            "name": "Manchester Health",
            "slug": "manchester-health",
            "isVerified": true
        },
        "clientGroups": ["families", "young-people"],
        "openTimes": [
            { "day": 1, "start": 900, "end": 1700 }
        ],
        "distance": 1.25,
        "Location": { "type": "Point", "coordinates": [-2.2426, 53.4808] },
        "address": { "street": "1 Piccadilly", "city": "Manchester", "postcode": "M1 1AA" }
    })
}

fn legacy_record() -> Value {
    json!({
        "_id": { "$oid": "64f1c0ffee" },
        "ServiceProviderName": "Booth Centre",
        "ServiceProviderKey": "booth-centre",
        "IsVerified": false,
        "Info": "Day centre",
        "ParentCategoryKey": "support",
        "SubCategoryKey": "general",
        "ClientGroups": ["adults"],
        "OpeningTimes": [
            { "Day": 2, "StartTime": "09:30", "EndTime": "1500" }
        ],
        "Address": {
            "Street": "Edward Holt House",
            "City": "Manchester",
            "Postcode": "M4 4BX",
            "Location": { "type": "Point", "coordinates": [-2.2301, 53.4899] }
        }
    })
}

#[test]
fn normalizes_camel_case_record() {
    let service = normalize(&camel_record());
    assert_eq!(service.id, "svc-123");
    assert_eq!(service.name, "Test Health Service");
    assert_eq!(service.category, "medical");
    assert_eq!(service.sub_category, "gp");
    assert_eq!(service.organisation.slug, "manchester-health");
    assert!(service.organisation.is_verified);
    assert_eq!(service.client_groups, vec!["families", "young-people"]);
    assert_eq!(
        service.open_times,
        vec![OpenTime {
            day: 1,
            start: 900,
            end: 1700
        }]
    );
    assert_eq!(service.distance, Some(1.25));
    assert_eq!(service.address.postcode, "M1 1AA");
}

#[test]
fn normalizes_legacy_record() {
    let service = normalize(&legacy_record());
    assert_eq!(service.id, "64f1c0ffee");
    assert_eq!(service.name, "Booth Centre");
    assert_eq!(service.description, "Day centre");
    assert_eq!(service.category, "support");
    assert_eq!(service.sub_category, "general");
    assert_eq!(service.organisation.name, "Booth Centre");
    assert_eq!(service.organisation.slug, "booth-centre");
    assert!(!service.organisation.is_verified);
    assert_eq!(
        service.open_times,
        vec![OpenTime {
            day: 2,
            start: 930,
            end: 1500
        }]
    );
    assert!(service.distance.is_none());
    assert_eq!(service.address.street, "Edward Holt House");
}

#[test]
fn coordinates_are_read_as_lng_lat() {
    let service = normalize(&camel_record());
    assert!((service.latitude - 53.4808).abs() < 1e-9);
    assert!((service.longitude - -2.2426).abs() < 1e-9);

    let legacy = normalize(&legacy_record());
    assert!((legacy.latitude - 53.4899).abs() < 1e-9);
    assert!((legacy.longitude - -2.2301).abs() < 1e-9);
}

#[test]
fn camel_case_wins_when_both_conventions_present() {
    let mut record = legacy_record();
    record["name"] = json!("New Name");
    record["category"] = json!("medical");
    record["organisation"] = json!({ "name": "New Org", "slug": "new-org", "isVerified": true });
    let service = normalize(&record);
    assert_eq!(service.name, "New Name");
    assert_eq!(service.category, "medical");
    assert_eq!(service.organisation.name, "New Org");
    assert_eq!(service.organisation.slug, "new-org");
    assert!(service.organisation.is_verified);
}

#[test]
fn empty_camel_case_value_falls_back_to_legacy() {
    let mut record = legacy_record();
    record["category"] = json!("");
    let service = normalize(&record);
    assert_eq!(service.category, "support");
}

#[test]
fn missing_fields_default() {
    let service = normalize(&json!({}));
    assert_eq!(service, ServiceWithDistance::default());
    assert!((service.latitude).abs() < f64::EPSILON);
    assert!((service.longitude).abs() < f64::EPSILON);
}

#[test]
fn malformed_fields_default_without_failing() {
    let record = json!({
        "id": 42,
        "name": ["not", "a", "string"],
        "clientGroups": "families",
        "openTimes": [{ "day": "x", "start": null, "end": true }],
        "Location": { "coordinates": [1.0] },
        "distance": "near"
    });
    let service = normalize(&record);
    assert_eq!(service.id, "42");
    assert_eq!(service.name, "");
    assert!(service.client_groups.is_empty());
    assert_eq!(service.open_times, vec![OpenTime::default()]);
    assert!((service.latitude).abs() < f64::EPSILON);
    assert!(service.distance.is_none());
}

#[test]
fn non_numeric_coordinates_default_to_origin() {
    let record = json!({ "Location": { "coordinates": ["a", "b"] } });
    let service = normalize(&record);
    assert!((service.latitude).abs() < f64::EPSILON);
    assert!((service.longitude).abs() < f64::EPSILON);
}

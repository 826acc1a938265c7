//! Maps raw service records into [`ServiceWithDistance`].
//!
//! Two field-naming conventions coexist in the directory: the legacy
//! PascalCase shape (`ServiceProviderName`, `OpeningTimes`, `Address`) and
//! the newer camelCase shape with a nested `organisation` object. Every field
//! is looked up through an ordered key list with the camelCase key first;
//! empty strings count as absent. The mapping is total: missing or mistyped
//! fields fall back to empty values and `[0, 0]` coordinates.

use serde_json::Value;
use ssn_core::{OpenTime, OrganisationRef, ServiceAddress, ServiceWithDistance};

const COORDINATE_PATHS: &[&[&str]] = &[
    &["Location", "coordinates"],
    &["location", "coordinates"],
    &["address", "Location", "coordinates"],
    &["Address", "Location", "coordinates"],
];

/// Normalizes one raw record. Never fails.
#[must_use]
pub fn normalize(raw: &Value) -> ServiceWithDistance {
    let organisation = raw.get("organisation").filter(|v| v.is_object());
    let (latitude, longitude) = coordinates(raw);

    ServiceWithDistance {
        id: id_of(raw),
        name: text(raw, &["name", "Title", "ServiceProviderName"]),
        description: text(raw, &["description", "Info", "Description"]),
        category: text(raw, &["category", "ParentCategoryKey"]),
        sub_category: text(raw, &["subCategory", "SubCategoryKey"]),
        latitude,
        longitude,
        organisation: OrganisationRef {
            name: organisation
                .map(|o| text(o, &["name"]))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| text(raw, &["organisationName", "ServiceProviderName"])),
            slug: organisation
                .map(|o| text(o, &["slug", "key"]))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| text(raw, &["organisationSlug", "ServiceProviderKey"])),
            is_verified: organisation
                .and_then(|o| o.get("isVerified"))
                .or_else(|| raw.get("IsVerified"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        client_groups: string_list(first(raw, &["clientGroups", "ClientGroups"])),
        open_times: first(raw, &["openTimes", "OpeningTimes"])
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(open_time).collect())
            .unwrap_or_default(),
        distance: first(raw, &["distance", "Distance"]).and_then(Value::as_f64),
        address: address(raw),
    }
}

/// First present, non-null value among `keys`.
fn first<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null() && v.as_str() != Some(""))
}

fn text(raw: &Value, keys: &[&str]) -> String {
    first(raw, keys)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

fn id_of(raw: &Value) -> String {
    let Some(value) = first(raw, &["id", "_id", "Id", "Key"]) else {
        return String::new();
    };
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        // Mongo extended JSON: {"$oid": "..."}
        Value::Object(map) => map
            .get("$oid")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Reads `[longitude, latitude]` and returns `(latitude, longitude)`.
fn coordinates(raw: &Value) -> (f64, f64) {
    COORDINATE_PATHS
        .iter()
        .find_map(|path| {
            let pair = path
                .iter()
                .try_fold(raw, |node, key| node.get(*key))?
                .as_array()?;
            match pair.as_slice() {
                [lng, lat] => Some((lat.as_f64()?, lng.as_f64()?)),
                _ => None,
            }
        })
        .unwrap_or((0.0, 0.0))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn open_time(entry: &Value) -> OpenTime {
    OpenTime {
        day: first(entry, &["day", "Day"])
            .and_then(clock_number)
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or(0),
        start: first(entry, &["start", "StartTime"])
            .and_then(clock_number)
            .unwrap_or(0),
        end: first(entry, &["end", "EndTime"])
            .and_then(clock_number)
            .unwrap_or(0),
    }
}

/// Accepts `930`, `"930"` and `"09:30"`; the encoding itself is kept.
fn clock_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| *c != ':').collect();
            digits.trim().parse().ok()
        }
        _ => None,
    }
}

fn address(raw: &Value) -> ServiceAddress {
    let Some(node) = first(raw, &["address", "Address"]).filter(|v| v.is_object()) else {
        return ServiceAddress::default();
    };
    ServiceAddress {
        street: text(node, &["street", "Street", "Street1"]),
        city: text(node, &["city", "City"]),
        postcode: text(node, &["postcode", "Postcode"]),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

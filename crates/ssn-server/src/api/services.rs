use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssn_core::{filter::distance_km, Coordinates, DEFAULT_RADIUS_KM};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

pub(super) const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub(super) struct ServicesQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Kilometres.
    pub radius: Option<f64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
}

/// `{ "results": [...] }`, the shape the query client consumes.
#[derive(Debug, Serialize)]
pub(super) struct ServicesBody {
    results: Vec<Value>,
}

pub(super) fn normalize_limit(limit: Option<i64>) -> usize {
    let clamped = limit.unwrap_or(1000).clamp(1, 1000);
    usize::try_from(clamped).unwrap_or(MAX_LIMIT)
}

fn origin(request_id: &str, query: &ServicesQuery) -> Result<Option<Coordinates>, ApiError> {
    match (query.lat, query.lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(ApiError::new(
                    request_id,
                    "validation_error",
                    "lat must be within [-90, 90] and lng within [-180, 180]",
                ));
            }
            Ok(Some(Coordinates { lat, lng }))
        }
        _ => Err(ApiError::new(
            request_id,
            "validation_error",
            "lat and lng must be given together",
        )),
    }
}

/// Radius search over the directory.
///
/// With `lat`/`lng` only services within `radius` km (great-circle) match,
/// nearest first, and each record gains a `distance` field. Without them no
/// geo filter applies and directory order is kept.
pub(super) async fn list_services(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ServicesQuery>, QueryRejection>,
) -> Result<Json<ServicesBody>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.body_text()))?;
    let directory = state.directory(&req_id.0)?;
    let origin = origin(&req_id.0, &query)?;
    let radius = query
        .radius
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(DEFAULT_RADIUS_KM);
    let limit = normalize_limit(query.limit);
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    let mut matches: Vec<(Option<f64>, &Value)> = directory
        .services
        .iter()
        .filter(|entry| category.is_none_or(|c| entry.service.category == c))
        .filter_map(|entry| match origin {
            Some(origin) => {
                let distance = distance_km(origin, entry.service.coordinates());
                (distance <= radius).then_some((Some(distance), &entry.raw))
            }
            None => Some((None, &entry.raw)),
        })
        .collect();

    if origin.is_some() {
        matches.sort_by(|a, b| {
            a.0.unwrap_or(f64::INFINITY)
                .total_cmp(&b.0.unwrap_or(f64::INFINITY))
        });
    }

    let results: Vec<Value> = matches
        .into_iter()
        .take(limit)
        .map(|(distance, raw)| with_distance(raw.clone(), distance))
        .collect();

    tracing::debug!(
        request_id = %req_id.0,
        results = results.len(),
        radius,
        category = category.unwrap_or(""),
        "services query"
    );
    Ok(Json(ServicesBody { results }))
}

fn with_distance(mut raw: Value, distance: Option<f64>) -> Value {
    if let (Some(distance), Value::Object(map)) = (distance, &mut raw) {
        map.insert("distance".to_owned(), Value::from(distance));
    }
    raw
}

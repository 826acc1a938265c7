//! Reference content: categories, FAQs and locations, rewritten from the
//! store's PascalCase into camelCase.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{camel_case_keys, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct FaqsQuery {
    pub location: Option<String>,
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let directory = state.directory(&req_id.0)?;
    let data = directory
        .categories
        .iter()
        .cloned()
        .map(camel_case_keys)
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// FAQs, optionally restricted to one location, ordered by `sortPosition`
/// (descending) where present.
pub(super) async fn list_faqs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FaqsQuery>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let directory = state.directory(&req_id.0)?;
    let location = query.location.as_deref().filter(|l| !l.is_empty());

    let mut data: Vec<Value> = directory
        .faqs
        .iter()
        .cloned()
        .map(camel_case_keys)
        .filter(|faq| {
            location.is_none_or(|l| faq.get("locationKey").and_then(Value::as_str) == Some(l))
        })
        .collect();
    data.sort_by(|a, b| sort_position(b).total_cmp(&sort_position(a)));

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let directory = state.directory(&req_id.0)?;
    let data = directory.cities.iter().cloned().map(camel_case_keys).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

fn sort_position(faq: &Value) -> f64 {
    faq.get("sortPosition")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

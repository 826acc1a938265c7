use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use ssn_core::{organisation_locations, OrganisationLocation, ServiceWithDistance};

use crate::middleware::RequestId;

use super::{camel_case_keys, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct OrganisationDetail {
    organisation: Value,
    services: Vec<ServiceWithDistance>,
    /// Deduplicated sites, in the order map marker indices refer to.
    locations: Vec<OrganisationLocation>,
}

/// Organisation record plus its services. Without a stored record the
/// organisation is described from its first service.
pub(super) async fn get_organisation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<OrganisationDetail>>, ApiError> {
    let directory = state.directory(&req_id.0)?;
    let services = directory.organisation_services(&slug);

    let organisation = match (directory.organisation(&slug), services.first()) {
        (Some(record), _) => camel_case_keys(record.clone()),
        (None, Some(first)) => serde_json::to_value(&first.organisation)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to serialize organisation");
                ApiError::new(req_id.0.clone(), "internal_error", "failed to build organisation")
            })?,
        (None, None) => {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                format!("organisation '{slug}' not found"),
            ));
        }
    };

    let locations = organisation_locations(&services);
    Ok(Json(ApiResponse::new(
        OrganisationDetail {
            organisation,
            services,
            locations,
        },
        req_id.0,
    )))
}

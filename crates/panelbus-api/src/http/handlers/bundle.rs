//! Bundle metadata endpoints.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};

use panelbus_core::bundle::BundleMetadata;
use panelbus_types::bundle::BundleDescriptor;
use panelbus_types::name::BundleName;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/bundles - All loaded bundle descriptors.
pub async fn list_bundles(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<BundleDescriptor>>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bundles = state.bundles.descriptors();

    let elapsed = start.elapsed().as_millis() as u64;
    Json(ApiResponse::success(bundles, request_id, elapsed).with_link("self", "/api/v1/bundles"))
}

/// GET /api/v1/bundles/{name} - One bundle's version and git provenance.
pub async fn get_bundle(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<BundleDescriptor>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bundle_name = BundleName::new(name.as_str())?;
    let descriptor = state
        .bundles
        .descriptor(&bundle_name)
        .ok_or(AppError::BundleNotFound(name))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let self_link = format!("/api/v1/bundles/{}", descriptor.name);
    Ok(Json(
        ApiResponse::success(descriptor, request_id, elapsed).with_link("self", &self_link),
    ))
}

//! Route handlers.
//!
//! Handlers only unpack the request and shape the response; all decisions
//! live in [`crate::service`] and [`crate::health`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::health::HealthReport;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::service::ConfigEntryRequest;
use crate::store::ConfigEntry;

/// `GET /ping`: 200 when the store answers, 503 when it does not.
pub async fn ping(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health.check().await;
    let status = if report.store_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

pub async fn create_config(
    State(state): State<AppState>,
    payload: Result<Json<ConfigEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConfigEntry>), ApiError> {
    let Json(request) = payload?;
    let entry = state.service.create(request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_configs(State(state): State<AppState>) -> Result<Json<Vec<ConfigEntry>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConfigEntry>, ApiError> {
    Ok(Json(state.service.get(&id).await?))
}

pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ConfigEntryRequest>, JsonRejection>,
) -> Result<Json<ConfigEntry>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.service.update(&id, request).await?))
}

pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

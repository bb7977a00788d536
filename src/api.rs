//! HTTP read API.
//!
//! Four JSON endpoints consumed by the map and dashboard front ends. Field
//! names and timestamp formatting are fixed; the front ends bind to them.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::errors::FleetTrackerError;
use crate::models::{PositionReport, VehicleId, VehicleStatus};
use crate::repository::{ReportRepository, StatusRepository};

/// Hard cap on the number of identifiers considered in a filter; anything
/// beyond it is truncated silently to keep the endpoint available under
/// misuse.
const MAX_FILTER_IDS: usize = 500;

/// Hard ceiling on trail length, regardless of the client's request.
const MAX_TRAIL_ROWS: u32 = 100;

#[derive(Clone)]
pub struct AppState {
    reports: Arc<dyn ReportRepository>,
    statuses: Arc<dyn StatusRepository>,
}

impl AppState {
    pub fn new(reports: Arc<dyn ReportRepository>, statuses: Arc<dyn StatusRepository>) -> Self {
        Self { reports, statuses }
    }
}

/// Build the API router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/vehicles", get(vehicles))
        .route("/api/latest", get(latest))
        .route("/api/track", get(track))
        .route("/api/status", get(status))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Server-side failure, rendered without internal detail.
struct ApiError;

impl ApiError {
    /// Log the underlying error and hide it from the client.
    fn internal(err: FleetTrackerError) -> Self {
        error!("Request failed: {err}");
        ApiError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "internal server error"})),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct VehicleSummary {
    #[serde(rename = "vehicleId")]
    vehicle_id: i64,
    name: String,
}

#[derive(Debug, Serialize)]
struct PositionDto {
    id: i64,
    #[serde(rename = "vehicleId")]
    vehicle_id: i64,
    name: String,
    lat: f64,
    lon: f64,
    timestamp: String,
}

impl From<PositionReport> for PositionDto {
    fn from(report: PositionReport) -> Self {
        PositionDto {
            id: report.id,
            vehicle_id: report.vehicle_id.value(),
            name: report.name,
            lat: report.lat,
            lon: report.lon,
            timestamp: format_timestamp(report.recorded_at),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusDto {
    id: i64,
    #[serde(rename = "externalId")]
    external_id: Option<String>,
    name: String,
    color: &'static str,
    lat: Option<f64>,
    lng: Option<f64>,
    driver: Option<String>,
}

impl From<VehicleStatus> for StatusDto {
    fn from(status: VehicleStatus) -> Self {
        let color = status.label().color();
        StatusDto {
            id: status.id,
            external_id: status.external_id,
            name: status.name,
            color,
            lat: status.lat,
            lng: status.lon,
            driver: status.driver,
        }
    }
}

/// ISO-8601 with a space separator and no timezone suffix, as the front
/// ends expect.
fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Permissive parse of a comma-separated vehicle id list.
///
/// Malformed tokens are dropped, not errored; the result is truncated at
/// `max_ids`. Bad client input degrades gracefully instead of failing the
/// whole request.
fn parse_vehicle_ids(csv: &str, max_ids: usize) -> Vec<VehicleId> {
    let mut out = Vec::new();
    for part in csv.split(',') {
        match VehicleId::try_from(part) {
            Ok(id) => out.push(id),
            Err(_) => debug!("Dropping malformed vehicle id token {part:?}"),
        }
        if out.len() >= max_ids {
            break;
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct LatestParams {
    vehicle_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackParams {
    vehicle_id: Option<String>,
    limit: Option<u32>,
}

/// `GET /api/vehicles` — every known vehicle with its current display name,
/// taken from its latest report.
async fn vehicles(State(state): State<AppState>) -> Result<Json<Vec<VehicleSummary>>, ApiError> {
    let latest = state
        .reports
        .latest_per_vehicle(None)
        .await
        .map_err(ApiError::internal)?;

    let summaries = latest
        .into_iter()
        .map(|report| VehicleSummary {
            vehicle_id: report.vehicle_id.value(),
            name: report.name,
        })
        .collect();

    Ok(Json(summaries))
}

/// `GET /api/latest?vehicle_ids=1,2,3` — latest position per vehicle,
/// optionally filtered, sorted by vehicle id.
async fn latest(
    State(state): State<AppState>,
    Query(params): Query<LatestParams>,
) -> Result<Json<Vec<PositionDto>>, ApiError> {
    let ids = params
        .vehicle_ids
        .as_deref()
        .map(|csv| parse_vehicle_ids(csv, MAX_FILTER_IDS))
        .unwrap_or_default();

    let filter = if ids.is_empty() {
        None
    } else {
        Some(ids.as_slice())
    };

    let latest = state
        .reports
        .latest_per_vehicle(filter)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(latest.into_iter().map(PositionDto::from).collect()))
}

/// `GET /api/track?vehicle_id=7&limit=50` — up to `min(limit, 100)` most
/// recent reports for one vehicle, oldest first for trail replay.
async fn track(
    State(state): State<AppState>,
    Query(params): Query<TrackParams>,
) -> Result<Json<Vec<PositionDto>>, ApiError> {
    let vehicle_id = match params.vehicle_id.as_deref().map(VehicleId::try_from) {
        Some(Ok(id)) => id,
        _ => {
            warn!(
                "Track request without a usable vehicle_id: {:?}",
                params.vehicle_id
            );
            return Ok(Json(Vec::new()));
        }
    };

    let limit = params.limit.unwrap_or(MAX_TRAIL_ROWS).min(MAX_TRAIL_ROWS);

    let mut reports = state
        .reports
        .recent_for_vehicle(vehicle_id, limit)
        .await
        .map_err(ApiError::internal)?;

    // Retrieval is newest-first; trail clients replay oldest-first.
    reports.reverse();

    Ok(Json(reports.into_iter().map(PositionDto::from).collect()))
}

/// `GET /api/status` — operational status of every vehicle, classified into
/// a display color.
async fn status(State(state): State<AppState>) -> Result<Json<Vec<StatusDto>>, ApiError> {
    let statuses = state
        .statuses
        .all_statuses()
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(statuses.into_iter().map(StatusDto::from).collect()))
}

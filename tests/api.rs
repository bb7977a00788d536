//! End-to-end tests of the JSON API over the in-memory repository.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDateTime;
use tower::ServiceExt;

use fleet_tracker::api::{self, AppState};
use fleet_tracker::errors::FleetTrackerError;
use fleet_tracker::models::{PositionReport, VehicleId, VehicleStatus};
use fleet_tracker::repository::memory::InMemoryFleet;
use fleet_tracker::repository::ReportRepository;

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn report(id: i64, vehicle: i64, at: &str) -> PositionReport {
    PositionReport {
        id,
        vehicle_id: VehicleId::try_from(vehicle).unwrap(),
        name: format!("B-{vehicle}"),
        lat: -33.45,
        lon: -70.66,
        recorded_at: ts(at),
    }
}

fn status(id: i64, name: &str, flags: (bool, bool, bool)) -> VehicleStatus {
    VehicleStatus {
        id,
        external_id: Some(format!("ext-{id}")),
        name: name.to_string(),
        lat: Some(-33.45),
        lon: Some(-70.66),
        in_service: flags.0,
        available: flags.1,
        failure: flags.2,
        driver: None,
    }
}

fn router_over(fleet: InMemoryFleet) -> Router {
    let fleet = Arc::new(fleet);
    let state = AppState::new(fleet.clone(), fleet);
    api::router(state, Duration::from_secs(5))
}

async fn get(router: Router, uri: &str) -> Response {
    router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get_json(router: Router, uri: &str) -> serde_json::Value {
    let response = get(router, uri).await;
    assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn latest_resolves_most_recent_report_per_vehicle() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_report(report(100, 1, "2024-06-01 10:00:00"));
    fleet.push_report(report(101, 1, "2024-06-01 10:05:00"));
    fleet.push_report(report(102, 2, "2024-06-01 09:00:00"));

    let body = get_json(router_over(fleet), "/api/latest").await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["vehicleId"], 1);
    assert_eq!(rows[0]["id"], 101);
    assert_eq!(rows[0]["timestamp"], "2024-06-01 10:05:00");
    assert_eq!(rows[1]["vehicleId"], 2);
    assert_eq!(rows[1]["id"], 102);
    assert_eq!(rows[1]["timestamp"], "2024-06-01 09:00:00");
}

#[tokio::test]
async fn latest_filter_with_malformed_token_is_equivalent_to_clean_filter() {
    let mut fleet = InMemoryFleet::new();
    for vehicle in 1..=6 {
        fleet.push_report(report(vehicle, vehicle, "2024-06-01 10:00:00"));
    }

    let body = get_json(router_over(fleet), "/api/latest?vehicle_ids=3,abc,5").await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["vehicleId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 5]);
}

#[tokio::test]
async fn latest_with_empty_filter_returns_all_vehicles() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_report(report(1, 1, "2024-06-01 10:00:00"));
    fleet.push_report(report(2, 2, "2024-06-01 10:00:00"));

    let body = get_json(router_over(fleet), "/api/latest?vehicle_ids=").await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn latest_response_carries_expected_fields() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_report(report(7, 3, "2024-06-01 10:00:00"));

    let body = get_json(router_over(fleet), "/api/latest").await;
    let row = &body.as_array().unwrap()[0];
    let keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
    for key in ["id", "vehicleId", "name", "lat", "lon", "timestamp"] {
        assert!(keys.contains(&key), "missing {key} in {row}");
    }
    assert_eq!(row["name"], "B-3");
    assert_eq!(row["lat"], -33.45);
    assert_eq!(row["lon"], -70.66);
}

#[tokio::test]
async fn track_replays_oldest_first() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_report(report(3, 1, "2024-06-01 10:02:00"));
    fleet.push_report(report(1, 1, "2024-06-01 10:00:00"));
    fleet.push_report(report(2, 1, "2024-06-01 10:01:00"));

    let body = get_json(router_over(fleet), "/api/track?vehicle_id=1").await;
    let timestamps: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["timestamp"].as_str().unwrap())
        .collect();
    assert_eq!(
        timestamps,
        vec![
            "2024-06-01 10:00:00",
            "2024-06-01 10:01:00",
            "2024-06-01 10:02:00"
        ]
    );
}

#[tokio::test]
async fn track_clamps_limit_to_ceiling() {
    let mut fleet = InMemoryFleet::new();
    for i in 0..150 {
        fleet.push_report(report(i, 1, &format!("2024-06-01 10:{:02}:{:02}", i / 60, i % 60)));
    }

    let body = get_json(router_over(fleet), "/api/track?vehicle_id=1&limit=500").await;
    assert_eq!(body.as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn track_returns_requested_limit_when_below_ceiling() {
    let mut fleet = InMemoryFleet::new();
    for i in 0..10 {
        fleet.push_report(report(i, 1, &format!("2024-06-01 10:00:{i:02}")));
    }

    let body = get_json(router_over(fleet), "/api/track?vehicle_id=1&limit=4").await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    // The four most recent, replayed in chronological order
    assert_eq!(rows[0]["id"], 6);
    assert_eq!(rows[3]["id"], 9);
}

#[tokio::test]
async fn track_of_unknown_vehicle_is_empty_not_error() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_report(report(1, 1, "2024-06-01 10:00:00"));

    let body = get_json(router_over(fleet), "/api/track?vehicle_id=42").await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn track_with_malformed_vehicle_id_is_empty_not_error() {
    let fleet = InMemoryFleet::new();
    let body = get_json(router_over(fleet), "/api/track?vehicle_id=abc").await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn vehicles_lists_latest_names_sorted_by_vehicle_id() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_report(report(1, 2, "2024-06-01 10:00:00"));
    let mut renamed = report(2, 2, "2024-06-01 11:00:00");
    renamed.name = "B-2 reserve".to_string();
    fleet.push_report(renamed);
    fleet.push_report(report(3, 1, "2024-06-01 10:00:00"));

    let body = get_json(router_over(fleet), "/api/vehicles").await;
    assert_eq!(
        body,
        serde_json::json!([
            {"vehicleId": 1, "name": "B-1"},
            {"vehicleId": 2, "name": "B-2 reserve"},
        ])
    );
}

#[tokio::test]
async fn status_classifies_and_orders_by_name() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_status(status(1, "Rescue 2", (true, true, false)));
    fleet.push_status(status(2, "Engine 1", (true, false, false)));
    fleet.push_status(status(3, "Ladder 9", (false, false, true)));
    fleet.push_status(status(4, "Tanker 4", (false, true, false)));

    let body = get_json(router_over(fleet), "/api/status").await;
    let rows = body.as_array().unwrap();

    let summary: Vec<(&str, &str)> = rows
        .iter()
        .map(|row| {
            (
                row["name"].as_str().unwrap(),
                row["color"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Engine 1", "blue"),
            ("Ladder 9", "red"),
            ("Rescue 2", "green"),
            ("Tanker 4", "yellow"),
        ]
    );
}

#[tokio::test]
async fn status_with_all_flags_false_is_red() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_status(status(1, "Engine 1", (false, false, false)));

    let body = get_json(router_over(fleet), "/api/status").await;
    assert_eq!(body.as_array().unwrap()[0]["color"], "red");
}

#[tokio::test]
async fn status_response_carries_expected_fields() {
    let mut fleet = InMemoryFleet::new();
    let mut with_driver = status(5, "Engine 1", (true, true, false));
    with_driver.driver = Some("J. Soto".to_string());
    fleet.push_status(with_driver);

    let body = get_json(router_over(fleet), "/api/status").await;
    let row = &body.as_array().unwrap()[0];
    assert_eq!(row["id"], 5);
    assert_eq!(row["externalId"], "ext-5");
    assert_eq!(row["name"], "Engine 1");
    assert_eq!(row["color"], "green");
    assert_eq!(row["lat"], -33.45);
    assert_eq!(row["lng"], -70.66);
    assert_eq!(row["driver"], "J. Soto");
}

#[tokio::test]
async fn status_renders_nullable_fields_as_null() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_status(VehicleStatus {
        id: 1,
        external_id: None,
        name: "Engine 1".to_string(),
        lat: None,
        lon: None,
        in_service: true,
        available: true,
        failure: false,
        driver: None,
    });

    let body = get_json(router_over(fleet), "/api/status").await;
    let row = &body.as_array().unwrap()[0];
    assert_eq!(row["externalId"], serde_json::Value::Null);
    assert_eq!(row["lat"], serde_json::Value::Null);
    assert_eq!(row["lng"], serde_json::Value::Null);
    assert_eq!(row["driver"], serde_json::Value::Null);
}

/// Repository that always fails, standing in for an unreachable database.
struct UnavailableSource;

#[async_trait::async_trait]
impl ReportRepository for UnavailableSource {
    async fn latest_per_vehicle(
        &self,
        _filter: Option<&[VehicleId]>,
    ) -> Result<Vec<PositionReport>, FleetTrackerError> {
        Err(FleetTrackerError::DatabaseConnectionError(
            "connection refused (host=db.internal)".to_string(),
        ))
    }

    async fn recent_for_vehicle(
        &self,
        _id: VehicleId,
        _limit: u32,
    ) -> Result<Vec<PositionReport>, FleetTrackerError> {
        Err(FleetTrackerError::DatabaseConnectionError(
            "connection refused (host=db.internal)".to_string(),
        ))
    }
}

#[tokio::test]
async fn source_failure_yields_generic_error_without_internal_detail() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_status(status(1, "Engine 1", (true, true, false)));
    let state = AppState::new(Arc::new(UnavailableSource), Arc::new(fleet));
    let router = api::router(state, Duration::from_secs(5));

    let response = get(router, "/api/latest").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, serde_json::json!({"error": "internal server error"}));
}

#[tokio::test]
async fn position_source_failure_does_not_affect_status_endpoint() {
    let mut fleet = InMemoryFleet::new();
    fleet.push_status(status(1, "Engine 1", (true, true, false)));
    let state = AppState::new(Arc::new(UnavailableSource), Arc::new(fleet));
    let router = api::router(state, Duration::from_secs(5));

    let failed = get(router.clone(), "/api/track?vehicle_id=1").await;
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let ok = get_json(router, "/api/status").await;
    assert_eq!(ok.as_array().unwrap().len(), 1);
}

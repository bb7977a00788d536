//! Data models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::FleetTrackerError;

/// Vehicle identifier
///
/// Integer key assigned by the upstream fleet management system. Many
/// position reports share one vehicle id; status rows carry exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(i64);

impl TryFrom<i64> for VehicleId {
    type Error = FleetTrackerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(FleetTrackerError::InvalidVehicleId(value.to_string()));
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for VehicleId {
    type Error = FleetTrackerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed = value
            .trim()
            .parse::<i64>()
            .map_err(|_| FleetTrackerError::InvalidVehicleId(value.to_string()))?;
        Self::try_from(parsed)
    }
}

impl VehicleId {
    /// Get the raw vehicle id value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One observed location of one vehicle at one instant.
///
/// Append-only: rows are created by an external ingestion process and never
/// mutated or deleted from this service's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// Unique, monotonically assigned record id.
    pub id: i64,
    /// Reporting vehicle.
    pub vehicle_id: VehicleId,
    /// Display label of the vehicle at the time of the report.
    pub name: String,
    /// Latitude in WGS84 decimal degrees.
    pub lat: f64,
    /// Longitude in WGS84 decimal degrees.
    pub lon: f64,
    /// Observation timestamp, stored without timezone.
    pub recorded_at: NaiveDateTime,
}

impl PositionReport {
    /// Ordering key for "latest report" resolution.
    ///
    /// Reports with equal timestamps are ranked by record id, so the most
    /// recently inserted row wins deterministically under concurrent writers.
    pub fn observation_key(&self) -> (NaiveDateTime, i64) {
        (self.recorded_at, self.id)
    }
}

/// Point-in-time operational state of one vehicle.
///
/// Owned and mutated by an external operational system; read here as a
/// snapshot. NULL flags are coerced to `false` before this struct is
/// built, in the database row conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub id: i64,
    /// Secondary identifier from the upstream system, passed through opaquely.
    pub external_id: Option<String>,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub in_service: bool,
    pub available: bool,
    pub failure: bool,
    pub driver: Option<String>,
}

impl VehicleStatus {
    /// Classify this vehicle's operational flags.
    pub fn label(&self) -> StatusLabel {
        StatusLabel::classify(self.in_service, self.available, self.failure)
    }
}

/// Status classification of a vehicle, derived from its operational flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    Operational,
    Dispatched,
    Down,
    Standby,
    /// Not producible by [`StatusLabel::classify`]; exists so that labels
    /// arriving from outside the classifier always have a rendering.
    Unknown,
}

impl StatusLabel {
    /// Classify three operational flags into a status label.
    ///
    /// Pure and total. The flags are independent; all 8 combinations are
    /// legal input. Arms are evaluated top to bottom, first match wins:
    ///
    /// | in_service | available | failure | label       |
    /// |-----------|-----------|---------|-------------|
    /// | true      | true      | *       | Operational |
    /// | true      | false     | *       | Dispatched  |
    /// | false     | *         | true    | Down        |
    /// | false     | true      | *       | Standby     |
    /// | false     | false     | *       | Down        |
    pub fn classify(in_service: bool, available: bool, failure: bool) -> Self {
        match (in_service, available, failure) {
            (true, true, _) => StatusLabel::Operational,
            (true, false, _) => StatusLabel::Dispatched,
            (false, _, true) => StatusLabel::Down,
            (false, true, _) => StatusLabel::Standby,
            (false, false, _) => StatusLabel::Down,
        }
    }

    /// Display color consumed by the dashboard front ends.
    pub fn color(&self) -> &'static str {
        match self {
            StatusLabel::Operational => "green",
            StatusLabel::Dispatched => "blue",
            StatusLabel::Down => "red",
            StatusLabel::Standby => "yellow",
            StatusLabel::Unknown => "gray",
        }
    }
}

impl Default for StatusLabel {
    fn default() -> Self {
        StatusLabel::Unknown
    }
}

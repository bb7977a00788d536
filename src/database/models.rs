// src/database/models.rs
use chrono::NaiveDateTime;

use crate::errors::FleetTrackerError;
use crate::models::{PositionReport, VehicleId, VehicleStatus};

/// Raw `positions` row.
///
/// The table is written by an external ingester, so everything beyond the
/// keys is nullable here; interpreting a row can fail.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PositionRow {
    pub id: i64,
    pub vehicle_id: i64,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub recorded_at: Option<NaiveDateTime>,
}

impl TryFrom<PositionRow> for PositionReport {
    type Error = FleetTrackerError;

    fn try_from(row: PositionRow) -> Result<Self, Self::Error> {
        let recorded_at = row.recorded_at.ok_or_else(|| FleetTrackerError::MalformedRow {
            reason: format!("position row {} has no timestamp", row.id),
        })?;
        let lat = row.lat.ok_or_else(|| FleetTrackerError::MalformedRow {
            reason: format!("position row {} has no latitude", row.id),
        })?;
        let lon = row.lon.ok_or_else(|| FleetTrackerError::MalformedRow {
            reason: format!("position row {} has no longitude", row.id),
        })?;

        Ok(PositionReport {
            id: row.id,
            vehicle_id: VehicleId::try_from(row.vehicle_id)?,
            name: row.name.unwrap_or_default(),
            lat,
            lon,
            recorded_at,
        })
    }
}

/// Raw `vehicle_status` row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StatusRow {
    pub id: i64,
    pub external_id: Option<String>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub in_service: Option<bool>,
    pub available: Option<bool>,
    pub failure: Option<bool>,
    pub driver: Option<String>,
}

impl From<StatusRow> for VehicleStatus {
    /// NULL flags read as `false`; classification never sees a tri-state.
    fn from(row: StatusRow) -> Self {
        VehicleStatus {
            id: row.id,
            external_id: row.external_id,
            name: row.name.unwrap_or_default(),
            lat: row.lat,
            lon: row.lon,
            in_service: row.in_service.unwrap_or(false),
            available: row.available.unwrap_or(false),
            failure: row.failure.unwrap_or(false),
            driver: row.driver,
        }
    }
}

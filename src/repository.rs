//! Read capabilities consumed by the API layer.
//!
//! The handlers never talk to a concrete data source; they are handed these
//! traits. [`crate::database::Database`] backs them with Postgres,
//! [`memory::InMemoryFleet`] backs them in process for tests.

use async_trait::async_trait;

use crate::errors::FleetTrackerError;
use crate::models::{PositionReport, VehicleId, VehicleStatus};

pub mod memory;

/// Read access to the append-only position report stream.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Latest report per vehicle.
    ///
    /// With a filter, only the listed vehicles are considered; without one,
    /// all known vehicles. For every vehicle that has at least one report,
    /// the result holds exactly the report with the maximum
    /// `(recorded_at, id)`; vehicles without reports are absent. Sorted by
    /// vehicle id ascending.
    async fn latest_per_vehicle(
        &self,
        filter: Option<&[VehicleId]>,
    ) -> Result<Vec<PositionReport>, FleetTrackerError>;

    /// Up to `limit` most recent reports for one vehicle, newest first.
    ///
    /// Callers wanting chronological order reverse the result themselves.
    /// An unknown vehicle yields an empty vector.
    async fn recent_for_vehicle(
        &self,
        id: VehicleId,
        limit: u32,
    ) -> Result<Vec<PositionReport>, FleetTrackerError>;
}

/// Read access to the mutable per-vehicle status table.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Snapshot of every vehicle's operational status, ordered by name.
    async fn all_statuses(&self) -> Result<Vec<VehicleStatus>, FleetTrackerError>;
}

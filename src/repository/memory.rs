//! In-memory repository.
//!
//! Reference implementation of the repository contract, used as the backend
//! for router tests. Keeps reports in insertion order, like the append-only
//! table it stands in for.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::FleetTrackerError;
use crate::models::{PositionReport, VehicleId, VehicleStatus};

use super::{ReportRepository, StatusRepository};

#[derive(Debug, Default)]
pub struct InMemoryFleet {
    reports: Vec<PositionReport>,
    statuses: Vec<VehicleStatus>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_report(&mut self, report: PositionReport) {
        self.reports.push(report);
    }

    pub fn push_status(&mut self, status: VehicleStatus) {
        self.statuses.push(status);
    }
}

/// Single pass over `reports`, tracking the running best `(recorded_at, id)`
/// per vehicle. O(n) regardless of how many reports a vehicle has.
fn latest_by_vehicle<'a, I>(reports: I) -> Vec<PositionReport>
where
    I: IntoIterator<Item = &'a PositionReport>,
{
    let mut best: HashMap<VehicleId, &PositionReport> = HashMap::new();
    for report in reports {
        best.entry(report.vehicle_id)
            .and_modify(|current| {
                if report.observation_key() > current.observation_key() {
                    *current = report;
                }
            })
            .or_insert(report);
    }

    let mut result: Vec<PositionReport> = best.into_values().cloned().collect();
    result.sort_by_key(|r| r.vehicle_id);
    result
}

#[async_trait]
impl ReportRepository for InMemoryFleet {
    async fn latest_per_vehicle(
        &self,
        filter: Option<&[VehicleId]>,
    ) -> Result<Vec<PositionReport>, FleetTrackerError> {
        let result = match filter {
            Some(ids) => latest_by_vehicle(
                self.reports
                    .iter()
                    .filter(|r| ids.contains(&r.vehicle_id)),
            ),
            None => latest_by_vehicle(&self.reports),
        };
        Ok(result)
    }

    async fn recent_for_vehicle(
        &self,
        id: VehicleId,
        limit: u32,
    ) -> Result<Vec<PositionReport>, FleetTrackerError> {
        let mut matching: Vec<PositionReport> = self
            .reports
            .iter()
            .filter(|r| r.vehicle_id == id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| std::cmp::Reverse(r.observation_key()));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}

#[async_trait]
impl StatusRepository for InMemoryFleet {
    async fn all_statuses(&self) -> Result<Vec<VehicleStatus>, FleetTrackerError> {
        let mut statuses = self.statuses.clone();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(statuses)
    }
}

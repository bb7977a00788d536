// src/database.rs
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::{
    config::DatabaseConfig,
    errors::FleetTrackerError,
    models::{PositionReport, VehicleId, VehicleStatus},
    repository::{ReportRepository, StatusRepository},
};

pub(crate) mod models;

use self::models::{PositionRow, StatusRow};

const LATEST_ALL_SQL: &str = "\
    SELECT DISTINCT ON (vehicle_id) id, vehicle_id, name, lat, lon, recorded_at
    FROM positions
    ORDER BY vehicle_id, recorded_at DESC NULLS LAST, id DESC";

const LATEST_FILTERED_SQL: &str = "\
    SELECT DISTINCT ON (vehicle_id) id, vehicle_id, name, lat, lon, recorded_at
    FROM positions
    WHERE vehicle_id = ANY($1)
    ORDER BY vehicle_id, recorded_at DESC NULLS LAST, id DESC";

const RECENT_SQL: &str = "\
    SELECT id, vehicle_id, name, lat, lon, recorded_at
    FROM positions
    WHERE vehicle_id = $1
    ORDER BY recorded_at DESC NULLS LAST, id DESC
    LIMIT $2";

const STATUSES_SQL: &str = "\
    SELECT id, external_id, name, lat, lon, in_service, available, failure, driver
    FROM vehicle_status
    ORDER BY name";

/// Postgres-backed read access to the fleet data
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Wrap an existing pool and bring the schema up to date.
    pub async fn new(pool: PgPool) -> Result<Self, FleetTrackerError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| FleetTrackerError::MigrationError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Connect according to the configuration and run migrations.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, FleetTrackerError> {
        config.validate()?;

        info!(
            max_connections = config.max_connections,
            acquire_timeout = ?config.acquire_timeout,
            "Connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| FleetTrackerError::DatabaseConnectionError(e.to_string()))?;

        Self::new(pool).await
    }

    /// Drop rows that fail domain conversion instead of failing the whole
    /// read; one bad row must not black out the fleet view.
    fn collect_reports(rows: Vec<PositionRow>) -> Vec<PositionReport> {
        rows.into_iter()
            .filter_map(|row| match PositionReport::try_from(row) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!("Skipping position row: {e}");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl ReportRepository for Database {
    async fn latest_per_vehicle(
        &self,
        filter: Option<&[VehicleId]>,
    ) -> Result<Vec<PositionReport>, FleetTrackerError> {
        let rows: Vec<PositionRow> = match filter {
            Some(ids) => {
                let raw: Vec<i64> = ids.iter().map(|id| id.value()).collect();
                sqlx::query_as(LATEST_FILTERED_SQL)
                    .bind(&raw)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => sqlx::query_as(LATEST_ALL_SQL).fetch_all(&self.pool).await?,
        };

        Ok(Self::collect_reports(rows))
    }

    async fn recent_for_vehicle(
        &self,
        id: VehicleId,
        limit: u32,
    ) -> Result<Vec<PositionReport>, FleetTrackerError> {
        let rows: Vec<PositionRow> = sqlx::query_as(RECENT_SQL)
            .bind(id.value())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(Self::collect_reports(rows))
    }
}

#[async_trait]
impl StatusRepository for Database {
    async fn all_statuses(&self) -> Result<Vec<VehicleStatus>, FleetTrackerError> {
        let rows: Vec<StatusRow> = sqlx::query_as(STATUSES_SQL).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(VehicleStatus::from).collect())
    }
}

//! Errors for the fleet tracker
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetTrackerError {
    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("Invalid vehicle id")]
    InvalidVehicleId(String),

    #[error("Malformed position row: {reason}")]
    MalformedRow { reason: String },

    #[error("Database connection error: {0}")]
    DatabaseConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

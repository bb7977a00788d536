//! Fleet tracker read service
//!
//! Serves the latest known position, bounded position trails, and a
//! classified operational status for a fleet of vehicles over a small JSON
//! API. The data is written by external systems; this crate only reads.

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod repository;

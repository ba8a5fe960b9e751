//! Configuration and telemetry.

pub mod config;
pub mod telemetry;

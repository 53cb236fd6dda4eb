pub mod config;
pub mod custody;
pub mod error;
pub mod telemetry;

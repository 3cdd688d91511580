//! Multi-agent training environment for industrial energy flexibility.

pub mod config;
pub mod devices;
/// Shared error taxonomy for configuration and episode control.
pub mod error;
pub mod io;
/// Coordinator, time profiles, and telemetry records.
pub mod sim;

/// Per-tick coordination and the episode lifecycle.
pub mod coordinator;
/// Piecewise-constant price and load-limit profiles.
pub mod profile;
pub mod report;
pub mod types;

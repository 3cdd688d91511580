/// CSV export of per-tick telemetry records.
pub mod export;

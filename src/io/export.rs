//! CSV export for per-tick telemetry records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::TickRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "timestep,energy_price,load_limit_kw,system_power_kw,\
                      energy_cost,total_reward,global_reward,production,\
                      budget_violated,done";

/// Exports tick records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per tick. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `records` - Complete episode tick records
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[TickRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes tick records as CSV to any writer.
///
/// # Arguments
///
/// * `records` - Complete episode tick records
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[TickRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.timestep.to_string(),
            format!("{:.4}", r.energy_price),
            format!("{:.4}", r.load_limit),
            format!("{:.4}", r.system_power),
            format!("{:.4}", r.energy_cost),
            format!("{:.4}", r.total_reward),
            format!("{:.4}", r.global_reward),
            r.production.to_string(),
            r.budget_violated.to_string(),
            r.done.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

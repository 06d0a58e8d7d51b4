use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::db::{self, ExportFilter, GenerationRecord, SortDir};

/// Settings for the CSV report.
pub struct ExportOptions {
    pub filter: ExportFilter,
    pub sort: SortDir,
}

/// Query the store and write the `Date,Time,Load` report in one operation.
pub fn write_report(conn: &Connection, opts: &ExportOptions, output: &Path) -> Result<()> {
    let total = db::count_records(conn)?;
    info!(total, "records in store");

    let records = db::query_range(conn, &opts.filter, opts.sort)?;
    let report = render_csv(&records);
    fs::write(output, report)
        .with_context(|| format!("writing report to {}", output.display()))?;
    info!(path = %output.display(), "report written");
    Ok(())
}

/// Render records as CSV, keeping only on-the-hour readings.
///
/// Half-hour readings (any time containing ":30") are skipped. Times are
/// truncated to HH:MM, with the server's "24:00" rewritten to "00:00".
fn render_csv(records: &[GenerationRecord]) -> String {
    let mut out = String::from("Date,Time,Load\n");
    for r in records {
        if r.time.contains(":30") {
            continue;
        }
        let time = r.time.get(..5).unwrap_or(&r.time).replace("24:00", "00:00");
        out.push_str(&format!(
            "{:04}/{:02}/{:02},{},{}\n",
            r.year, r.month, r.day, time, r.load
        ));
    }
    out
}

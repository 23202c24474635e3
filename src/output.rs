//! Persistence for the analytic table and JSON reports.
//!
//! Every writer replaces the target file; nothing is appended.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::merge::types::PanelTable;

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes `table` as CSV to `path`, overwriting any previous file.
pub fn write_table(path: &Path, table: &PanelTable) -> Result<()> {
    create_parent(path)?;
    debug!(path = %path.display(), rows = table.rows.len(), "Writing CSV table");

    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(table.headers())?;
    for record in table.records() {
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `value` as pretty JSON to `path`, overwriting any previous file.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    create_parent(path)?;
    debug!(path = %path.display(), "Writing JSON");

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}

//! Loading the yearly store and the daily batch from CSV exports.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::models::{Record, Table};

/// Read a headered CSV file. Empty cells become missing values, matching how the
/// sheet exports leave blank cells. Row length is not enforced here; the run checks
/// table shape before matching.
pub fn load_csv_table(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let table = read_csv_table(BufReader::with_capacity(512 * 1024, file))
        .with_context(|| format!("reading {}", path.display()))?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

pub fn read_csv_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns: Vec<String> = rdr
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("reading row {}", i + 1))?;
        rows.push(Record::new(
            rec.iter()
                .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                .collect(),
        ));
    }
    Ok(Table::new(columns, rows))
}

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{Writer, WriterBuilder};

use crate::error::ExportError;
use crate::matching::{AuditEntry, FieldIndicator, PartitionResult};
use crate::models::{FieldRole, Table};
use crate::orchestrator::RunSummary;

const AUDIT_HEADERS: [&str; 16] = [
    "Daily_Rec",
    "Status",
    "Match_Type",
    "Score",
    "Daily_Name",
    "Yearly_Name",
    "Daily_Mobile",
    "Yearly_Mobile",
    "Daily_Address",
    "Yearly_Address",
    "Daily_Extra",
    "Yearly_Extra",
    "Name_Match",
    "Mobile_Match",
    "Address_Match",
    "Extra_Match",
];

fn writer(path: &Path) -> Result<Writer<BufWriter<File>>, ExportError> {
    let file = File::create(path)?;
    Ok(WriterBuilder::new().from_writer(BufWriter::with_capacity(512 * 1024, file)))
}

/// `✅`/`❌` for flags, truncated whole percent for fuzzy scores.
pub fn format_indicator(ind: FieldIndicator) -> String {
    match ind {
        FieldIndicator::Flag(true) => "✅".to_string(),
        FieldIndicator::Flag(false) => "❌".to_string(),
        FieldIndicator::Percent(p) => format!("{}%", p.trunc() as i64),
    }
}

/// One decimal, truncated, so a score never prints at or above a threshold it missed.
pub fn format_score(score: f64) -> String {
    format!("{:.1}", (score * 10.0).trunc() / 10.0)
}

fn audit_record(e: &AuditEntry) -> Vec<String> {
    let mut rec = Vec::with_capacity(AUDIT_HEADERS.len());
    rec.push((e.daily_index + 1).to_string());
    rec.push(e.status.to_string());
    rec.push(e.match_type().to_string());
    rec.push(e.score().map(format_score).unwrap_or_default());
    for role in FieldRole::ALL {
        let i = role as usize;
        rec.push(e.daily_values[i].clone().unwrap_or_default());
        rec.push(
            e.yearly_values
                .as_ref()
                .and_then(|v| v[i].clone())
                .unwrap_or_default(),
        );
    }
    for role in FieldRole::ALL {
        rec.push(
            e.best
                .as_ref()
                .map(|b| format_indicator(b.indicator(role)))
                .unwrap_or_default(),
        );
    }
    rec
}

pub fn write_audit_csv<W: Write>(w: W, result: &PartitionResult) -> Result<(), ExportError> {
    let mut w = WriterBuilder::new().from_writer(w);
    w.write_record(AUDIT_HEADERS)?;
    for e in &result.audit {
        w.write_record(audit_record(e))?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_audit_csv(path: &Path, result: &PartitionResult) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_audit_csv(BufWriter::with_capacity(512 * 1024, file), result)
}

/// Write a table with its original header and values; missing cells are left blank.
pub fn export_table_csv(path: &Path, table: &Table) -> Result<(), ExportError> {
    let mut w = writer(path)?;
    w.write_record(&table.columns)?;
    for r in &table.rows {
        w.write_record(r.values.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_summary_csv(path: &Path, summary: &RunSummary) -> Result<(), ExportError> {
    let mut w = writer(path)?;
    w.write_record(["Key", "Value"])?;
    for (k, v) in summary.entries() {
        w.write_record([k, v.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

/// Output locations for one run, named by run date (`dd_mm_yyyy`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub duplicates: PathBuf,
    pub new_records: PathBuf,
    pub audit: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn for_date(dir: &Path, date: NaiveDate) -> Self {
        let stamp = date.format("%d_%m_%Y");
        Self {
            duplicates: dir.join(format!("{}_possibleDuplicate.csv", stamp)),
            new_records: dir.join(format!("{}_DailyLinelist.csv", stamp)),
            audit: dir.join(format!("{}_audit.csv", stamp)),
            summary: dir.join(format!("{}_summary.csv", stamp)),
        }
    }
}

/// Write both daily subsets, the audit list, and the run summary.
pub fn export_run(
    paths: &OutputPaths,
    daily: &Table,
    result: &PartitionResult,
    summary: &RunSummary,
) -> Result<(), ExportError> {
    export_table_csv(&paths.duplicates, &result.duplicates_table(daily))?;
    export_table_csv(&paths.new_records, &result.new_records_table(daily))?;
    export_audit_csv(&paths.audit, result)?;
    export_summary_csv(&paths.summary, summary)?;
    Ok(())
}

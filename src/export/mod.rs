pub mod csv_export;

pub use csv_export::{
    OutputPaths, export_audit_csv, export_run, export_summary_csv, export_table_csv,
    format_indicator, format_score, write_audit_csv,
};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Structural problems with the two input tables. Detected before any matching starts.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{table} table: column '{column}' (role {role}) not found")]
    MissingColumn {
        table: &'static str,
        role: &'static str,
        column: String,
    },
    #[error("no column selected for role {role}")]
    EmptyColumnName { role: &'static str },
    #[error("{table} table: row {row} has {found} values, header has {expected}")]
    RaggedRow {
        table: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("input error: {0}")]
    Input(#[from] InputError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e.to_string())
    }
}

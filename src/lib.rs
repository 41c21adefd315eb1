pub mod cli;
pub mod config;
pub mod export;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod source;
pub mod util;

pub mod error;

pub use config::{ClassificationPolicy, MatchConfig};
pub use error::DedupError;
pub use matching::PartitionResult;
pub use models::{ColumnRoles, Record, Table};
pub use orchestrator::{ProgressUpdate, RunReport, run, run_with_progress};

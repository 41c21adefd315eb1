//! Run summary: counts, index shape, timings.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::ClassificationPolicy;
use crate::matching::{BlockingIndex, MatchType, PartitionResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub policy: ClassificationPolicy,
    pub yearly_rows: usize,
    pub daily_rows: usize,

    // Index shape
    pub block_count: usize,
    pub largest_block: usize,
    pub unusable_mobiles: usize,

    // Outcome
    pub duplicates: usize,
    pub new_records: usize,
    pub perfect_matches: usize,
    pub fuzzy_matches: usize,
    pub no_matches: usize,

    // Timing
    pub index_time: Duration,
    pub match_time: Duration,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,

    // Memory
    pub mem_used_start_mb: u64,
    pub mem_used_end_mb: u64,
}

impl RunSummary {
    pub fn new(policy: ClassificationPolicy, yearly_rows: usize, daily_rows: usize) -> Self {
        let now = Utc::now();
        Self {
            policy,
            yearly_rows,
            daily_rows,
            block_count: 0,
            largest_block: 0,
            unusable_mobiles: 0,
            duplicates: 0,
            new_records: 0,
            perfect_matches: 0,
            fuzzy_matches: 0,
            no_matches: 0,
            index_time: Duration::ZERO,
            match_time: Duration::ZERO,
            started_utc: now,
            ended_utc: now,
            mem_used_start_mb: 0,
            mem_used_end_mb: 0,
        }
    }

    pub fn with_index(mut self, index: &BlockingIndex, elapsed: Duration) -> Self {
        self.block_count = index.bucket_count();
        self.largest_block = index.largest_bucket();
        self.unusable_mobiles = index.unusable_count();
        self.index_time = elapsed;
        self
    }

    pub fn with_result(mut self, result: &PartitionResult, elapsed: Duration) -> Self {
        self.duplicates = result.duplicates.len();
        self.new_records = result.new_records.len();
        self.perfect_matches = result.count_by_type(MatchType::Perfect);
        self.fuzzy_matches = result.count_by_type(MatchType::Fuzzy);
        self.no_matches = result.count_by_type(MatchType::None);
        self.match_time = elapsed;
        self
    }

    pub fn with_timestamps(mut self, started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        self.started_utc = started;
        self.ended_utc = ended;
        self
    }

    pub fn with_memory(mut self, start_mb: u64, end_mb: u64) -> Self {
        self.mem_used_start_mb = start_mb;
        self.mem_used_end_mb = end_mb;
        self
    }

    pub fn duration_secs(&self) -> f64 {
        (self.ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0
    }

    /// Key/value lines for logs and the summary export.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let fmt_time = |dt: &DateTime<Utc>| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        vec![
            ("Policy", self.policy.to_string()),
            ("Yearly records", self.yearly_rows.to_string()),
            ("Daily records", self.daily_rows.to_string()),
            ("Blocks", self.block_count.to_string()),
            ("Largest block", self.largest_block.to_string()),
            ("Yearly unusable mobiles", self.unusable_mobiles.to_string()),
            ("Duplicates", self.duplicates.to_string()),
            ("New records", self.new_records.to_string()),
            ("Perfect matches", self.perfect_matches.to_string()),
            ("Fuzzy matches", self.fuzzy_matches.to_string()),
            ("No match", self.no_matches.to_string()),
            ("Index time (ms)", self.index_time.as_millis().to_string()),
            ("Match time (ms)", self.match_time.as_millis().to_string()),
            ("Started", fmt_time(&self.started_utc)),
            ("Ended", fmt_time(&self.ended_utc)),
            ("Duration (s)", format!("{:.3}", self.duration_secs())),
            ("Memory used start (MB)", self.mem_used_start_mb.to_string()),
            ("Memory used end (MB)", self.mem_used_end_mb.to_string()),
        ]
    }

    pub fn log(&self) {
        for (k, v) in self.entries() {
            log::info!("{}: {}", k, v);
        }
    }
}

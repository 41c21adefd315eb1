//! One deduplication run over a yearly store and a daily batch.
//!
//! Input shape and configuration are checked up front; after that the sweep always
//! completes. The yearly table is normalized and indexed once, then each daily record
//! is matched independently. Records are processed in chunks of
//! `MatchConfig::progress_every`; within a chunk they are scored in parallel when
//! `MatchConfig::parallel` is set. Results are always assembled in daily-table order.

pub mod summary;

use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info};
use rayon::prelude::*;

use crate::config::MatchConfig;
use crate::error::DedupError;
use crate::matching::{
    AuditEntry, BlockingIndex, NormalizedRecord, PartitionResult, Scoring, block_key, build_index,
    classify, find_best_match,
};
use crate::metrics::memory_snapshot;
use crate::models::{ColumnRoles, FieldRole, Record, ResolvedColumns, Table};
use crate::normalize::Normalizer;

pub use summary::RunSummary;

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: f32,
    pub elapsed: Duration,
    pub mem_used_mb: u64,
    pub mem_avail_mb: u64,
    pub stage: &'static str,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: PartitionResult,
    pub summary: RunSummary,
}

/// Everything a single daily record needs; shared read-only across workers.
struct Sweep<'a> {
    yearly: &'a Table,
    yearly_cols: ResolvedColumns,
    yearly_norm: Vec<NormalizedRecord>,
    index: BlockingIndex,
    daily_cols: ResolvedColumns,
    normalizer: Normalizer,
    scoring: Scoring,
    cfg: &'a MatchConfig,
}

impl Sweep<'_> {
    fn process(&self, daily_index: usize, record: &Record) -> AuditEntry {
        let query = NormalizedRecord::from_record(record, &self.daily_cols, &self.normalizer);
        let key = block_key(query.mobile(), self.cfg.block_key_len);
        let candidates = self.index.get(&key);
        let best = find_best_match(&query, candidates, &self.yearly_norm, &self.scoring);
        let classification = classify(&self.cfg.policy, best.as_ref());
        log::trace!(
            "daily #{} key={} candidates={} best={:?} -> {:?}",
            daily_index,
            key,
            candidates.len(),
            best.as_ref().map(|b| (b.yearly_index, b.score)),
            classification
        );

        let yearly_values = best.as_ref().and_then(|b| {
            self.yearly
                .rows
                .get(b.yearly_index)
                .map(|y| role_values(y, &self.yearly_cols))
        });
        AuditEntry {
            daily_index,
            classification,
            status: classification.label(&self.cfg.policy),
            best,
            daily_values: role_values(record, &self.daily_cols),
            yearly_values,
        }
    }
}

fn role_values(record: &Record, cols: &ResolvedColumns) -> [Option<String>; 4] {
    FieldRole::ALL.map(|role| cols.value(record, role).map(str::to_string))
}

/// Run and return the partition only.
pub fn run(
    yearly: &Table,
    daily: &Table,
    roles: &ColumnRoles,
    cfg: &MatchConfig,
) -> Result<PartitionResult, DedupError> {
    run_with_progress(yearly, daily, roles, cfg, |_| {}).map(|r| r.result)
}

pub fn run_with_progress<F>(
    yearly: &Table,
    daily: &Table,
    roles: &ColumnRoles,
    cfg: &MatchConfig,
    on_progress: F,
) -> Result<RunReport, DedupError>
where
    F: Fn(ProgressUpdate),
{
    cfg.validate()?;
    yearly.check_shape("yearly")?;
    daily.check_shape("daily")?;
    let yearly_cols = roles.resolve(yearly, "yearly")?;
    let daily_cols = roles.resolve(daily, "daily")?;
    debug!("match config: {:?}", cfg);

    let started = Utc::now();
    let mem_start = memory_snapshot();
    let normalizer = Normalizer::from_config(cfg);

    let t_index = Instant::now();
    let yearly_norm: Vec<NormalizedRecord> = if cfg.parallel {
        yearly
            .rows
            .par_iter()
            .map(|r| NormalizedRecord::from_record(r, &yearly_cols, &normalizer))
            .collect()
    } else {
        yearly
            .rows
            .iter()
            .map(|r| NormalizedRecord::from_record(r, &yearly_cols, &normalizer))
            .collect()
    };
    let index = build_index(yearly, &roles.mobile, &normalizer, cfg.block_key_len)?;
    let index_time = t_index.elapsed();
    info!(
        "Indexed {} yearly records into {} blocks (largest {}, unusable mobile {}) in {:?}",
        index.len(),
        index.bucket_count(),
        index.largest_bucket(),
        index.unusable_count(),
        index_time
    );

    let sweep = Sweep {
        yearly,
        yearly_cols,
        yearly_norm,
        index,
        daily_cols,
        normalizer,
        scoring: Scoring::from_config(cfg),
        cfg,
    };

    let t_match = Instant::now();
    let total = daily.len();
    let mut audit: Vec<AuditEntry> = Vec::with_capacity(total);
    for (chunk_no, chunk) in daily.rows.chunks(cfg.progress_every).enumerate() {
        let base = chunk_no * cfg.progress_every;
        if cfg.parallel {
            let part: Vec<AuditEntry> = chunk
                .par_iter()
                .enumerate()
                .map(|(k, r)| sweep.process(base + k, r))
                .collect();
            audit.extend(part);
        } else {
            audit.extend(
                chunk
                    .iter()
                    .enumerate()
                    .map(|(k, r)| sweep.process(base + k, r)),
            );
        }
        let mem = memory_snapshot();
        on_progress(ProgressUpdate {
            processed: audit.len(),
            total,
            percent: (audit.len() as f32 / total.max(1) as f32) * 100.0,
            elapsed: t_match.elapsed(),
            mem_used_mb: mem.used_mb,
            mem_avail_mb: mem.avail_mb,
            stage: "match",
        });
    }
    let match_time = t_match.elapsed();

    let result = PartitionResult::from_audit(cfg.policy, audit);
    info!(
        "Matched {} daily records in {:?}: {} duplicates, {} to upload",
        total,
        match_time,
        result.duplicates.len(),
        result.new_records.len()
    );

    let summary = RunSummary::new(cfg.policy, yearly.len(), total)
        .with_index(&sweep.index, index_time)
        .with_result(&result, match_time)
        .with_timestamps(started, Utc::now())
        .with_memory(mem_start.used_mb, memory_snapshot().used_mb);

    Ok(RunReport { result, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassificationPolicy;
    use crate::error::InputError;
    use crate::matching::{Classification, FieldIndicator, MatchType};
    use std::sync::Mutex;

    fn table(rows: &[[&str; 4]]) -> Table {
        let cell = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
        Table::new(
            vec!["Name".into(), "Mobile".into(), "Address".into(), "Ward".into()],
            rows.iter()
                .map(|r| Record::new(r.iter().map(|&s| cell(s)).collect()))
                .collect(),
        )
    }

    fn roles() -> ColumnRoles {
        ColumnRoles::new("Name", "Mobile", "Address", "Ward")
    }

    fn yearly() -> Table {
        table(&[
            ["Jane Doe", "98765-43210", "12 Main St", "W1"],
            ["John Smith", "91234 56789", "4 Hill Rd", "W2"],
            ["Asha Rao", "", "7 Lake View", "W3"],
            ["Ravi Kumar", "99999 11111", "1 Park Ave", "W4"],
        ])
    }

    fn daily() -> Table {
        table(&[
            ["jane doe", "9876543210", "12, Main St.", "w1"],
            ["Jon Smith", "91234-56789", "4 Hill Road", "W2"],
            ["New Person", "90000 00000", "3 New St", "W9"],
            ["Asha Rao", "123", "7 Lake View", "W3"],
            ["Ravi Kumar", "99999 11111", "1 Park Ave", "W4"],
        ])
    }

    #[test]
    fn exact_only_run() {
        let cfg = MatchConfig::default();
        let r = run(&yearly(), &daily(), &roles(), &cfg).unwrap();
        assert_eq!(r.audit.len(), 5);
        assert_eq!(r.duplicates, vec![0, 4]);
        assert_eq!(r.new_records, vec![1, 2, 3]);

        let jane = &r.audit[0];
        assert_eq!(jane.match_type(), MatchType::Perfect);
        assert_eq!(jane.status, "PERFECT DUPLICATE");
        assert_eq!(jane.score(), Some(100.0));
        assert_eq!(jane.yearly_values.as_ref().unwrap()[0].as_deref(), Some("Jane Doe"));

        let jon = &r.audit[1];
        assert_eq!(jon.match_type(), MatchType::Fuzzy);
        assert_eq!(jon.status, "NEW/PARTIAL");
        let best = jon.best.as_ref().unwrap();
        assert_eq!(best.yearly_index, 1);
        assert_eq!(best.indicator(FieldRole::Mobile), FieldIndicator::Flag(true));

        let new_person = &r.audit[2];
        assert_eq!(new_person.match_type(), MatchType::None);
        assert!(new_person.best.is_none());
        assert!(new_person.yearly_values.is_none());
    }

    #[test]
    fn unusable_mobile_is_not_an_error() {
        let cfg = MatchConfig::default();
        let r = run(&yearly(), &daily(), &roles(), &cfg).unwrap();
        // "123" lands in the sentinel bucket with the yearly row that has no mobile;
        // mobile does not match (absent vs unusable) so it is at best fuzzy.
        let asha = &r.audit[3];
        assert_eq!(asha.classification, Classification::New);
        let best = asha.best.as_ref().unwrap();
        assert_eq!(best.yearly_index, 2);
        assert!(!best.mobile_match());
        assert_eq!(best.score, 75.0);
    }

    #[test]
    fn threshold_run() {
        let cfg = MatchConfig {
            policy: ClassificationPolicy::threshold(75.0),
            ..Default::default()
        };
        let r = run(&yearly(), &daily(), &roles(), &cfg).unwrap();
        // Asha scores exactly 75 -> inclusive boundary.
        assert!(r.duplicates.contains(&3));
        assert!(r.duplicates.contains(&0));
        assert!(r.new_records.contains(&2));
        assert_eq!(r.audit[3].status, "DUPLICATE");
        assert_eq!(r.audit[2].status, "NEW");
    }

    #[test]
    fn partition_covers_every_row_once() {
        for policy in [ClassificationPolicy::ExactOnly, ClassificationPolicy::threshold(50.0)] {
            let cfg = MatchConfig {
                policy,
                ..Default::default()
            };
            let d = daily();
            let r = run(&yearly(), &d, &roles(), &cfg).unwrap();
            let mut all: Vec<usize> = r.duplicates.iter().chain(&r.new_records).copied().collect();
            all.sort_unstable();
            assert_eq!(all, (0..d.len()).collect::<Vec<_>>());
            assert!(r.duplicates.iter().all(|i| !r.new_records.contains(i)));
            let order: Vec<usize> = r.audit.iter().map(|e| e.daily_index).collect();
            assert_eq!(order, (0..d.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn deterministic_and_parallel_matches_sequential() {
        let big_daily = {
            let mut rows = Vec::new();
            for i in 0..50 {
                rows.push(daily().rows[i % 5].clone());
            }
            Table::new(daily().columns, rows)
        };
        let par = MatchConfig {
            progress_every: 7,
            ..Default::default()
        };
        let seq = MatchConfig {
            parallel: false,
            ..par.clone()
        };
        let a = run(&yearly(), &big_daily, &roles(), &par).unwrap();
        let b = run(&yearly(), &big_daily, &roles(), &par).unwrap();
        let c = run(&yearly(), &big_daily, &roles(), &seq).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.duplicates.len(), 20);
    }

    #[test]
    fn index_is_built_from_the_yearly_mobile_column() {
        let y = yearly();
        let idx = build_index(&y, "Mobile", &Normalizer::default(), 7).unwrap();
        let report =
            run_with_progress(&y, &daily(), &roles(), &MatchConfig::default(), |_| {}).unwrap();
        assert_eq!(report.summary.block_count, idx.bucket_count());
        assert_eq!(report.summary.largest_block, idx.largest_bucket());
        assert_eq!(report.summary.unusable_mobiles, idx.unusable_count());

        let cfg = MatchConfig {
            block_key_len: 10,
            ..Default::default()
        };
        // "91234 56789" vs "91234-56789" still share a full-length key.
        let r = run(&y, &daily(), &roles(), &cfg).unwrap();
        assert_eq!(r.audit[1].best.as_ref().unwrap().yearly_index, 1);
    }

    #[test]
    fn tie_prefers_earlier_yearly_row() {
        let y = table(&[
            ["Jane Dox", "9876543210", "", ""],
            ["Jane Doy", "9876543210", "", ""],
        ]);
        let d = table(&[["Jane Doe", "9876543210", "", ""]]);
        let r = run(&y, &d, &roles(), &MatchConfig::default()).unwrap();
        assert_eq!(r.audit[0].best.as_ref().unwrap().yearly_index, 0);
    }

    #[test]
    fn missing_column_fails_before_matching() {
        let bad_roles = ColumnRoles::new("Name", "Phone", "Address", "Ward");
        let err = run(&yearly(), &daily(), &bad_roles, &MatchConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            DedupError::Input(InputError::MissingColumn { table: "yearly", .. })
        ));

        let mut d = daily();
        d.columns[3] = "Extra".into();
        let err = run(&yearly(), &d, &roles(), &MatchConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            DedupError::Input(InputError::MissingColumn { table: "daily", role: "extra", .. })
        ));
    }

    #[test]
    fn bad_config_is_fatal() {
        let cfg = MatchConfig {
            block_key_len: 0,
            ..Default::default()
        };
        assert!(matches!(
            run(&yearly(), &daily(), &roles(), &cfg),
            Err(DedupError::Config(_))
        ));
    }

    #[test]
    fn empty_tables() {
        let empty = Table::new(yearly().columns, vec![]);
        let r = run(&empty, &daily(), &roles(), &MatchConfig::default()).unwrap();
        assert!(r.duplicates.is_empty());
        assert_eq!(r.new_records.len(), 5);

        let r = run(&yearly(), &empty, &roles(), &MatchConfig::default()).unwrap();
        assert!(r.audit.is_empty());
    }

    #[test]
    fn progress_and_summary() {
        let updates: Mutex<Vec<ProgressUpdate>> = Mutex::new(vec![]);
        let cfg = MatchConfig {
            progress_every: 2,
            ..Default::default()
        };
        let report = run_with_progress(&yearly(), &daily(), &roles(), &cfg, |u| {
            updates.lock().unwrap().push(u);
        })
        .unwrap();
        let v = updates.lock().unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.last().unwrap().processed, 5);
        assert_eq!(v.last().unwrap().percent, 100.0);

        let s = &report.summary;
        assert_eq!(s.yearly_rows, 4);
        assert_eq!(s.daily_rows, 5);
        assert_eq!(s.duplicates, 2);
        assert_eq!(s.new_records, 3);
        assert_eq!(s.perfect_matches, 2);
        assert_eq!(s.no_matches, 1);
        assert_eq!(s.perfect_matches + s.fuzzy_matches + s.no_matches, 5);
        assert_eq!(s.unusable_mobiles, 1);
    }
}

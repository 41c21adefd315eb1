//! Duplicate/new decision and the split of the daily table.

use crate::config::ClassificationPolicy;
use crate::matching::scorer::{MatchCandidateResult, MatchType};
use crate::models::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Duplicate,
    New,
}

impl Classification {
    /// Status label used in the audit report; wording follows the policy.
    pub fn label(&self, policy: &ClassificationPolicy) -> &'static str {
        match (policy, self) {
            (ClassificationPolicy::ExactOnly, Classification::Duplicate) => "PERFECT DUPLICATE",
            (ClassificationPolicy::ExactOnly, Classification::New) => "NEW/PARTIAL",
            (ClassificationPolicy::Threshold { .. }, Classification::Duplicate) => "DUPLICATE",
            (ClassificationPolicy::Threshold { .. }, Classification::New) => "NEW",
        }
    }
}

pub fn classify(policy: &ClassificationPolicy, best: Option<&MatchCandidateResult>) -> Classification {
    let Some(best) = best else {
        return Classification::New;
    };
    let duplicate = match policy {
        ClassificationPolicy::ExactOnly => best.match_type == MatchType::Perfect,
        ClassificationPolicy::Threshold { threshold } => best.score >= *threshold,
    };
    if duplicate {
        Classification::Duplicate
    } else {
        Classification::New
    }
}

/// One line of the audit list: a daily record, its best yearly match (if any), and
/// the decision taken.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// Position in the daily table.
    pub daily_index: usize,
    pub classification: Classification,
    pub status: &'static str,
    pub best: Option<MatchCandidateResult>,
    /// Raw name/mobile/address/extra values of the daily record.
    pub daily_values: [Option<String>; 4],
    /// Raw values of the winning yearly record.
    pub yearly_values: Option<[Option<String>; 4]>,
}

impl AuditEntry {
    pub fn match_type(&self) -> MatchType {
        self.best
            .as_ref()
            .map(|b| b.match_type)
            .unwrap_or(MatchType::None)
    }

    pub fn score(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.score)
    }

    pub fn is_duplicate(&self) -> bool {
        self.classification == Classification::Duplicate
    }
}

/// Final output of a run. `duplicates` and `new_records` are disjoint, ascending, and
/// together cover every daily position.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResult {
    pub policy: ClassificationPolicy,
    pub audit: Vec<AuditEntry>,
    pub duplicates: Vec<usize>,
    pub new_records: Vec<usize>,
}

impl PartitionResult {
    /// `audit` must be in daily-table order.
    pub fn from_audit(policy: ClassificationPolicy, audit: Vec<AuditEntry>) -> Self {
        let (dups, new): (Vec<&AuditEntry>, Vec<&AuditEntry>) =
            audit.iter().partition(|e| e.is_duplicate());
        let duplicates = dups.into_iter().map(|e| e.daily_index).collect();
        let new_records = new.into_iter().map(|e| e.daily_index).collect();
        Self {
            policy,
            audit,
            duplicates,
            new_records,
        }
    }

    pub fn duplicates_table(&self, daily: &Table) -> Table {
        daily.select(&self.duplicates)
    }

    pub fn new_records_table(&self, daily: &Table) -> Table {
        daily.select(&self.new_records)
    }

    pub fn count_by_type(&self, ty: MatchType) -> usize {
        self.audit.iter().filter(|e| e.match_type() == ty).count()
    }
}

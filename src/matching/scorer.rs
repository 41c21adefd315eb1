//! Composite scoring of a query record against its block's candidates.

use std::cmp::Ordering;

use crate::config::{CompareMode, FieldWeights, MatchConfig, SimilarityAlgorithm};
use crate::matching::compare::{FieldComparison, NormalizedRecord, compare};
use crate::models::FieldRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    /// Every field equal after normalization.
    Perfect,
    /// Some overlap above the candidacy floor.
    Fuzzy,
    /// No candidate above the floor, or no candidates at all.
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Perfect => "PERFECT",
            MatchType::Fuzzy => "FUZZY",
            MatchType::None => "NONE",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field indicator shown in the audit report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldIndicator {
    Flag(bool),
    Percent(f64),
}

/// Scoring parameters lifted out of [`MatchConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Scoring {
    pub weights: FieldWeights,
    pub similarity: SimilarityAlgorithm,
    pub extra_mode: CompareMode,
    pub candidate_floor: f64,
}

impl Default for Scoring {
    fn default() -> Self {
        Self::from_config(&MatchConfig::default())
    }
}

impl Scoring {
    pub fn from_config(cfg: &MatchConfig) -> Self {
        Self {
            weights: cfg.weights,
            similarity: cfg.similarity,
            extra_mode: cfg.extra_mode,
            candidate_floor: cfg.candidate_floor,
        }
    }

    /// Comparator per role. Mobile is the blocking key and is never fuzzy.
    pub fn mode(&self, role: FieldRole) -> CompareMode {
        match role {
            FieldRole::Name | FieldRole::Address => CompareMode::Fuzzy,
            FieldRole::Mobile => CompareMode::Exact,
            FieldRole::Extra => self.extra_mode,
        }
    }
}

/// Best yearly candidate for one daily record.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidateResult {
    /// Position of the winning record in the yearly table.
    pub yearly_index: usize,
    pub score: f64,
    pub match_type: MatchType,
    pub is_exact: bool,
    pub fields: [FieldComparison; 4],
    pub modes: [CompareMode; 4],
}

impl MatchCandidateResult {
    pub fn field(&self, role: FieldRole) -> FieldComparison {
        self.fields[role as usize]
    }

    /// Flags for exact fields, percentages for fuzzy ones. A perfect match reports
    /// every field as a flag.
    pub fn indicator(&self, role: FieldRole) -> FieldIndicator {
        let c = self.field(role);
        if self.is_exact {
            return FieldIndicator::Flag(c.equal);
        }
        match self.modes[role as usize] {
            CompareMode::Exact => FieldIndicator::Flag(c.equal),
            CompareMode::Fuzzy => FieldIndicator::Percent(c.score),
        }
    }

    pub fn mobile_match(&self) -> bool {
        self.field(FieldRole::Mobile).equal
    }
}

/// Score `query` against one candidate. Returns `None` when the pair is degenerate
/// (not perfect and at or below the candidacy floor).
pub fn score_candidate(
    query: &NormalizedRecord,
    candidate: &NormalizedRecord,
    yearly_index: usize,
    scoring: &Scoring,
) -> Option<MatchCandidateResult> {
    let modes = FieldRole::ALL.map(|role| scoring.mode(role));
    let fields = FieldRole::ALL.map(|role| {
        compare(
            query.field(role),
            candidate.field(role),
            modes[role as usize],
            scoring.similarity,
        )
    });
    let is_exact = fields.iter().all(|f| f.equal);

    let score = if is_exact {
        100.0
    } else {
        let w = scoring.weights.as_array();
        let total = scoring.weights.total();
        let sum: f64 = fields.iter().zip(w).map(|(f, w)| f.score * w).sum();
        if total > 0.0 {
            (sum / total).clamp(0.0, 100.0)
        } else {
            0.0
        }
    };

    let match_type = if is_exact {
        MatchType::Perfect
    } else if score > scoring.candidate_floor {
        MatchType::Fuzzy
    } else {
        return None;
    };

    Some(MatchCandidateResult {
        yearly_index,
        score,
        match_type,
        is_exact,
        fields,
        modes,
    })
}

/// Ranking between two scored candidates by score alone. `Equal` leaves the earlier
/// candidate in place, whatever its match type.
fn rank(a: &MatchCandidateResult, b: &MatchCandidateResult) -> Ordering {
    a.score.total_cmp(&b.score)
}

/// Score every candidate and keep the best. Ties go to the candidate appearing first
/// in `candidates`, which follows yearly-table order.
pub fn find_best_match(
    query: &NormalizedRecord,
    candidates: &[usize],
    yearly: &[NormalizedRecord],
    scoring: &Scoring,
) -> Option<MatchCandidateResult> {
    candidates
        .iter()
        .filter_map(|&j| {
            let cand = yearly.get(j)?;
            score_candidate(query, cand, j, scoring)
        })
        .fold(None, |best: Option<MatchCandidateResult>, next| match best {
            Some(b) if rank(&next, &b) != Ordering::Greater => Some(b),
            _ => Some(next),
        })
}

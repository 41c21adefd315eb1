//! Field comparator: one field of a query record against the same field of a candidate.

use crate::config::{CompareMode, SimilarityAlgorithm};
use crate::matching::helpers::{sim_jaro_winkler_pct, sim_levenshtein_pct, sim_token_sort_pct};
use crate::models::{FieldKind, FieldRole, Record, ResolvedColumns};
use crate::normalize::{Normalizer, is_absent};

/// A cell after normalization, remembering whether the source cell was genuinely absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedField {
    pub value: String,
    pub absent: bool,
}

impl NormalizedField {
    pub fn new(raw: Option<&str>, kind: FieldKind, normalizer: &Normalizer) -> Self {
        Self {
            value: normalizer.normalize(raw, kind),
            absent: is_absent(raw),
        }
    }
}

/// The four role fields of one record, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedRecord {
    pub fields: [NormalizedField; 4],
}

impl NormalizedRecord {
    pub fn from_record(record: &Record, cols: &ResolvedColumns, normalizer: &Normalizer) -> Self {
        Self {
            fields: FieldRole::ALL.map(|role| {
                NormalizedField::new(cols.value(record, role), role.kind(), normalizer)
            }),
        }
    }

    #[inline]
    pub fn field(&self, role: FieldRole) -> &NormalizedField {
        &self.fields[role as usize]
    }

    pub fn mobile(&self) -> &str {
        &self.field(FieldRole::Mobile).value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldComparison {
    /// Similarity in [0, 100].
    pub score: f64,
    /// Normalized values are equal. Two empty values are only equal when both
    /// source cells were absent.
    pub equal: bool,
}

/// Compare two normalized fields.
///
/// An empty value on exactly one side scores 0, as does a pair of empties where
/// either side had content that normalized away (e.g. a mobile of "123").
pub fn compare(
    a: &NormalizedField,
    b: &NormalizedField,
    mode: CompareMode,
    algorithm: SimilarityAlgorithm,
) -> FieldComparison {
    match (a.value.is_empty(), b.value.is_empty()) {
        (true, true) => {
            let equal = a.absent && b.absent;
            return FieldComparison {
                score: if equal { 100.0 } else { 0.0 },
                equal,
            };
        }
        (true, false) | (false, true) => {
            return FieldComparison {
                score: 0.0,
                equal: false,
            };
        }
        (false, false) => {}
    }

    let equal = a.value == b.value;
    let score = if equal {
        100.0
    } else {
        match mode {
            CompareMode::Exact => 0.0,
            CompareMode::Fuzzy => similarity(&a.value, &b.value, algorithm),
        }
    };
    FieldComparison {
        score: score.clamp(0.0, 100.0),
        equal,
    }
}

pub fn similarity(a: &str, b: &str, algorithm: SimilarityAlgorithm) -> f64 {
    match algorithm {
        SimilarityAlgorithm::Levenshtein => sim_levenshtein_pct(a, b),
        SimilarityAlgorithm::JaroWinkler => sim_jaro_winkler_pct(a, b),
        SimilarityAlgorithm::TokenSort => sim_token_sort_pct(a, b),
    }
}

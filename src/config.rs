use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_THRESHOLD: f64 = 85.0;
pub const DEFAULT_BLOCK_KEY_LEN: usize = 7;
pub const DEFAULT_MIN_MOBILE_DIGITS: usize = 7;
pub const DEFAULT_PROGRESS_EVERY: usize = 1000;

/// How the best match of a daily record decides duplicate vs new.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Duplicate iff the best match is PERFECT.
    #[default]
    ExactOnly,
    /// Duplicate iff a best match exists and its composite score is >= `threshold`.
    Threshold {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl ClassificationPolicy {
    pub fn threshold(threshold: f64) -> Self {
        Self::Threshold { threshold }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactOnly => "exact-only",
            Self::Threshold { .. } => "threshold",
        }
    }
}

impl std::fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactOnly => write!(f, "exact-only"),
            Self::Threshold { threshold } => write!(f, "threshold (>= {threshold})"),
        }
    }
}

/// Comparator used for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    Exact,
    #[default]
    Fuzzy,
}

/// String similarity behind the fuzzy comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAlgorithm {
    /// Normalized edit-distance ratio over chars.
    #[default]
    Levenshtein,
    JaroWinkler,
    /// Levenshtein ratio after sorting whitespace tokens; ignores word order.
    TokenSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeights {
    pub name: f64,
    pub mobile: f64,
    pub address: f64,
    pub extra: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 1.0,
            mobile: 1.0,
            address: 1.0,
            extra: 1.0,
        }
    }
}

impl FieldWeights {
    pub fn as_array(&self) -> [f64; 4] {
        [self.name, self.mobile, self.address, self.extra]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// All ASCII punctuation.
pub fn default_punctuation() -> String {
    (0x21u8..=0x7e)
        .map(char::from)
        .filter(|c| c.is_ascii_punctuation())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub policy: ClassificationPolicy,
    pub weights: FieldWeights,
    pub block_key_len: usize,
    pub min_mobile_digits: usize,
    pub punctuation: String,
    pub fold_diacritics: bool,
    pub similarity: SimilarityAlgorithm,
    pub extra_mode: CompareMode,
    /// A non-perfect candidate must score strictly above this to be considered at all.
    pub candidate_floor: f64,
    pub parallel: bool,
    pub progress_every: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            policy: ClassificationPolicy::default(),
            weights: FieldWeights::default(),
            block_key_len: DEFAULT_BLOCK_KEY_LEN,
            min_mobile_digits: DEFAULT_MIN_MOBILE_DIGITS,
            punctuation: default_punctuation(),
            fold_diacritics: false,
            similarity: SimilarityAlgorithm::default(),
            extra_mode: CompareMode::default(),
            candidate_floor: 0.0,
            parallel: true,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl MatchConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let cfg: MatchConfig =
            serde_json::from_str(input).map_err(|e| ConfigError::InvalidValue {
                field: "config",
                reason: e.to_string(),
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let ClassificationPolicy::Threshold { threshold } = self.policy {
            if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
                return Err(ConfigError::InvalidValue {
                    field: "threshold",
                    reason: format!("{} not in 0..=100", threshold),
                });
            }
        }

        let names = ["weights.name", "weights.mobile", "weights.address", "weights.extra"];
        for (field, w) in names.into_iter().zip(self.weights.as_array()) {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{} must be a finite number >= 0", w),
                });
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "weights",
                reason: "at least one weight must be > 0".into(),
            });
        }

        if self.block_key_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "block_key_len",
                reason: "must be > 0".into(),
            });
        }
        if self.min_mobile_digits == 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_mobile_digits",
                reason: "must be > 0".into(),
            });
        }
        if !self.candidate_floor.is_finite() || !(0.0..100.0).contains(&self.candidate_floor) {
            return Err(ConfigError::InvalidValue {
                field: "candidate_floor",
                reason: format!("{} not in 0..100", self.candidate_floor),
            });
        }
        if self.progress_every == 0 {
            return Err(ConfigError::InvalidValue {
                field: "progress_every",
                reason: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

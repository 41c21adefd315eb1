use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};

use crate::config::{
    ClassificationPolicy, CompareMode, DEFAULT_THRESHOLD, FieldWeights, MatchConfig,
    SimilarityAlgorithm,
};
use crate::error::ConfigError;
use crate::models::ColumnRoles;

#[derive(Copy, Clone, Eq, PartialEq, ValueEnum, Debug)]
pub enum PolicyOpt {
    ExactOnly,
    Threshold,
}

impl PolicyOpt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactOnly => "exact-only",
            Self::Threshold => "threshold",
        }
    }
}
impl std::fmt::Display for PolicyOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, ValueEnum, Debug)]
pub enum SimilarityOpt {
    Levenshtein,
    JaroWinkler,
    TokenSort,
}

impl From<SimilarityOpt> for SimilarityAlgorithm {
    fn from(o: SimilarityOpt) -> Self {
        match o {
            SimilarityOpt::Levenshtein => SimilarityAlgorithm::Levenshtein,
            SimilarityOpt::JaroWinkler => SimilarityAlgorithm::JaroWinkler,
            SimilarityOpt::TokenSort => SimilarityAlgorithm::TokenSort,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, ValueEnum, Debug)]
pub enum ModeOpt {
    Exact,
    Fuzzy,
}

impl From<ModeOpt> for CompareMode {
    fn from(o: ModeOpt) -> Self {
        match o {
            ModeOpt::Exact => CompareMode::Exact,
            ModeOpt::Fuzzy => CompareMode::Fuzzy,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d_%m_%Y"))
        .map_err(|_| format!("'{}' is not a date (YYYY-MM-DD or DD_MM_YYYY)", s))
}

#[derive(Parser, Debug)]
#[command(
    name = "linelist_dedup",
    version,
    about = "Split a daily patient linelist into duplicates of the yearly store and new records",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Yearly store CSV
    #[arg(value_name = "YEARLY_CSV")]
    pub yearly: PathBuf,
    /// Daily batch CSV
    #[arg(value_name = "DAILY_CSV")]
    pub daily: PathBuf,
    /// Name column (env: DEDUP_NAME_COL)
    #[arg(long = "name-col", value_name = "COLUMN", env = "DEDUP_NAME_COL")]
    pub name_col: Option<String>,
    /// Mobile column, also the blocking key (env: DEDUP_MOBILE_COL)
    #[arg(long = "mobile-col", value_name = "COLUMN", env = "DEDUP_MOBILE_COL")]
    pub mobile_col: Option<String>,
    /// Address column (env: DEDUP_ADDRESS_COL)
    #[arg(long = "address-col", value_name = "COLUMN", env = "DEDUP_ADDRESS_COL")]
    pub address_col: Option<String>,
    /// Extra comparison column (env: DEDUP_EXTRA_COL)
    #[arg(long = "extra-col", value_name = "COLUMN", env = "DEDUP_EXTRA_COL")]
    pub extra_col: Option<String>,
    /// Classification policy (env: DEDUP_POLICY)
    #[arg(long, value_enum, env = "DEDUP_POLICY")]
    pub policy: Option<PolicyOpt>,
    /// Duplicate threshold for the threshold policy, 0-100 (env: DEDUP_THRESHOLD)
    #[arg(long, value_name = "SCORE", env = "DEDUP_THRESHOLD")]
    pub threshold: Option<f64>,
    /// Trailing mobile digits used as the block key
    #[arg(long = "block-len", value_name = "N")]
    pub block_len: Option<usize>,
    /// Mobiles with fewer digits are treated as unusable
    #[arg(long = "min-digits", value_name = "N")]
    pub min_digits: Option<usize>,
    /// Field weights as name,mobile,address,extra
    #[arg(long, value_name = "N,M,A,E")]
    pub weights: Option<String>,
    /// Fuzzy similarity algorithm
    #[arg(long, value_enum)]
    pub similarity: Option<SimilarityOpt>,
    /// Comparator for the extra column
    #[arg(long = "extra-mode", value_enum)]
    pub extra_mode: Option<ModeOpt>,
    /// Strip diacritics before comparing text
    #[arg(long = "fold-diacritics")]
    pub fold_diacritics: bool,
    /// Match on the current thread only (env: DEDUP_SEQUENTIAL)
    #[arg(long, env = "DEDUP_SEQUENTIAL")]
    pub sequential: bool,
    /// Daily records per progress report
    #[arg(long = "progress-every", value_name = "N")]
    pub progress_every: Option<usize>,
    /// JSON match config; flags override its values (env: DEDUP_CONFIG)
    #[arg(long, value_name = "PATH", env = "DEDUP_CONFIG")]
    pub config: Option<PathBuf>,
    /// Output directory (env: DEDUP_OUT_DIR)
    #[arg(long = "out-dir", value_name = "DIR", env = "DEDUP_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,
    /// Run date used in output file names (default: today)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// Print the column headers of both files and exit
    #[arg(long = "list-columns")]
    pub list_columns: bool,
}

pub fn parse_weights(s: &str) -> Result<FieldWeights, ConfigError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: "weights",
        reason,
    };
    if parts.len() != 4 {
        return Err(invalid(format!(
            "expected 4 comma-separated values, got {}",
            parts.len()
        )));
    }
    let mut w = [0.0f64; 4];
    for (slot, p) in w.iter_mut().zip(&parts) {
        *slot = p
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a number", p)))?;
    }
    Ok(FieldWeights {
        name: w[0],
        mobile: w[1],
        address: w[2],
        extra: w[3],
    })
}

impl Cli {
    pub fn column_roles(&self) -> Result<ColumnRoles, ConfigError> {
        let need = |v: &Option<String>, field: &'static str| {
            v.clone().ok_or(ConfigError::MissingField { field })
        };
        Ok(ColumnRoles::new(
            need(&self.name_col, "name-col")?,
            need(&self.mobile_col, "mobile-col")?,
            need(&self.address_col, "address-col")?,
            need(&self.extra_col, "extra-col")?,
        ))
    }

    /// Overlay command-line values on `base`. `--threshold` alone selects the
    /// threshold policy.
    pub fn apply_to(&self, base: MatchConfig) -> Result<MatchConfig, ConfigError> {
        let mut cfg = base;
        let base_threshold = match cfg.policy {
            ClassificationPolicy::Threshold { threshold } => threshold,
            ClassificationPolicy::ExactOnly => DEFAULT_THRESHOLD,
        };
        cfg.policy = match (self.policy, self.threshold) {
            (Some(PolicyOpt::ExactOnly), Some(_)) => {
                return Err(ConfigError::InvalidValue {
                    field: "threshold",
                    reason: "not used by the exact-only policy".into(),
                });
            }
            (Some(PolicyOpt::ExactOnly), None) => ClassificationPolicy::ExactOnly,
            (Some(PolicyOpt::Threshold), t) => {
                ClassificationPolicy::threshold(t.unwrap_or(base_threshold))
            }
            (None, Some(t)) => ClassificationPolicy::threshold(t),
            (None, None) => cfg.policy,
        };
        if let Some(n) = self.block_len {
            cfg.block_key_len = n;
        }
        if let Some(n) = self.min_digits {
            cfg.min_mobile_digits = n;
        }
        if let Some(w) = &self.weights {
            cfg.weights = parse_weights(w)?;
        }
        if let Some(s) = self.similarity {
            cfg.similarity = s.into();
        }
        if let Some(m) = self.extra_mode {
            cfg.extra_mode = m.into();
        }
        if self.fold_diacritics {
            cfg.fold_diacritics = true;
        }
        if self.sequential {
            cfg.parallel = false;
        }
        if let Some(n) = self.progress_every {
            cfg.progress_every = n;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Config file (if any) overlaid with flags.
    pub fn match_config(&self) -> anyhow::Result<MatchConfig> {
        let base = match &self.config {
            Some(path) => load_config_file(path)?,
            None => MatchConfig::default(),
        };
        Ok(self.apply_to(base)?)
    }

    pub fn run_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn load_config_file(path: &Path) -> anyhow::Result<MatchConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    MatchConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut argv = vec!["linelist_dedup", "yearly.csv", "daily.csv"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_leave_config_untouched() {
        let cli = parse(&[]);
        assert_eq!(cli.yearly, PathBuf::from("yearly.csv"));
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert!(!cli.list_columns);
        let cfg = cli.apply_to(MatchConfig::default()).unwrap();
        assert_eq!(cfg, MatchConfig::default());
    }

    #[test]
    fn threshold_flag_selects_threshold_policy() {
        let cfg = parse(&["--threshold", "75"])
            .apply_to(MatchConfig::default())
            .unwrap();
        assert_eq!(cfg.policy, ClassificationPolicy::threshold(75.0));

        let cfg = parse(&["--policy", "threshold"])
            .apply_to(MatchConfig::default())
            .unwrap();
        assert_eq!(cfg.policy, ClassificationPolicy::threshold(DEFAULT_THRESHOLD));
    }

    #[test]
    fn exact_only_rejects_threshold() {
        let err = parse(&["--policy", "exact-only", "--threshold", "80"])
            .apply_to(MatchConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "threshold", .. }));
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let err = parse(&["--threshold", "120"])
            .apply_to(MatchConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "threshold", .. }));
    }

    #[test]
    fn flags_override_base() {
        let base = MatchConfig {
            policy: ClassificationPolicy::threshold(90.0),
            ..Default::default()
        };
        let cfg = parse(&[
            "--policy",
            "threshold",
            "--block-len",
            "6",
            "--weights",
            "2, 1, 1, 0",
            "--similarity",
            "jaro-winkler",
            "--extra-mode",
            "exact",
            "--fold-diacritics",
            "--sequential",
        ])
        .apply_to(base)
        .unwrap();
        assert_eq!(cfg.policy, ClassificationPolicy::threshold(90.0));
        assert_eq!(cfg.block_key_len, 6);
        assert_eq!(cfg.weights.as_array(), [2.0, 1.0, 1.0, 0.0]);
        assert_eq!(cfg.similarity, SimilarityAlgorithm::JaroWinkler);
        assert_eq!(cfg.extra_mode, CompareMode::Exact);
        assert!(cfg.fold_diacritics);
        assert!(!cfg.parallel);
    }

    #[test]
    fn weights_parse_errors() {
        assert!(parse_weights("1,1,1").is_err());
        assert!(parse_weights("1,x,1,1").is_err());
        assert_eq!(parse_weights("1,0,0,0").unwrap().total(), 1.0);
    }

    #[test]
    fn column_roles_require_all_four() {
        let cli = parse(&["--name-col", "Name", "--mobile-col", "Mobile", "--address-col", "Addr"]);
        assert_eq!(
            cli.column_roles().unwrap_err(),
            ConfigError::MissingField { field: "extra-col" }
        );
        let cli = parse(&[
            "--name-col", "Name", "--mobile-col", "Mobile", "--address-col", "Addr", "--extra-col",
            "Ward",
        ]);
        let roles = cli.column_roles().unwrap();
        assert_eq!(roles.mobile, "Mobile");
    }

    #[test]
    fn date_formats() {
        let cli = parse(&["--date", "2026-03-07"]);
        assert_eq!(cli.run_date(), NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
        let cli = parse(&["--date", "07_03_2026"]);
        assert_eq!(cli.run_date(), NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
        let argv = ["linelist_dedup", "y.csv", "d.csv", "--date", "March"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn config_file_is_overlaid() {
        let path = std::env::temp_dir().join(format!("linelist_dedup_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"policy": {"kind": "threshold", "threshold": 70}, "block_key_len": 8}"#)
            .unwrap();
        let p = path.to_string_lossy().to_string();
        let cfg = parse(&["--config", &p, "--threshold", "72"]).match_config().unwrap();
        assert_eq!(cfg.policy, ClassificationPolicy::threshold(72.0));
        assert_eq!(cfg.block_key_len, 8);
        std::fs::remove_file(&path).ok();

        let err = parse(&["--config", "/nonexistent/cfg.json"]).match_config().unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/cfg.json"));
    }
}

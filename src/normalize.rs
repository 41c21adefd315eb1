use unicode_normalization::UnicodeNormalization;

use crate::config::MatchConfig;
use crate::models::FieldKind;

/// Punctuation that separates words; replaced by a space instead of being dropped.
const SEPARATORS: [char; 4] = ['-', '/', '_', ','];

/// Canonicalizes raw cell values. Never fails: anything unusable degrades to `""`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    punctuation: Vec<char>,
    fold_diacritics: bool,
    min_mobile_digits: usize,
}

impl Normalizer {
    pub fn new(punctuation: &str, fold_diacritics: bool, min_mobile_digits: usize) -> Self {
        let mut punctuation: Vec<char> = punctuation.chars().collect();
        punctuation.sort_unstable();
        punctuation.dedup();
        Self {
            punctuation,
            fold_diacritics,
            min_mobile_digits,
        }
    }

    pub fn from_config(cfg: &MatchConfig) -> Self {
        Self::new(&cfg.punctuation, cfg.fold_diacritics, cfg.min_mobile_digits)
    }

    pub fn normalize(&self, raw: Option<&str>, kind: FieldKind) -> String {
        let Some(raw) = raw else {
            return String::new();
        };
        match kind {
            FieldKind::Text => self.normalize_text(raw),
            FieldKind::Mobile => normalize_mobile(raw, self.min_mobile_digits),
        }
    }

    /// Trim, collapse whitespace runs, lowercase, strip the configured punctuation.
    pub fn normalize_text(&self, input: &str) -> String {
        let composed: String = if self.fold_diacritics {
            input
                .nfd()
                .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
                .collect()
        } else {
            input.nfc().collect()
        };

        let mut out = String::with_capacity(composed.len());
        let mut pending_space = false;
        for ch in composed.chars() {
            let ch = if self.punctuation.binary_search(&ch).is_ok() {
                if SEPARATORS.contains(&ch) {
                    ' '
                } else {
                    continue;
                }
            } else {
                ch
            };
            if ch.is_whitespace() {
                pending_space = !out.is_empty();
                continue;
            }
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            for lc in ch.to_lowercase() {
                out.push(lc);
            }
        }
        out
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&MatchConfig::default())
    }
}

/// Keep only ASCII digits. Fewer than `min_digits` digits means the number is unusable
/// and normalizes to `""`.
///
/// Spreadsheet exports often render numeric cells as floats (`9876543210.0`); a purely
/// zero fraction is dropped before digit extraction so it does not add a trailing digit.
pub fn normalize_mobile(raw: &str, min_digits: usize) -> String {
    let s = strip_zero_fraction(raw.trim());
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < min_digits {
        return String::new();
    }
    digits
}

fn strip_zero_fraction(s: &str) -> &str {
    match s.rsplit_once('.') {
        Some((int, frac))
            if !int.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && !frac.is_empty()
                && frac.bytes().all(|b| b == b'0') =>
        {
            int
        }
        _ => s,
    }
}

/// A cell counts as genuinely absent when it is missing or holds only whitespace.
#[inline]
pub fn is_absent(raw: Option<&str>) -> bool {
    raw.is_none_or(|s| s.trim().is_empty())
}

//! Shared string similarity helpers. All scores are percentages (0.0-100.0).

use strsim::{jaro_winkler, levenshtein};

/// Levenshtein similarity as a percentage, measured in chars rather than bytes.
pub(crate) fn sim_levenshtein_pct(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let dist = levenshtein(a, b);
    (1.0 - (dist as f64 / max_len as f64)) * 100.0
}

pub(crate) fn sim_jaro_winkler_pct(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 100.0
}

/// Levenshtein similarity after sorting whitespace-separated tokens, so that
/// "doe jane" and "jane doe" compare equal.
pub(crate) fn sim_token_sort_pct(a: &str, b: &str) -> f64 {
    sim_levenshtein_pct(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut toks: Vec<&str> = s.split_whitespace().collect();
    toks.sort_unstable();
    toks.join(" ")
}

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Parse `KEY=value` lines. Blank lines and `#` comments are skipped, and one pair of
/// surrounding quotes is removed from values.
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((key, val)) = s.split_once('=') else {
            log::warn!("ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let val = val.trim();
        let val = ['"', '\'']
            .iter()
            .find_map(|&q| {
                val.strip_prefix(q)
                    .and_then(|v| v.strip_suffix(q))
            })
            .unwrap_or(val);
        map.insert(key.trim().to_string(), val.to_string());
    }
    map
}

/// Parse an env file; a missing file yields an empty map.
pub fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_env_str(&content))
}

/// Load `.env` from the working directory into the process environment. Variables
/// already set are left alone.
pub fn load_dotenv_if_present() -> Result<()> {
    let map = parse_env_file(Path::new(".env"))?;
    let mut applied = 0usize;
    for (k, v) in map {
        if std::env::var_os(&k).is_none() {
            // Called from main before any worker threads exist.
            unsafe {
                std::env::set_var(&k, &v);
            }
            applied += 1;
        }
    }
    if applied > 0 {
        log::debug!("loaded {} variables from .env", applied);
    }
    Ok(())
}

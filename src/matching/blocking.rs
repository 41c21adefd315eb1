//! Blocking on a mobile-number suffix.
//!
//! Only yearly records sharing a daily record's block key are ever scored against it.
//! Using the last N digits rather than the full number tolerates country-code and
//! leading-digit differences between the two sources.

use std::collections::HashMap;

use crate::error::InputError;
use crate::models::{FieldKind, Table};
use crate::normalize::Normalizer;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKey {
    /// Last N digits of a usable mobile number.
    Digits(String),
    /// Shared by every record whose mobile is missing, unusable, or shorter than N.
    Unusable,
}

impl std::fmt::Display for BlockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKey::Digits(d) => f.write_str(d),
            BlockKey::Unusable => f.write_str("<unusable>"),
        }
    }
}

/// Derive the block key from an already-normalized mobile digit string.
pub fn block_key(normalized_mobile: &str, key_len: usize) -> BlockKey {
    if key_len == 0 || normalized_mobile.chars().count() < key_len {
        return BlockKey::Unusable;
    }
    let start = normalized_mobile
        .char_indices()
        .rev()
        .nth(key_len - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    BlockKey::Digits(normalized_mobile[start..].to_string())
}

/// Yearly row positions grouped by block key. Insertion order is kept inside
/// every bucket. Read-only once built.
#[derive(Debug, Clone)]
pub struct BlockingIndex {
    buckets: HashMap<BlockKey, Vec<usize>>,
    key_len: usize,
    rows: usize,
}

impl BlockingIndex {
    /// Build from normalized mobile values given in table order.
    pub fn from_mobiles<'a, I>(mobiles: I, key_len: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut buckets: HashMap<BlockKey, Vec<usize>> = HashMap::new();
        let mut rows = 0usize;
        for (pos, m) in mobiles.into_iter().enumerate() {
            buckets.entry(block_key(m, key_len)).or_default().push(pos);
            rows += 1;
        }
        Self {
            buckets,
            key_len,
            rows,
        }
    }

    /// Candidates for `key`; empty when no yearly record carries it.
    pub fn get(&self, key: &BlockKey) -> &[usize] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// Number of indexed yearly rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn largest_bucket(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn unusable_count(&self) -> usize {
        self.get(&BlockKey::Unusable).len()
    }
}

/// Single pass over `table`: normalize each row's mobile, derive its key, append the
/// row position to that key's bucket.
pub fn build_index(
    table: &Table,
    mobile_column: &str,
    normalizer: &Normalizer,
    key_len: usize,
) -> Result<BlockingIndex, InputError> {
    let col = table
        .column_index(mobile_column)
        .ok_or_else(|| InputError::MissingColumn {
            table: "yearly",
            role: "mobile",
            column: mobile_column.to_string(),
        })?;
    let mobiles: Vec<String> = table
        .rows
        .iter()
        .map(|r| normalizer.normalize(r.get(col), FieldKind::Mobile))
        .collect();
    Ok(BlockingIndex::from_mobiles(
        mobiles.iter().map(String::as_str),
        key_len,
    ))
}
